use crate::{
    database::{MongoDB, PROBLEMS, SHEETS, USERS},
    models::{CreateProblemRequest, Problem, ProblemView, Sheet, User},
    services::{auth_service, sheet_service::required},
    utils::AppError,
};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub message: String,
    pub is_completed: bool,
}

fn clean_tags(tags: Option<&[String]>) -> Vec<String> {
    tags.unwrap_or_default()
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

pub fn build_problem(sheet_id: ObjectId, request: &CreateProblemRequest) -> Result<Problem, AppError> {
    Ok(Problem {
        id: None,
        title: required(&request.title, "Title")?,
        link: required(&request.link, "Link")?,
        difficulty: request.difficulty.unwrap_or_default(),
        tags: clean_tags(request.tags.as_deref()),
        sheet: sheet_id,
        section: required(&request.section, "Section")?,
        created_at: BsonDateTime::now(),
    })
}

pub async fn add_problem(
    db: &MongoDB,
    user_id: &ObjectId,
    sheet_id: &ObjectId,
    request: &CreateProblemRequest,
) -> Result<ProblemView, AppError> {
    let mut problem = build_problem(*sheet_id, request)?;

    // Ownership check doubles as keeping the section list in sync.
    db.collection::<Sheet>(SHEETS)
        .find_one_and_update(
            doc! { "_id": sheet_id, "createdBy": user_id },
            doc! { "$addToSet": { "sections": &problem.section } },
        )
        .await?
        .ok_or_else(|| AppError::not_found("Sheet not found or unauthorized"))?;

    let result = db.collection::<Problem>(PROBLEMS).insert_one(&problem).await?;
    problem.id = result.inserted_id.as_object_id();

    Ok(ProblemView::from(problem))
}

pub async fn delete_problem(db: &MongoDB, user_id: &ObjectId, problem_id: &ObjectId) -> Result<(), AppError> {
    let problems = db.collection::<Problem>(PROBLEMS);

    let problem = problems
        .find_one(doc! { "_id": problem_id })
        .await?
        .ok_or_else(|| AppError::not_found("Problem not found"))?;

    let owned = db
        .collection::<Sheet>(SHEETS)
        .count_documents(doc! { "_id": problem.sheet, "createdBy": user_id })
        .await?;
    if owned == 0 {
        return Err(AppError::Forbidden("Unauthorized to delete this problem".to_string()));
    }

    remove_problems(db, &[*problem_id]).await?;
    Ok(())
}

/// Deletes the given problems and pulls them from every user's completions.
pub async fn remove_problems(db: &MongoDB, ids: &[ObjectId]) -> Result<u64, AppError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let ids = ids.to_vec();

    let deleted = db
        .collection::<Problem>(PROBLEMS)
        .delete_many(doc! { "_id": { "$in": &ids } })
        .await?;
    db.collection::<User>(USERS)
        .update_many(
            doc! { "completedProblems": { "$in": &ids } },
            doc! { "$pull": { "completedProblems": { "$in": &ids } } },
        )
        .await?;

    Ok(deleted.deleted_count)
}

/// Flips the caller's completion of a problem; returns the new state.
pub async fn toggle_problem(db: &MongoDB, user_id: &ObjectId, problem_id: &ObjectId) -> Result<bool, AppError> {
    let exists = db
        .collection::<Problem>(PROBLEMS)
        .count_documents(doc! { "_id": problem_id })
        .await?;
    if exists == 0 {
        return Err(AppError::not_found("Problem not found"));
    }

    let user = auth_service::get_user(db, user_id).await?;
    let users = db.collection::<User>(USERS);

    if user.has_completed(problem_id) {
        users
            .update_one(
                doc! { "_id": user_id },
                doc! { "$pull": { "completedProblems": problem_id } },
            )
            .await?;
        Ok(false)
    } else {
        users
            .update_one(
                doc! { "_id": user_id },
                doc! {
                    "$addToSet": { "completedProblems": problem_id },
                    "$push": { "activityLog": BsonDateTime::now() },
                },
            )
            .await?;
        Ok(true)
    }
}
