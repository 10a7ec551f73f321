use crate::{
    database::{MongoDB, PROBLEMS, SHEETS},
    models::{
        CreateSheetRequest, Problem, ProblemRef, ProblemView, SectionView, Sheet, SheetDetail,
        SheetSummary, SheetView, UpdateSheetRequest, User,
    },
    services::{auth_service, problem_service},
    utils::{AppError, PageRequest, Pagination},
};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const UNCATEGORIZED: &str = "Uncategorized";
const NOT_OWNED: &str = "Sheet not found or unauthorized";

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SheetListResponse {
    pub data: Vec<SheetSummary>,
    pub pagination: Pagination,
}

/// Rounded completion percentage; an empty sheet is 0%.
pub fn progress_percent(completed: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

pub fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Section names trimmed, blanks and repeats dropped, order kept.
pub fn clean_sections(sections: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    sections
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && seen.insert(s.to_string()))
        .map(String::from)
        .collect()
}

/// Groups problems under the sheet's declared sections (in declared order),
/// then any sections only problems mention, in first-seen order.
pub fn group_into_sections(
    declared: &[String],
    problems: Vec<Problem>,
    completed: &HashSet<ObjectId>,
) -> Vec<SectionView> {
    let mut sections: Vec<SectionView> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let mut slot = |name: &str, sections: &mut Vec<SectionView>| -> usize {
        *index.entry(name.to_string()).or_insert_with(|| {
            sections.push(SectionView {
                name: name.to_string(),
                total: 0,
                completed: 0,
                problems: Vec::new(),
            });
            sections.len() - 1
        })
    };

    for name in declared {
        slot(name, &mut sections);
    }

    for problem in problems {
        let is_completed = problem.id.map(|id| completed.contains(&id)).unwrap_or(false);
        let name = if problem.section.trim().is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            problem.section.clone()
        };

        let i = slot(&name, &mut sections);
        let section = &mut sections[i];
        section.total += 1;
        if is_completed {
            section.completed += 1;
        }

        let mut view = ProblemView::from(problem);
        view.is_completed = Some(is_completed);
        section.problems.push(view);
    }

    sections
}

/// Per-sheet (total, completed) counts.
pub fn count_progress(
    problems: &[ProblemRef],
    completed: &HashSet<ObjectId>,
) -> HashMap<ObjectId, (u64, u64)> {
    let mut counts: HashMap<ObjectId, (u64, u64)> = HashMap::new();
    for p in problems {
        let entry = counts.entry(p.sheet).or_default();
        entry.0 += 1;
        if completed.contains(&p.id) {
            entry.1 += 1;
        }
    }
    counts
}

fn visible_filter(user_id: &ObjectId) -> Document {
    doc! { "$or": [ { "isPublic": true }, { "createdBy": user_id } ] }
}

fn completed_set(user: &User) -> HashSet<ObjectId> {
    user.completed_problems.iter().copied().collect()
}

pub async fn create_sheet(
    db: &MongoDB,
    owner: &ObjectId,
    request: &CreateSheetRequest,
) -> Result<SheetView, AppError> {
    let mut sheet = Sheet {
        id: None,
        title: required(&request.title, "Title")?,
        description: request.description.clone(),
        created_by: *owner,
        is_public: request.is_public.unwrap_or(true),
        sections: clean_sections(request.sections.as_deref().unwrap_or_default()),
        created_at: BsonDateTime::now(),
    };

    let result = db.collection::<Sheet>(SHEETS).insert_one(&sheet).await?;
    sheet.id = result.inserted_id.as_object_id();

    Ok(SheetView::from(sheet))
}

pub async fn list_sheets(
    db: &MongoDB,
    user_id: &ObjectId,
    page: PageRequest,
) -> Result<SheetListResponse, AppError> {
    let sheets_collection = db.collection::<Sheet>(SHEETS);
    let filter = visible_filter(user_id);

    let total_items = sheets_collection.count_documents(filter.clone()).await?;
    let sheets: Vec<Sheet> = sheets_collection
        .find(filter)
        .sort(doc! { "createdAt": 1, "_id": 1 })
        .skip(page.skip())
        .limit(page.limit as i64)
        .await?
        .try_collect()
        .await?;

    let user = auth_service::get_user(db, user_id).await?;
    let completed = completed_set(&user);

    let sheet_ids: Vec<ObjectId> = sheets.iter().filter_map(|s| s.id).collect();
    let problems: Vec<ProblemRef> = db
        .collection::<ProblemRef>(PROBLEMS)
        .find(doc! { "sheet": { "$in": &sheet_ids } })
        .projection(doc! { "_id": 1, "sheet": 1, "difficulty": 1 })
        .await?
        .try_collect()
        .await?;
    let counts = count_progress(&problems, &completed);

    let data = sheets
        .into_iter()
        .map(|sheet| {
            let (total, done) = sheet
                .id
                .and_then(|id| counts.get(&id).copied())
                .unwrap_or_default();
            SheetSummary {
                sheet: SheetView::from(sheet),
                questions: total,
                progress: progress_percent(done, total),
                followers: 0,
            }
        })
        .collect();

    Ok(SheetListResponse {
        data,
        pagination: Pagination::new(page, total_items),
    })
}

pub async fn get_sheet(
    db: &MongoDB,
    user_id: &ObjectId,
    sheet_id: &ObjectId,
) -> Result<SheetDetail, AppError> {
    let sheet = db
        .collection::<Sheet>(SHEETS)
        .find_one(doc! { "_id": sheet_id })
        .await?
        .filter(|s| s.is_visible_to(user_id))
        .ok_or_else(|| AppError::not_found("Sheet not found"))?;

    let problems: Vec<Problem> = db
        .collection::<Problem>(PROBLEMS)
        .find(doc! { "sheet": sheet_id })
        .sort(doc! { "createdAt": 1, "_id": 1 })
        .await?
        .try_collect()
        .await?;

    let user = auth_service::get_user(db, user_id).await?;
    let sections = group_into_sections(&sheet.sections, problems, &completed_set(&user));

    Ok(SheetDetail::new(SheetView::from(sheet), sections))
}

fn sheet_update(request: &UpdateSheetRequest) -> Result<Document, AppError> {
    let mut set = Document::new();
    if let Some(title) = &request.title {
        set.insert("title", required(title, "Title")?);
    }
    if let Some(description) = &request.description {
        set.insert("description", description.clone());
    }
    if let Some(is_public) = request.is_public {
        set.insert("isPublic", is_public);
    }
    if set.is_empty() {
        return Err(AppError::bad_request("Nothing to update"));
    }
    Ok(doc! { "$set": set })
}

pub async fn update_sheet(
    db: &MongoDB,
    user_id: &ObjectId,
    sheet_id: &ObjectId,
    request: &UpdateSheetRequest,
) -> Result<SheetView, AppError> {
    let update = sheet_update(request)?;

    db.collection::<Sheet>(SHEETS)
        .find_one_and_update(doc! { "_id": sheet_id, "createdBy": user_id }, update)
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .map(SheetView::from)
        .ok_or_else(|| AppError::not_found(NOT_OWNED))
}

/// Deletes an owned sheet, its problems, and every user's completion of them.
pub async fn delete_sheet(db: &MongoDB, user_id: &ObjectId, sheet_id: &ObjectId) -> Result<(), AppError> {
    db.collection::<Sheet>(SHEETS)
        .find_one_and_delete(doc! { "_id": sheet_id, "createdBy": user_id })
        .await?
        .ok_or_else(|| AppError::not_found(NOT_OWNED))?;

    let problem_ids: Vec<ObjectId> = db
        .collection::<ProblemRef>(PROBLEMS)
        .find(doc! { "sheet": sheet_id })
        .projection(doc! { "_id": 1, "sheet": 1 })
        .await?
        .try_collect::<Vec<ProblemRef>>()
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    let deleted = problem_service::remove_problems(db, &problem_ids).await?;

    log::info!("🗑️  Sheet {} deleted with {} problems", sheet_id, deleted);
    Ok(())
}
