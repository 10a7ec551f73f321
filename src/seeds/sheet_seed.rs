use crate::{
    config::SeedConfig,
    database::{MongoDB, PROBLEMS, SHEETS, USERS},
    models::{Difficulty, Problem, Sheet, User},
    services::{auth_service::normalize_email, problem_service},
    utils::AppError,
};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// One row of a sheet export, e.g. `neetcode_250.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedProblem {
    pub title: String,
    pub link: String,
    pub category: String,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug)]
pub struct SeedSection {
    pub name: String,
    pub problems: Vec<SeedProblem>,
}

/// Groups rows by category, keeping first-seen category order.
pub fn group_by_category(rows: Vec<SeedProblem>) -> Vec<SeedSection> {
    let mut sections: Vec<SeedSection> = Vec::new();
    for row in rows {
        let name = row.category.trim().to_string();
        match sections.iter_mut().find(|s| s.name == name) {
            Some(section) => section.problems.push(row),
            None => sections.push(SeedSection { name, problems: vec![row] }),
        }
    }
    sections
}

pub fn build_problems(sheet_id: ObjectId, sections: &[SeedSection]) -> Vec<Problem> {
    let now = BsonDateTime::now();
    sections
        .iter()
        .flat_map(|section| {
            section.problems.iter().map(move |p| Problem {
                id: None,
                title: p.title.clone(),
                link: p.link.clone(),
                difficulty: p.difficulty.unwrap_or_default(),
                tags: vec![section.name.clone()],
                sheet: sheet_id,
                section: section.name.clone(),
                created_at: now,
            })
        })
        .collect()
}

/// How a re-seed changes a sheet's existing problems. Rows are matched by
/// link so ids, and with them users' completions, survive.
#[derive(Debug, Default)]
pub struct ReseedPlan {
    pub updates: Vec<(ObjectId, Problem)>,
    pub inserts: Vec<Problem>,
    pub stale: Vec<ObjectId>,
}

pub fn plan_reseed(existing: &[Problem], fresh: Vec<Problem>) -> ReseedPlan {
    let mut by_link: HashMap<&str, ObjectId> = existing
        .iter()
        .filter_map(|p| p.id.map(|id| (p.link.as_str(), id)))
        .collect();

    let mut plan = ReseedPlan::default();
    let mut kept: HashSet<ObjectId> = HashSet::new();
    for problem in fresh {
        match by_link.remove(problem.link.as_str()) {
            Some(id) => {
                kept.insert(id);
                plan.updates.push((id, problem));
            }
            None => plan.inserts.push(problem),
        }
    }

    plan.stale = existing
        .iter()
        .filter_map(|p| p.id)
        .filter(|id| !kept.contains(id))
        .collect();
    plan
}

async fn find_owner(db: &MongoDB, email: Option<&str>) -> Result<Option<User>, AppError> {
    let users = db.collection::<User>(USERS);
    let filter = match email {
        Some(email) => doc! { "email": normalize_email(email) },
        None => doc! {},
    };
    Ok(users.find_one(filter).await?)
}

async fn seed(db: &MongoDB, config: &SeedConfig) -> Result<(), AppError> {
    let raw = tokio::fs::read_to_string(&config.path)
        .await
        .map_err(|e| AppError::Config(format!("cannot read {}: {}", config.path, e)))?;
    let rows: Vec<SeedProblem> = serde_json::from_str(&raw)
        .map_err(|e| AppError::Config(format!("cannot parse {}: {}", config.path, e)))?;

    let Some(owner) = find_owner(db, config.owner_email.as_deref()).await? else {
        log::warn!("⚠️  No user found to own seeded sheet '{}', skipping seed", config.title);
        return Ok(());
    };
    let owner_id = owner
        .id
        .ok_or_else(|| AppError::Internal("stored user has no _id".to_string()))?;

    let sections = group_by_category(rows);
    let section_names: Vec<String> = sections.iter().map(|s| s.name.clone()).collect();
    log::info!("📋 Seeding '{}': {} sections for {}", config.title, sections.len(), owner.email);

    let sheets = db.collection::<Sheet>(SHEETS);
    let problems = db.collection::<Problem>(PROBLEMS);

    let existing = sheets
        .find_one(doc! { "title": &config.title, "createdBy": owner_id })
        .await?;

    let (sheet_id, current) = match existing.and_then(|s| s.id) {
        Some(id) => {
            log::info!("   ♻️  Sheet already exists, syncing its problems");
            sheets
                .update_one(doc! { "_id": id }, doc! { "$set": { "sections": &section_names } })
                .await?;
            let current: Vec<Problem> = problems.find(doc! { "sheet": id }).await?.try_collect().await?;
            (id, current)
        }
        None => {
            let sheet = Sheet {
                id: None,
                title: config.title.clone(),
                description: Some(format!("The {} problem list.", config.title)),
                created_by: owner_id,
                is_public: true,
                sections: section_names,
                created_at: BsonDateTime::now(),
            };
            let id = sheets
                .insert_one(&sheet)
                .await?
                .inserted_id
                .as_object_id()
                .ok_or_else(|| AppError::Internal("inserted sheet has no ObjectId".to_string()))?;
            (id, Vec::new())
        }
    };

    let plan = plan_reseed(&current, build_problems(sheet_id, &sections));

    for (id, problem) in &plan.updates {
        problems
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "title": &problem.title,
                    "difficulty": problem.difficulty.to_string(),
                    "tags": &problem.tags,
                    "section": &problem.section,
                } },
            )
            .await?;
    }
    if !plan.inserts.is_empty() {
        problems.insert_many(&plan.inserts).await?;
    }
    let removed = problem_service::remove_problems(db, &plan.stale).await?;

    log::info!(
        "   ✅ Sheet {}: {} kept, {} added, {} removed",
        sheet_id,
        plan.updates.len(),
        plan.inserts.len(),
        removed
    );

    Ok(())
}

/// Runs the optional startup seed. Failures are logged, never fatal.
pub async fn seed_sheet_from_file(db: &MongoDB, config: &SeedConfig) {
    if let Err(e) = seed(db, config).await {
        log::error!("❌ Failed to seed sheet '{}': {}", config.title, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<SeedProblem> {
        serde_json::from_value(serde_json::json!([
            { "title": "Contains Duplicate", "link": "https://leetcode.com/problems/contains-duplicate/", "category": "Arrays & Hashing" },
            { "title": "Valid Palindrome", "link": "https://leetcode.com/problems/valid-palindrome/", "category": "Two Pointers", "difficulty": "Easy" },
            { "title": "Two Sum", "link": "https://leetcode.com/problems/two-sum/", "category": "Arrays & Hashing" }
        ]))
        .unwrap()
    }

    #[test]
    fn groups_in_first_seen_order() {
        let sections = group_by_category(rows());
        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Arrays & Hashing", "Two Pointers"]);
        assert_eq!(sections[0].problems.len(), 2);
    }

    #[test]
    fn problems_are_tagged_with_their_section() {
        let sheet = ObjectId::new();
        let problems = build_problems(sheet, &group_by_category(rows()));
        assert_eq!(problems.len(), 3);
        assert_eq!(problems[1].title, "Two Sum");
        assert_eq!(problems[1].tags, vec!["Arrays & Hashing"]);
        assert_eq!(problems[0].difficulty, Difficulty::Medium);
        assert_eq!(problems[2].difficulty, Difficulty::Easy);
        assert!(problems.iter().all(|p| p.sheet == sheet));
    }

    fn stored(sheet: ObjectId, link: &str) -> Problem {
        Problem {
            id: Some(ObjectId::new()),
            title: "old".into(),
            link: link.into(),
            difficulty: Difficulty::Hard,
            tags: vec![],
            sheet,
            section: "Old".into(),
            created_at: BsonDateTime::now(),
        }
    }

    #[test]
    fn reseed_keeps_ids_by_link_and_flags_dropped_rows() {
        let sheet = ObjectId::new();
        let kept = stored(sheet, "https://leetcode.com/problems/two-sum/");
        let dropped = stored(sheet, "https://leetcode.com/problems/removed/");
        let fresh = build_problems(sheet, &group_by_category(rows()));

        let plan = plan_reseed(&[kept.clone(), dropped.clone()], fresh);

        assert_eq!(plan.updates.len(), 1);
        let (id, problem) = &plan.updates[0];
        assert_eq!(Some(*id), kept.id);
        assert_eq!(problem.title, "Two Sum");
        assert_eq!(plan.inserts.len(), 2);
        assert_eq!(plan.stale, vec![dropped.id.unwrap()]);
    }

    #[test]
    fn first_seed_inserts_everything() {
        let plan = plan_reseed(&[], build_problems(ObjectId::new(), &group_by_category(rows())));
        assert!(plan.updates.is_empty() && plan.stale.is_empty());
        assert_eq!(plan.inserts.len(), 3);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn reseed_preserves_progress_and_pulls_removed_problems() {
        use crate::database::test_support;
        use crate::services::problem_service::toggle_problem;

        let db = test_support::connect().await;
        let (owner, email) = test_support::create_user(&db).await;
        let (solver, _) = test_support::create_user(&db).await;

        let path = std::env::temp_dir().join(format!("seed-{}.json", ObjectId::new().to_hex()));
        let config = SeedConfig {
            path: path.to_string_lossy().into_owned(),
            title: format!("Seed {}", ObjectId::new().to_hex()),
            owner_email: Some(email),
        };
        let write = |rows: serde_json::Value| {
            let path = path.clone();
            async move { tokio::fs::write(path, rows.to_string()).await.unwrap() }
        };

        write(serde_json::json!([
            { "title": "Two Sum", "link": "https://leetcode.com/problems/two-sum/", "category": "Arrays" },
            { "title": "Gone", "link": "https://leetcode.com/problems/gone/", "category": "Arrays" }
        ]))
        .await;
        seed(&db, &config).await.unwrap();

        let sheet = db
            .collection::<Sheet>(SHEETS)
            .find_one(doc! { "title": &config.title, "createdBy": owner })
            .await
            .unwrap()
            .unwrap();
        let sheet_id = sheet.id.unwrap();
        let first: Vec<Problem> = db
            .collection::<Problem>(PROBLEMS)
            .find(doc! { "sheet": sheet_id })
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        let id_of = |link: &str| first.iter().find(|p| p.link.contains(link)).unwrap().id.unwrap();
        let two_sum = id_of("two-sum");
        let gone = id_of("gone");
        toggle_problem(&db, &solver, &two_sum).await.unwrap();
        toggle_problem(&db, &solver, &gone).await.unwrap();

        write(serde_json::json!([
            { "title": "Two Sum", "link": "https://leetcode.com/problems/two-sum/", "category": "Arrays", "difficulty": "Easy" },
            { "title": "New", "link": "https://leetcode.com/problems/new/", "category": "Graphs" }
        ]))
        .await;
        seed(&db, &config).await.unwrap();

        let second: Vec<Problem> = db
            .collection::<Problem>(PROBLEMS)
            .find(doc! { "sheet": sheet_id })
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(second.len(), 2);
        let kept = second.iter().find(|p| p.id == Some(two_sum)).unwrap();
        assert_eq!(kept.difficulty, Difficulty::Easy);

        let user = db
            .collection::<User>(USERS)
            .find_one(doc! { "_id": solver })
            .await
            .unwrap()
            .unwrap();
        assert!(user.has_completed(&two_sum));
        assert!(!user.has_completed(&gone));

        tokio::fs::remove_file(&path).await.ok();
    }
}
