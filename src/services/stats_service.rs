use crate::{
    database::{MongoDB, PROBLEMS},
    models::{to_chrono, Difficulty, ProblemRef},
    services::auth_service,
    utils::AppError,
};
use chrono::{Days, NaiveDate, Utc};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_WEEKS: u32 = 52;
pub const MAX_WEEKS: u32 = 104;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StreakStats {
    pub current_streak: u32,
    pub max_streak: u32,
    pub active_days: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct DifficultyBreakdown {
    pub easy: u64,
    pub medium: u64,
    pub hard: u64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub solved: u64,
    #[serde(flatten)]
    pub difficulty: DifficultyBreakdown,
    #[serde(flatten)]
    pub streak: StreakStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ActivityDay {
    pub date: String,
    pub count: u32,
    pub level: u8,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ActivityResponse {
    pub weeks: Vec<Vec<ActivityDay>>,
}

/// Distinct UTC days with activity, ascending.
pub fn active_days(timestamps: &[BsonDateTime]) -> BTreeSet<NaiveDate> {
    timestamps.iter().map(|t| to_chrono(*t).date_naive()).collect()
}

pub fn compute_streaks(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> StreakStats {
    let mut max_streak = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for day in days {
        run = match prev {
            Some(p) if p.succ_opt() == Some(*day) => run + 1,
            _ => 1,
        };
        max_streak = max_streak.max(run);
        prev = Some(*day);
    }

    // A streak survives until the end of the day after the last activity.
    let yesterday = today.pred_opt().unwrap_or(today);
    let current_streak = match days.iter().next_back() {
        Some(last) if *last == today || *last == yesterday => run,
        _ => 0,
    };

    StreakStats {
        current_streak,
        max_streak,
        active_days: days.len() as u32,
    }
}

pub fn activity_level(count: u32) -> u8 {
    match count {
        0 => 0,
        1 => 1,
        2..=3 => 2,
        4..=5 => 3,
        _ => 4,
    }
}

/// `weeks` columns of 7 days, oldest first, the last day being `today`.
pub fn build_heatmap(timestamps: &[BsonDateTime], today: NaiveDate, weeks: u32) -> Vec<Vec<ActivityDay>> {
    let weeks = weeks.clamp(1, MAX_WEEKS);
    let total_days = u64::from(weeks * 7);
    let start = today
        .checked_sub_days(Days::new(total_days - 1))
        .unwrap_or(today);

    let mut counts: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for t in timestamps {
        let day = to_chrono(*t).date_naive();
        if day >= start && day <= today {
            *counts.entry(day).or_default() += 1;
        }
    }

    let days: Vec<ActivityDay> = start
        .iter_days()
        .take(total_days as usize)
        .map(|date| {
            let count = counts.get(&date).copied().unwrap_or(0);
            ActivityDay {
                date: date.format("%Y-%m-%d").to_string(),
                count,
                level: activity_level(count),
            }
        })
        .collect();

    days.chunks(7).map(|week| week.to_vec()).collect()
}

pub fn breakdown<'a>(difficulties: impl IntoIterator<Item = &'a Difficulty>) -> DifficultyBreakdown {
    let mut out = DifficultyBreakdown::default();
    for d in difficulties {
        match d {
            Difficulty::Easy => out.easy += 1,
            Difficulty::Medium => out.medium += 1,
            Difficulty::Hard => out.hard += 1,
        }
    }
    out
}

pub async fn summary(db: &MongoDB, user_id: &ObjectId) -> Result<SummaryResponse, AppError> {
    let user = auth_service::get_user(db, user_id).await?;

    // Completions of deleted problems are pulled on delete, but count only
    // what still resolves.
    let solved: Vec<ProblemRef> = db
        .collection::<ProblemRef>(PROBLEMS)
        .find(doc! { "_id": { "$in": &user.completed_problems } })
        .projection(doc! { "_id": 1, "sheet": 1, "difficulty": 1 })
        .await?
        .try_collect()
        .await?;

    let today = Utc::now().date_naive();
    Ok(SummaryResponse {
        solved: solved.len() as u64,
        difficulty: breakdown(solved.iter().map(|p| &p.difficulty)),
        streak: compute_streaks(&active_days(&user.activity_log), today),
    })
}

pub async fn activity(db: &MongoDB, user_id: &ObjectId, weeks: u32) -> Result<ActivityResponse, AppError> {
    let user = auth_service::get_user(db, user_id).await?;
    Ok(ActivityResponse {
        weeks: build_heatmap(&user.activity_log, Utc::now().date_naive(), weeks),
    })
}
