//! Contest rating history from LeetCode and Codeforces, merged into one
//! per-day timeline.
//!
//! Both upstreams are treated as opaque; only the few fields read below
//! matter. A failing upstream degrades to an empty history.

use async_trait::async_trait;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::{config::AppConfig, utils::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    LeetCode,
    Codeforces,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingEvent {
    /// Unix seconds
    pub timestamp: i64,
    pub rating: i64,
    pub platform: Platform,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct RatingPoint {
    pub date: String,
    pub leetcode: Option<i64>,
    pub codeforces: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RatingHistoryResponse {
    pub data: Vec<RatingPoint>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeetCodeStats {
    pub total_questions: u64,
    pub solved_problem: u64,
    pub total_submissions: u64,
    pub attempted_count: u64,
}

#[async_trait]
pub trait RatingSource: Send + Sync {
    fn platform(&self) -> Platform;

    async fn fetch_history(&self, handle: &str) -> Result<Vec<RatingEvent>, AppError>;
}

// ---- upstream payloads ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeetCodeContestPayload {
    #[serde(default)]
    contest_participation: Vec<LeetCodeParticipation>,
}

#[derive(Debug, Deserialize)]
struct LeetCodeParticipation {
    contest: LeetCodeContest,
    rating: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeetCodeContest {
    start_time: i64,
}

#[derive(Debug, Deserialize)]
struct CodeforcesPayload {
    #[serde(default)]
    result: Vec<CodeforcesChange>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CodeforcesChange {
    rating_update_time_seconds: i64,
    new_rating: i64,
}

// The profile API sends explicit nulls for users with no activity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeetCodeProfilePayload {
    #[serde(default)]
    total_questions: Option<u64>,
    #[serde(default)]
    total_solved: Option<u64>,
    #[serde(default)]
    total_submissions: Option<Vec<LeetCodeSubmissionCount>>,
}

#[derive(Debug, Deserialize)]
struct LeetCodeSubmissionCount {
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    submissions: Option<u64>,
}

pub fn parse_leetcode_contests(body: serde_json::Value) -> Result<Vec<RatingEvent>, AppError> {
    let payload: LeetCodeContestPayload = serde_json::from_value(body)
        .map_err(|e| AppError::Upstream(format!("unexpected LeetCode payload: {}", e)))?;
    Ok(payload
        .contest_participation
        .into_iter()
        .map(|p| RatingEvent {
            timestamp: p.contest.start_time,
            rating: p.rating.round() as i64,
            platform: Platform::LeetCode,
        })
        .collect())
}

pub fn parse_codeforces_rating(body: serde_json::Value) -> Result<Vec<RatingEvent>, AppError> {
    let payload: CodeforcesPayload = serde_json::from_value(body)
        .map_err(|e| AppError::Upstream(format!("unexpected Codeforces payload: {}", e)))?;
    Ok(payload
        .result
        .into_iter()
        .map(|c| RatingEvent {
            timestamp: c.rating_update_time_seconds,
            rating: c.new_rating,
            platform: Platform::Codeforces,
        })
        .collect())
}

pub fn parse_leetcode_profile(body: serde_json::Value) -> Result<LeetCodeStats, AppError> {
    let payload: LeetCodeProfilePayload = serde_json::from_value(body)
        .map_err(|e| AppError::Upstream(format!("unexpected LeetCode payload: {}", e)))?;
    let first = payload.total_submissions.as_deref().and_then(|s| s.first());
    Ok(LeetCodeStats {
        total_questions: payload.total_questions.unwrap_or_default(),
        solved_problem: payload.total_solved.unwrap_or_default(),
        total_submissions: first.and_then(|s| s.submissions).unwrap_or_default(),
        attempted_count: first.and_then(|s| s.count).unwrap_or_default(),
    })
}

/// Buckets events per UTC day and forward-fills each platform. A platform
/// that has not started yet (still 0) is reported as `None`.
pub fn merge_timeline(mut events: Vec<RatingEvent>) -> Vec<RatingPoint> {
    events.sort_by_key(|e| e.timestamp);

    let mut by_day: BTreeMap<String, (Option<i64>, Option<i64>)> = BTreeMap::new();
    for event in &events {
        let Some(dt) = DateTime::from_timestamp(event.timestamp, 0) else {
            continue;
        };
        let entry = by_day.entry(dt.format("%Y-%m-%d").to_string()).or_default();
        match event.platform {
            Platform::LeetCode => entry.0 = Some(event.rating),
            Platform::Codeforces => entry.1 = Some(event.rating),
        }
    }

    let mut last_lc = 0;
    let mut last_cf = 0;
    by_day
        .into_iter()
        .map(|(date, (lc, cf))| {
            if let Some(r) = lc {
                last_lc = r;
            }
            if let Some(r) = cf {
                last_cf = r;
            }
            RatingPoint {
                date,
                leetcode: (last_lc > 0).then_some(last_lc),
                codeforces: (last_cf > 0).then_some(last_cf),
            }
        })
        .collect()
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default()
}

async fn get_json(client: &reqwest::Client, url: &str) -> Result<serde_json::Value, AppError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(AppError::Upstream(format!("{} returned {}", url, response.status())));
    }
    Ok(response.json().await?)
}

pub struct LeetCodeClient {
    client: reqwest::Client,
    base_url: String,
}

impl LeetCodeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_profile(&self, handle: &str) -> Result<LeetCodeStats, AppError> {
        let url = format!("{}/userProfile/{}", self.base_url, urlencoding::encode(handle));
        parse_leetcode_profile(get_json(&self.client, &url).await?)
    }
}

#[async_trait]
impl RatingSource for LeetCodeClient {
    fn platform(&self) -> Platform {
        Platform::LeetCode
    }

    async fn fetch_history(&self, handle: &str) -> Result<Vec<RatingEvent>, AppError> {
        let url = format!("{}/{}/contest", self.base_url, urlencoding::encode(handle));
        parse_leetcode_contests(get_json(&self.client, &url).await?)
    }
}

pub struct CodeforcesClient {
    client: reqwest::Client,
    base_url: String,
}

impl CodeforcesClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RatingSource for CodeforcesClient {
    fn platform(&self) -> Platform {
        Platform::Codeforces
    }

    async fn fetch_history(&self, handle: &str) -> Result<Vec<RatingEvent>, AppError> {
        let url = format!(
            "{}/api/user.rating?handle={}",
            self.base_url,
            urlencoding::encode(handle)
        );
        parse_codeforces_rating(get_json(&self.client, &url).await?)
    }
}

async fn safe_history(source: &dyn RatingSource, handle: Option<&str>) -> Vec<RatingEvent> {
    let Some(handle) = handle else {
        return Vec::new();
    };
    match source.fetch_history(handle).await {
        Ok(events) => events,
        Err(e) => {
            log::warn!("⚠️  {:?} rating fetch for {} failed: {}", source.platform(), handle, e);
            Vec::new()
        }
    }
}

/// Fetches both histories concurrently and merges them.
pub async fn rating_history(
    leetcode: &dyn RatingSource,
    codeforces: &dyn RatingSource,
    leetcode_handle: Option<&str>,
    codeforces_handle: Option<&str>,
) -> Vec<RatingPoint> {
    let (mut lc, cf) = futures::join!(
        safe_history(leetcode, leetcode_handle),
        safe_history(codeforces, codeforces_handle)
    );
    lc.extend(cf);
    merge_timeline(lc)
}

/// Upstream clients shared across workers.
pub struct RatingClients {
    pub leetcode: LeetCodeClient,
    pub codeforces: CodeforcesClient,
}

impl RatingClients {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            leetcode: LeetCodeClient::new(&config.leetcode_api_url),
            codeforces: CodeforcesClient::new(&config.codeforces_api_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DAY: i64 = 86_400;
    // 2024-01-01T00:00:00Z
    const JAN1: i64 = 1_704_067_200;

    fn ev(ts: i64, rating: i64, platform: Platform) -> RatingEvent {
        RatingEvent { timestamp: ts, rating, platform }
    }

    struct Fixed(Platform, Result<Vec<RatingEvent>, String>);

    #[async_trait]
    impl RatingSource for Fixed {
        fn platform(&self) -> Platform {
            self.0
        }

        async fn fetch_history(&self, _handle: &str) -> Result<Vec<RatingEvent>, AppError> {
            self.1.clone().map_err(AppError::Upstream)
        }
    }

    #[test]
    fn merge_forward_fills_and_nulls_unstarted_platform() {
        let events = vec![
            ev(JAN1 + 2 * DAY, 1500, Platform::Codeforces),
            ev(JAN1, 1600, Platform::LeetCode),
            ev(JAN1 + 5 * DAY, 1650, Platform::LeetCode),
        ];
        let timeline = merge_timeline(events);

        assert_eq!(
            timeline,
            vec![
                RatingPoint { date: "2024-01-01".into(), leetcode: Some(1600), codeforces: None },
                RatingPoint { date: "2024-01-03".into(), leetcode: Some(1600), codeforces: Some(1500) },
                RatingPoint { date: "2024-01-06".into(), leetcode: Some(1650), codeforces: Some(1500) },
            ]
        );
    }

    #[test]
    fn same_day_events_keep_latest_rating() {
        let events = vec![
            ev(JAN1 + 3600, 1410, Platform::Codeforces),
            ev(JAN1 + 60, 1400, Platform::Codeforces),
        ];
        let timeline = merge_timeline(events);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].codeforces, Some(1410));
    }

    #[test]
    fn parses_upstream_payloads() {
        let lc = parse_leetcode_contests(json!({
            "contestParticipation": [
                { "contest": { "title": "Weekly 1", "startTime": JAN1 }, "rating": 1549.6 }
            ]
        }))
        .unwrap();
        assert_eq!(lc, vec![ev(JAN1, 1550, Platform::LeetCode)]);

        let cf = parse_codeforces_rating(json!({
            "status": "OK",
            "result": [ { "ratingUpdateTimeSeconds": JAN1, "newRating": 1203, "oldRating": 0 } ]
        }))
        .unwrap();
        assert_eq!(cf, vec![ev(JAN1, 1203, Platform::Codeforces)]);

        assert!(parse_codeforces_rating(json!({ "result": "nope" })).is_err());
    }

    #[test]
    fn parses_leetcode_profile_with_missing_fields() {
        let stats = parse_leetcode_profile(json!({
            "totalQuestions": 3300,
            "totalSolved": 412,
            "totalSubmissions": [ { "difficulty": "All", "count": 450, "submissions": 980 } ]
        }))
        .unwrap();
        assert_eq!(
            stats,
            LeetCodeStats { total_questions: 3300, solved_problem: 412, total_submissions: 980, attempted_count: 450 }
        );

        assert_eq!(parse_leetcode_profile(json!({})).unwrap(), LeetCodeStats::default());
    }

    #[test]
    fn leetcode_profile_nulls_count_as_zero() {
        let stats = parse_leetcode_profile(json!({
            "totalQuestions": 3300,
            "totalSolved": null,
            "totalSubmissions": null
        }))
        .unwrap();
        assert_eq!(stats, LeetCodeStats { total_questions: 3300, ..LeetCodeStats::default() });

        let stats = parse_leetcode_profile(json!({
            "totalSubmissions": [ { "count": null, "submissions": 12 } ]
        }))
        .unwrap();
        assert_eq!((stats.total_submissions, stats.attempted_count), (12, 0));
    }

    #[tokio::test]
    async fn failing_source_degrades_to_empty() {
        let lc = Fixed(Platform::LeetCode, Ok(vec![ev(JAN1, 1500, Platform::LeetCode)]));
        let cf = Fixed(Platform::Codeforces, Err("503".into()));

        let timeline = rating_history(&lc, &cf, Some("ada"), Some("ada")).await;
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].codeforces, None);
    }

    #[tokio::test]
    async fn missing_handles_skip_fetch() {
        let lc = Fixed(Platform::LeetCode, Err("should not be called".into()));
        let cf = Fixed(Platform::Codeforces, Err("should not be called".into()));
        assert!(rating_history(&lc, &cf, None, None).await.is_empty());
    }
}
