use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    services::{
        auth_service,
        rating_service::{self, LeetCodeStats, RatingClients, RatingHistoryResponse},
        stats_service::{self, ActivityResponse, SummaryResponse, DEFAULT_WEEKS},
    },
    utils::AppError,
};

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub weeks: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/stats/summary",
    tag = "Stats",
    responses((status = 200, description = "Solved counts and streaks", body = SummaryResponse)),
    security(("bearer_auth" = []))
)]
pub async fn summary(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("📈 GET /stats/summary - user: {}", user.sub);
    let summary = stats_service::summary(&db, &user.user_id()?).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    get,
    path = "/api/stats/activity",
    tag = "Stats",
    params(("weeks" = Option<u32>, Query, description = "Columns in the heatmap, default 52, max 104")),
    responses((status = 200, description = "Completion heatmap", body = ActivityResponse)),
    security(("bearer_auth" = []))
)]
pub async fn activity(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    query: web::Query<ActivityQuery>,
) -> Result<HttpResponse, AppError> {
    let weeks = query.weeks.unwrap_or(DEFAULT_WEEKS);
    log::info!("🗓️  GET /stats/activity - user: {}, weeks: {}", user.sub, weeks);
    let activity = stats_service::activity(&db, &user.user_id()?, weeks).await?;
    Ok(HttpResponse::Ok().json(activity))
}

#[utoipa::path(
    get,
    path = "/api/stats/ratings",
    tag = "Stats",
    responses((status = 200, description = "Merged contest rating timeline", body = RatingHistoryResponse)),
    security(("bearer_auth" = []))
)]
pub async fn ratings(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    clients: web::Data<RatingClients>,
) -> Result<HttpResponse, AppError> {
    log::info!("🏆 GET /stats/ratings - user: {}", user.sub);

    let profile = auth_service::get_user(&db, &user.user_id()?).await?;
    let data = rating_service::rating_history(
        &clients.leetcode,
        &clients.codeforces,
        profile.leetcode_username.as_deref(),
        profile.codeforces_username.as_deref(),
    )
    .await;

    Ok(HttpResponse::Ok().json(RatingHistoryResponse { data }))
}

#[utoipa::path(
    get,
    path = "/api/stats/leetcode",
    tag = "Stats",
    responses(
        (status = 200, description = "LeetCode profile totals", body = LeetCodeStats),
        (status = 400, description = "No LeetCode handle connected"),
        (status = 502, description = "LeetCode API unavailable")
    ),
    security(("bearer_auth" = []))
)]
pub async fn leetcode(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    clients: web::Data<RatingClients>,
) -> Result<HttpResponse, AppError> {
    log::info!("🧮 GET /stats/leetcode - user: {}", user.sub);

    let profile = auth_service::get_user(&db, &user.user_id()?).await?;
    let handle = profile
        .leetcode_username
        .ok_or_else(|| AppError::bad_request("No LeetCode username connected"))?;

    let stats = clients.leetcode.fetch_profile(&handle).await?;
    Ok(HttpResponse::Ok().json(stats))
}
