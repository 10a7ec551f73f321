use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    middleware::auth::Claims,
    models::{CreateProblemRequest, CreateSheetRequest, ProblemView, SheetDetail, SheetView, UpdateSheetRequest},
    services::{
        problem_service::{self, ToggleResponse},
        sheet_service::{self, SheetListResponse},
    },
    utils::{parse_object_id, AppError, PageQuery, PageRequest},
};

fn message(text: &str) -> serde_json::Value {
    serde_json::json!({ "message": text })
}

// ==================== SHEETS ====================

#[utoipa::path(
    post,
    path = "/api/sheets",
    tag = "Sheets",
    request_body = CreateSheetRequest,
    responses(
        (status = 201, description = "Sheet created", body = SheetView),
        (status = 400, description = "Title missing")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_sheet(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    body: web::Json<CreateSheetRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📄 POST /sheets - user: {}, title: {}", user.sub, body.title);

    let sheet = sheet_service::create_sheet(&db, &user.user_id()?, &body).await?;
    Ok(HttpResponse::Created().json(sheet))
}

#[utoipa::path(
    get,
    path = "/api/sheets",
    tag = "Sheets",
    params(
        ("page" = Option<u64>, Query, description = "1-based page, default 1"),
        ("limit" = Option<u64>, Query, description = "Page size, default 10, max 100")
    ),
    responses(
        (status = 200, description = "Visible sheets with the caller's progress", body = SheetListResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_sheets(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let page = PageRequest::from(&*query);
    log::info!("📚 GET /sheets - user: {}, page: {}, limit: {}", user.sub, page.page, page.limit);

    let response = sheet_service::list_sheets(&db, &user.user_id()?, page).await?;
    log::debug!("Found {} sheets", response.data.len());
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/api/sheets/{id}",
    tag = "Sheets",
    params(("id" = String, Path, description = "Sheet ObjectId")),
    responses(
        (status = 200, description = "Sheet grouped by section", body = SheetDetail),
        (status = 404, description = "Sheet not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_sheet(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    log::info!("📖 GET /sheets/{} - user: {}", path, user.sub);

    let sheet_id = parse_object_id(&path, "sheet")?;
    let detail = sheet_service::get_sheet(&db, &user.user_id()?, &sheet_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

#[utoipa::path(
    put,
    path = "/api/sheets/{id}",
    tag = "Sheets",
    params(("id" = String, Path, description = "Sheet ObjectId")),
    request_body = UpdateSheetRequest,
    responses(
        (status = 200, description = "Updated sheet", body = SheetView),
        (status = 404, description = "Sheet not found or unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_sheet(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    body: web::Json<UpdateSheetRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("✏️  PUT /sheets/{} - user: {}", path, user.sub);

    let sheet_id = parse_object_id(&path, "sheet")?;
    let sheet = sheet_service::update_sheet(&db, &user.user_id()?, &sheet_id, &body).await?;
    Ok(HttpResponse::Ok().json(sheet))
}

#[utoipa::path(
    delete,
    path = "/api/sheets/{id}",
    tag = "Sheets",
    params(("id" = String, Path, description = "Sheet ObjectId")),
    responses(
        (status = 200, description = "Sheet and its problems deleted"),
        (status = 404, description = "Sheet not found or unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_sheet(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    log::info!("🗑️  DELETE /sheets/{} - user: {}", path, user.sub);

    let sheet_id = parse_object_id(&path, "sheet")?;
    sheet_service::delete_sheet(&db, &user.user_id()?, &sheet_id).await?;
    Ok(HttpResponse::Ok().json(message("Sheet deleted successfully")))
}

// ==================== PROBLEMS ====================

#[utoipa::path(
    post,
    path = "/api/sheets/{sheet_id}/problems",
    tag = "Problems",
    params(("sheet_id" = String, Path, description = "Sheet ObjectId")),
    request_body = CreateProblemRequest,
    responses(
        (status = 201, description = "Problem added", body = ProblemView),
        (status = 404, description = "Sheet not found or unauthorized")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_problem(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    body: web::Json<CreateProblemRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("➕ POST /sheets/{}/problems - user: {}, title: {}", path, user.sub, body.title);

    let sheet_id = parse_object_id(&path, "sheet")?;
    let problem = problem_service::add_problem(&db, &user.user_id()?, &sheet_id, &body).await?;
    Ok(HttpResponse::Created().json(problem))
}

#[utoipa::path(
    delete,
    path = "/api/sheets/problems/{id}",
    tag = "Problems",
    params(("id" = String, Path, description = "Problem ObjectId")),
    responses(
        (status = 200, description = "Problem deleted"),
        (status = 403, description = "Caller does not own the sheet"),
        (status = 404, description = "Problem not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_problem(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    log::info!("🗑️  DELETE /sheets/problems/{} - user: {}", path, user.sub);

    let problem_id = parse_object_id(&path, "problem")?;
    problem_service::delete_problem(&db, &user.user_id()?, &problem_id).await?;
    Ok(HttpResponse::Ok().json(message("Problem deleted successfully")))
}

#[utoipa::path(
    put,
    path = "/api/sheets/problems/{problem_id}/toggle",
    tag = "Problems",
    params(("problem_id" = String, Path, description = "Problem ObjectId")),
    responses(
        (status = 200, description = "New completion state", body = ToggleResponse),
        (status = 404, description = "Problem not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_problem(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let problem_id = parse_object_id(&path, "problem")?;
    let is_completed = problem_service::toggle_problem(&db, &user.user_id()?, &problem_id).await?;
    log::info!("✔️  PUT /sheets/problems/{}/toggle - user: {}, completed: {}", path, user.sub, is_completed);

    Ok(HttpResponse::Ok().json(ToggleResponse {
        message: "Status updated".to_string(),
        is_completed,
    }))
}
