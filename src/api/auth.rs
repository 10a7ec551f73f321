use actix_web::{web, HttpResponse};

use crate::{
    config::AppConfig,
    database::MongoDB,
    middleware::auth::Claims,
    services::auth_service::{self, LoginRequest, ProfileResponse, RegisterRequest, UpdateProfileRequest},
    utils::AppError,
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Missing fields or user already exists")
    )
)]
pub async fn register(
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /auth/register - email: {}", email);

    match auth_service::register(&db, &config, &request).await {
        Ok(()) => {
            log::info!("✅ Registration successful: {}", email);
            Ok(HttpResponse::Created().json(serde_json::json!({
                "message": "User registered successfully!"
            })))
        }
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", email, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = auth_service::LoginResponse),
        (status = 400, description = "Invalid email or password")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    config: web::Data<AppConfig>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    match auth_service::login(&db, &config, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn profile(user: web::ReqData<Claims>, db: web::Data<MongoDB>) -> Result<HttpResponse, AppError> {
    log::info!("👤 GET /auth/profile - user: {}", user.sub);

    let profile = auth_service::get_profile(&db, &user.user_id()?).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse {
        message: "Welcome to your profile!".to_string(),
        user: profile,
    }))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    tag = "Auth",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Platform handles updated", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("✏️  PUT /auth/profile - user: {}", user.sub);

    let profile = auth_service::update_profile(&db, &user.user_id()?, &request).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse {
        message: "Profile updated successfully!".to_string(),
        user: profile,
    }))
}
