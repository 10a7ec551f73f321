use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kudos Service API",
        version = "1.0.0",
        description = "Coding-practice tracker backend.\n\n**Authentication:** everything except register, login and health requires a JWT Bearer token.\n\n**Features:**\n- Email/password accounts with LeetCode and Codeforces handles\n- Problem sheets grouped into sections\n- Per-user completion tracking\n- Streaks, activity heatmap and rating history"
    ),
    paths(
        // Auth
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::profile,
        crate::api::auth::update_profile,

        // Sheets
        crate::api::sheets::create_sheet,
        crate::api::sheets::list_sheets,
        crate::api::sheets::get_sheet,
        crate::api::sheets::update_sheet,
        crate::api::sheets::delete_sheet,

        // Problems
        crate::api::sheets::add_problem,
        crate::api::sheets::delete_problem,
        crate::api::sheets::toggle_problem,

        // Stats
        crate::api::stats::summary,
        crate::api::stats::activity,
        crate::api::stats::ratings,
        crate::api::stats::leetcode,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::UpdateProfileRequest,
            crate::services::auth_service::LoginResponse,
            crate::services::auth_service::ProfileResponse,
            crate::models::UserProfile,
            crate::models::CreateSheetRequest,
            crate::models::UpdateSheetRequest,
            crate::models::SheetView,
            crate::models::SheetSummary,
            crate::models::SheetDetail,
            crate::models::SectionView,
            crate::models::CreateProblemRequest,
            crate::models::ProblemView,
            crate::models::Difficulty,
            crate::services::sheet_service::SheetListResponse,
            crate::services::problem_service::ToggleResponse,
            crate::services::stats_service::SummaryResponse,
            crate::services::stats_service::ActivityResponse,
            crate::services::stats_service::ActivityDay,
            crate::services::rating_service::RatingHistoryResponse,
            crate::services::rating_service::RatingPoint,
            crate::services::rating_service::LeetCodeStats,
            crate::utils::Pagination,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration, login and profile (platform handles)."),
        (name = "Sheets", description = "Problem sheets. Listing and detail include the caller's progress."),
        (name = "Problems", description = "Problems inside a sheet and per-user completion toggling."),
        (name = "Stats", description = "Streaks, activity heatmap, contest rating history."),
        (name = "Health", description = "Liveness and database reachability."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from POST /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}
