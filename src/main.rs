mod api;
mod config;
mod database;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer, ResponseError};
use dotenv::dotenv;
use std::io;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppConfig, services::rating_service::RatingClients, utils::AppError};

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(256 * 1024)
        .error_handler(|err, _req| AppError::bad_request(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| AppError::bad_request(err.to_string()).into())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("❌ {}", e);
        io::Error::other(e.to_string())
    })?;

    log::info!("🚀 Starting Kudos Service...");

    let db = database::MongoDB::new(&config.database_url, config.database_name.as_deref())
        .await
        .map_err(|e| {
            log::error!("❌ Failed to connect to MongoDB: {}", e);
            io::Error::other(e.to_string())
        })?;
    log::info!("✅ MongoDB connected successfully");

    if let Some(seed) = &config.seed {
        seeds::sheet_seed::seed_sheet_from_file(&db, seed).await;
    }

    let bind = (config.host.clone(), config.port);
    log::info!("🌐 Server starting on {}:{}", bind.0, bind.1);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", bind.0, bind.1);

    let db_data = web::Data::new(db);
    let rating_clients = web::Data::new(RatingClients::from_config(&config));
    let config_data = web::Data::new(config);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config_data.cors_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(rating_clients.clone())
            .app_data(json_config())
            .app_data(query_config())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", api::swagger::ApiDoc::openapi()),
            )
            .route("/health", web::get().to(api::health::health_check))
            // Auth: register/login are public, profile needs a token
            .service(
                web::scope("/api/auth")
                    .route("/register", web::post().to(api::auth::register))
                    .route("/login", web::post().to(api::auth::login))
                    .service(
                        web::resource("/profile")
                            .wrap(middleware::AuthMiddleware)
                            .route(web::get().to(api::auth::profile))
                            .route(web::put().to(api::auth::update_profile)),
                    ),
            )
            // Sheets and their problems
            .service(
                web::scope("/api/sheets")
                    .wrap(middleware::AuthMiddleware)
                    .route("", web::post().to(api::sheets::create_sheet))
                    .route("", web::get().to(api::sheets::list_sheets))
                    .route("/", web::post().to(api::sheets::create_sheet))
                    .route("/", web::get().to(api::sheets::list_sheets))
                    .route("/problems/{id}", web::delete().to(api::sheets::delete_problem))
                    .route("/problems/{problem_id}/toggle", web::put().to(api::sheets::toggle_problem))
                    .route("/{id}", web::get().to(api::sheets::get_sheet))
                    .route("/{id}", web::put().to(api::sheets::update_sheet))
                    .route("/{id}", web::delete().to(api::sheets::delete_sheet))
                    .route("/{sheet_id}/problems", web::post().to(api::sheets::add_problem)),
            )
            .service(
                web::scope("/api/stats")
                    .wrap(middleware::AuthMiddleware)
                    .route("/summary", web::get().to(api::stats::summary))
                    .route("/activity", web::get().to(api::stats::activity))
                    .route("/ratings", web::get().to(api::stats::ratings))
                    .route("/leetcode", web::get().to(api::stats::leetcode)),
            )
            .default_service(web::to(|| async {
                AppError::not_found("Route not found").error_response()
            }))
    })
    .bind(bind)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Body {
        title: String,
    }

    #[actix_web::test]
    async fn malformed_json_is_a_bad_request_with_message() {
        let app = test::init_service(App::new().app_data(json_config()).route(
            "/echo",
            web::post().to(|body: web::Json<Body>| async move { body.title.clone() }),
        ))
        .await;

        let req = test::TestRequest::post()
            .uri("/echo")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{\"title\": 5}")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert!(body["message"].is_string());
    }
}
