use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::{config::AppConfig, services::auth_service, utils::AppError};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user _id (hex)
    pub email: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<ObjectId, AppError> {
        ObjectId::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))
    }
}

/// Pulls the bearer token out of the `Authorization` header.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AppError> {
    let header = header.ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;
    header
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| AppError::Unauthorized("Malformed token".to_string()))
}

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verified = {
            // A header that isn't visible ASCII is present but unusable.
            let header = req
                .headers()
                .get(actix_web::http::header::AUTHORIZATION)
                .map(|v| v.to_str().unwrap_or_default());

            match req.app_data::<web::Data<AppConfig>>() {
                Some(config) => extract_bearer(header)
                    .and_then(|token| auth_service::verify_token(&config.jwt_secret, token)),
                None => Err(AppError::Internal("AppConfig not registered".to_string())),
            }
        };

        match verified {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
            }
            Err(e) => {
                log::warn!("🔒 {} {} rejected: {}", req.method(), req.path(), e);
                let response = e.error_response().map_into_right_body();
                Box::pin(async move { Ok(req.into_response(response)) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{
        http::{header::HeaderValue, StatusCode},
        test as actix_test, App, HttpResponse,
    };

    fn config() -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("mongodb://localhost:27017".to_string()),
            "JWT_SECRET" => Some("middleware-secret".to_string()),
            _ => None,
        })
        .unwrap()
    }

    async fn whoami(claims: web::ReqData<Claims>) -> HttpResponse {
        HttpResponse::Ok().body(claims.sub.clone())
    }

    macro_rules! app {
        () => {
            actix_test::init_service(
                App::new().app_data(web::Data::new(config())).service(
                    web::scope("/api")
                        .wrap(AuthMiddleware)
                        .route("/me", web::get().to(whoami)),
                ),
            )
            .await
        };
    }

    #[test]
    fn bearer_extraction_messages() {
        assert_eq!(extract_bearer(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(extract_bearer(None).unwrap_err().to_string(), "No token provided");
        assert_eq!(extract_bearer(Some("Bearer")).unwrap_err().to_string(), "Malformed token");
        assert_eq!(extract_bearer(Some("")).unwrap_err().to_string(), "Malformed token");
    }

    #[actix_web::test]
    async fn non_ascii_header_is_malformed_not_missing() {
        let app = app!();
        let req = actix_test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap()))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], "Malformed token");
    }

    #[actix_web::test]
    async fn rejects_missing_header() {
        let app = app!();
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/api/me").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], "No token provided");
    }

    #[actix_web::test]
    async fn rejects_garbage_token() {
        let app = app!();
        let req = actix_test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", "Bearer not.a.jwt"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = actix_test::read_body_json(res).await;
        assert_eq!(body["message"], "Invalid or expired token");
    }

    #[actix_web::test]
    async fn passes_claims_to_handler() {
        let app = app!();
        let user_id = ObjectId::new();
        let token = auth_service::generate_token(&config(), &user_id, "ada@example.com").unwrap();

        let req = actix_test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = actix_test::read_body(res).await;
        assert_eq!(body, user_id.to_hex().as_bytes());
    }
}
