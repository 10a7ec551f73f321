use crate::{
    config::AppConfig,
    database::{MongoDB, USERS},
    middleware::auth::Claims,
    models::{User, UserProfile},
    utils::AppError,
};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub leetcode_username: Option<String>,
    pub codeforces_username: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserProfile,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `None` clears the field, so blank input disconnects a handle.
fn normalize_handle(handle: &str) -> Option<String> {
    let trimmed = handle.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// bcrypt is CPU-bound, keep it off the reactor
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();
    Ok(tokio::task::spawn_blocking(move || hash(password, cost)).await??)
}

pub async fn verify_password(password: &str, hashed: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hashed = hashed.to_string();
    Ok(tokio::task::spawn_blocking(move || verify(password, &hashed)).await??)
}

pub fn generate_token(config: &AppConfig, user_id: &ObjectId, email: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_hex(),
        email: email.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::minutes(config.token_ttl_minutes)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        log::debug!("Token rejected: {}", e);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })
}

/// Normalized email and the raw password, or 400 when either is blank.
fn validate_registration(request: &RegisterRequest) -> Result<(String, &str), AppError> {
    let email = request
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::bad_request("Email is required"))?;
    let password = request
        .password
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Password is required"))?;
    Ok((email, password))
}

pub async fn register(db: &MongoDB, config: &AppConfig, request: &RegisterRequest) -> Result<(), AppError> {
    let (email, password) = validate_registration(request)?;

    let collection = db.collection::<User>(USERS);

    if collection.find_one(doc! { "email": &email }).await?.is_some() {
        return Err(AppError::bad_request("User already exists!"));
    }

    let new_user = User {
        id: None,
        name: request.name.as_deref().and_then(normalize_handle),
        email,
        password: hash_password(password, config.bcrypt_cost).await?,
        leetcode_username: None,
        codeforces_username: None,
        completed_problems: vec![],
        activity_log: vec![],
        created_at: Some(BsonDateTime::now()),
    };

    match collection.insert_one(&new_user).await {
        Ok(_) => Ok(()),
        // unique index on email: lost a race with a concurrent register
        Err(e) if is_duplicate_key(&e) => Err(AppError::bad_request("User already exists!")),
        Err(e) => Err(e.into()),
    }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(w)) if w.code == 11000
    )
}

pub async fn login(db: &MongoDB, config: &AppConfig, request: &LoginRequest) -> Result<LoginResponse, AppError> {
    let collection = db.collection::<User>(USERS);

    let user = collection
        .find_one(doc! { "email": normalize_email(&request.email) })
        .await?
        .ok_or_else(|| AppError::bad_request(INVALID_CREDENTIALS))?;

    if !verify_password(&request.password, &user.password).await? {
        return Err(AppError::bad_request(INVALID_CREDENTIALS));
    }

    let user_id = user
        .id
        .ok_or_else(|| AppError::Internal("stored user has no _id".to_string()))?;

    Ok(LoginResponse {
        message: "Login successful!".to_string(),
        token: generate_token(config, &user_id, &user.email)?,
    })
}

pub async fn get_user(db: &MongoDB, user_id: &ObjectId) -> Result<User, AppError> {
    db.collection::<User>(USERS)
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn get_profile(db: &MongoDB, user_id: &ObjectId) -> Result<UserProfile, AppError> {
    get_user(db, user_id).await.map(UserProfile::from)
}

/// Builds the `$set`/`$unset` update for the fields actually sent.
fn profile_update(request: &UpdateProfileRequest) -> Option<Document> {
    let mut set = Document::new();
    let mut unset = Document::new();

    for (field, value) in [
        ("leetcodeUsername", &request.leetcode_username),
        ("codeforcesUsername", &request.codeforces_username),
    ] {
        match value.as_deref().map(normalize_handle) {
            Some(Some(handle)) => {
                set.insert(field, handle);
            }
            Some(None) => {
                unset.insert(field, "");
            }
            None => {}
        }
    }

    let mut update = Document::new();
    if !set.is_empty() {
        update.insert("$set", set);
    }
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    (!update.is_empty()).then_some(update)
}

pub async fn update_profile(
    db: &MongoDB,
    user_id: &ObjectId,
    request: &UpdateProfileRequest,
) -> Result<UserProfile, AppError> {
    if let Some(update) = profile_update(request) {
        let result = db
            .collection::<User>(USERS)
            .update_one(doc! { "_id": user_id }, update)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::not_found("User not found"));
        }
    }

    get_profile(db, user_id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("mongodb://localhost:27017/kudos_test".to_string()),
            "JWT_SECRET" => Some("test-secret".to_string()),
            "BCRYPT_COST" => Some("4".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hashed = hash_password("hunter22", 4).await.unwrap();
        assert_ne!(hashed, "hunter22");
        assert!(verify_password("hunter22", &hashed).await.unwrap());
        assert!(!verify_password("hunter23", &hashed).await.unwrap());
    }

    #[test]
    fn token_carries_user_id_and_email() {
        let cfg = config();
        let id = ObjectId::new();
        let token = generate_token(&cfg, &id, "ada@example.com").unwrap();

        let claims = verify_token(&cfg.jwt_secret, &token).unwrap();
        assert_eq!(claims.sub, id.to_hex());
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp - claims.iat, 60 * 60);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let cfg = config();
        let token = generate_token(&cfg, &ObjectId::new(), "a@b.c").unwrap();
        let err = verify_token("another-secret", &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut cfg = config();
        cfg.token_ttl_minutes = -120;
        let token = generate_token(&cfg, &ObjectId::new(), "a@b.c").unwrap();
        assert!(verify_token(&cfg.jwt_secret, &token).is_err());
    }

    #[test]
    fn registration_rejects_blank_fields() {
        let req = |email: Option<&str>, password: Option<&str>| RegisterRequest {
            name: None,
            email: email.map(String::from),
            password: password.map(String::from),
        };

        let err = validate_registration(&req(Some("ada@example.com"), Some("   "))).unwrap_err();
        assert_eq!(err.to_string(), "Password is required");
        assert!(validate_registration(&req(Some("ada@example.com"), None)).is_err());
        assert!(matches!(
            validate_registration(&req(Some("  "), Some("hunter22"))),
            Err(AppError::BadRequest(_))
        ));

        let ok = req(Some(" Ada@Example.com"), Some("hunter22"));
        let (email, password) = validate_registration(&ok).unwrap();
        assert_eq!(email, "ada@example.com");
        assert_eq!(password, "hunter22");
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn profile_update_sets_and_clears_only_sent_fields() {
        let update = profile_update(&UpdateProfileRequest {
            leetcode_username: Some(" ada_lc ".into()),
            codeforces_username: Some("".into()),
        })
        .unwrap();
        assert_eq!(update.get_document("$set").unwrap().get_str("leetcodeUsername").unwrap(), "ada_lc");
        assert!(update.get_document("$unset").unwrap().contains_key("codeforcesUsername"));

        assert!(profile_update(&UpdateProfileRequest {
            leetcode_username: None,
            codeforces_username: None,
        })
        .is_none());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn register_then_login() {
        let cfg = config();
        let db = MongoDB::new(&cfg.database_url, Some("kudos_test")).await.unwrap();
        let email = format!("{}@example.com", Uuid::new_v4());

        let req = RegisterRequest {
            name: Some("Ada".into()),
            email: Some(email.clone()),
            password: Some("hunter22".into()),
        };
        register(&db, &cfg, &req).await.unwrap();
        assert!(matches!(register(&db, &cfg, &req).await, Err(AppError::BadRequest(_))));

        let res = login(&db, &cfg, &LoginRequest { email, password: "hunter22".into() }).await.unwrap();
        assert!(verify_token(&cfg.jwt_secret, &res.token).is_ok());
    }
}
