use crate::utils::AppError;

const DEV_JWT_SECRET: &str = "default-secret-change-me";

/// Runtime configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_name: Option<String>,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub cors_origin: String,
    pub leetcode_api_url: String,
    pub codeforces_api_url: String,
    pub seed: Option<SeedConfig>,
}

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub path: String,
    pub title: String,
    pub owner_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| AppError::Config("DATABASE_URL must be set".to_string()))?;

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                log::warn!("⚠️  JWT_SECRET not set, using development default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let seed = get("SEED_SHEET_PATH").map(|path| SeedConfig {
            path,
            title: get("SEED_SHEET_TITLE").unwrap_or_else(|| "Neetcode 250".to_string()),
            owner_email: get("SEED_OWNER_EMAIL"),
        });

        Ok(AppConfig {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), "PORT", 5000)?,
            database_url,
            database_name: get("DATABASE_NAME"),
            jwt_secret,
            token_ttl_minutes: parse_or(get("TOKEN_TTL_MINUTES"), "TOKEN_TTL_MINUTES", 60)?,
            bcrypt_cost: parse_or(get("BCRYPT_COST"), "BCRYPT_COST", 10)?,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string()),
            leetcode_api_url: get("LEETCODE_API_URL")
                .unwrap_or_else(|| "https://alfa-leetcode-api.onrender.com".to_string()),
            codeforces_api_url: get("CODEFORCES_API_URL")
                .unwrap_or_else(|| "https://codeforces.com".to_string()),
            seed,
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, AppError> {
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, v))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "mongodb://localhost/kudos")])).unwrap();
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.token_ttl_minutes, 60);
        assert_eq!(cfg.bcrypt_cost, 10);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn requires_database_url() {
        assert!(matches!(AppConfig::from_lookup(lookup(&[])), Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_bad_numbers() {
        let res = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "mongodb://x"), ("PORT", "http")]));
        assert!(matches!(res, Err(AppError::Config(_))));
    }

    #[test]
    fn seed_block_only_with_path() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "mongodb://x"),
            ("SEED_SHEET_PATH", "data/neetcode_250.json"),
        ]))
        .unwrap();
        let seed = cfg.seed.unwrap();
        assert_eq!(seed.title, "Neetcode 250");
        assert!(seed.owner_email.is_none());
    }
}
