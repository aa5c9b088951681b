use anyhow::Context;
use serde::Deserialize;

/// Upper bound for `JWT_TTL_MINUTES` (about 100 years).
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365 * 100;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    /// Work factor for password hashing (argon2 iteration count).
    pub password_hash_cost: u32,
}

impl JwtConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            (1..=MAX_TTL_MINUTES).contains(&self.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}, got {}",
            self.ttl_minutes
        );
        Ok(())
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "signup".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "signup-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60 * 24 * 30),
        };
        jwt.validate()?;
        Ok(Self {
            database_url,
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(10),
            jwt,
            password_hash_cost: env_parse("PASSWORD_HASH_COST").unwrap_or(12),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
