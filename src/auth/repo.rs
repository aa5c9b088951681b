use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::auth::repo_types::{NewUser, User};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user already exists")]
    UniqueViolation,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            StoreError::UniqueViolation
        } else {
            StoreError::Database(err)
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| code.as_ref() == UNIQUE_VIOLATION),
        _ => false,
    }
}

/// Credential store used by the signup workflow.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Either the row exists afterwards or nothing was written.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn close(&self);
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Build the process-wide pool and apply pending migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;
        info!(max_connections, "database pool ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (uid, email, nickname, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING uid, email, nickname, password_hash, created_at
            "#,
        )
        .bind(user.uid)
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT uid, email, nickname, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    };

    use time::OffsetDateTime;

    use super::*;

    /// In-process store for tests. Can mimic a unique email index and an outage.
    pub struct MemoryUserStore {
        users: Mutex<Vec<User>>,
        unique_email: bool,
        unavailable: AtomicBool,
    }

    impl MemoryUserStore {
        pub fn new() -> Self {
            Self {
                users: Mutex::new(Vec::new()),
                unique_email: true,
                unavailable: AtomicBool::new(false),
            }
        }

        pub fn without_unique_email() -> Self {
            Self {
                unique_email: false,
                ..Self::new()
            }
        }

        pub fn set_unavailable(&self, down: bool) {
            self.unavailable.store(down, Ordering::SeqCst);
        }

        pub fn all(&self) -> Vec<User> {
            self.users.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn create(&self, user: NewUser) -> Result<User, StoreError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            let mut users = self.users.lock().unwrap();
            if self.unique_email && users.iter().any(|u| u.email == user.email) {
                return Err(StoreError::UniqueViolation);
            }
            let row = User {
                uid: user.uid,
                email: user.email,
                nickname: user.nickname,
                password_hash: user.password_hash,
                created_at: OffsetDateTime::now_utc(),
            };
            users.push(row.clone());
            Ok(row)
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            let users = self.users.lock().unwrap();
            Ok(users.iter().find(|u| u.email == email).cloned())
        }

        async fn close(&self) {}
    }
}
