use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub uid: Uuid,                  // account ID, fixed at creation
    pub email: String,              // normalized email
    pub nickname: String,
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 PHC string, never plaintext
    pub created_at: OffsetDateTime,
}

/// Insert payload for a brand new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub uid: Uuid,
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
}

impl NewUser {
    /// The uid comes from a fresh v4 UUID, never from caller input.
    pub fn new(email: String, nickname: String, password_hash: String) -> Self {
        Self {
            uid: Uuid::new_v4(),
            email,
            nickname,
            password_hash,
        }
    }
}
