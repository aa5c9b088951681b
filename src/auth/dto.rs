use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for user registration.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub nickname: String,
    pub password: String,
}

// Hand-written so the plaintext password never reaches a log line.
impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("nickname", &self.nickname)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body returned with a 201 after signup.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterResponse {
    pub message: String,
    pub code: String,
}

/// Failure body. `err` is a stable machine code, never internal detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub err: String,
}

/// Identity carried by a valid session cookie.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub uid: Uuid,
    pub email: String,
    pub nickname: String,
}
