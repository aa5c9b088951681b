use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use crate::auth::{dto::ErrorBody, repo::StoreError};

/// Everything that can go wrong while registering an account.
#[derive(Debug, thiserror::Error)]
pub enum SignupError {
    #[error("{message}")]
    Validation { status: StatusCode, message: String },

    #[error("{message}")]
    Persistence {
        status: StatusCode,
        message: String,
        #[source]
        source: StoreError,
    },

    #[error("Server Error")]
    Unknown { cause: anyhow::Error },
}

impl SignupError {
    pub fn validation(message: impl Into<String>) -> Self {
        SignupError::Validation {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unknown(cause: impl Into<anyhow::Error>) -> Self {
        SignupError::Unknown {
            cause: cause.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SignupError::Validation { status, .. } | SignupError::Persistence { status, .. } => {
                *status
            }
            SignupError::Unknown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SignupError::Validation { .. } => "validation-failed",
            SignupError::Persistence {
                source: StoreError::UniqueViolation,
                ..
            } => "duplicate-user",
            SignupError::Persistence { .. } => "persistence-failed",
            SignupError::Unknown { .. } => "server-error",
        }
    }
}

impl From<StoreError> for SignupError {
    fn from(source: StoreError) -> Self {
        match source {
            StoreError::UniqueViolation => SignupError::Persistence {
                status: StatusCode::CONFLICT,
                message: "User already exists".into(),
                source,
            },
            StoreError::Database(_) => SignupError::Persistence {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Error saving new user credentials".into(),
                source,
            },
        }
    }
}

impl From<JsonRejection> for SignupError {
    fn from(rejection: JsonRejection) -> Self {
        SignupError::Validation {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for SignupError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            SignupError::Unknown { cause } => error!(error = %cause, "signup failed"),
            SignupError::Persistence { source, .. } if status.is_server_error() => {
                error!(error = %source, "signup persistence failed")
            }
            other => warn!(error = %other, %status, "signup rejected"),
        }
        let body = ErrorBody {
            message: self.to_string(),
            err: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
