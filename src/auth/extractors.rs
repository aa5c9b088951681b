use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use super::{
    claims::Claims,
    cookie::{self, SESSION_COOKIE_NAME},
    dto::ErrorBody,
    jwt::JwtKeys,
};

/// Verified claims taken from the `jwt` session cookie.
pub struct SessionUser(pub Claims);

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody {
            message: message.into(),
            err: "unauthorized".into(),
        }),
    )
        .into_response()
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = cookie::find(&parts.headers, SESSION_COOKIE_NAME)
            .ok_or_else(|| unauthorized("Missing session cookie"))?;

        let keys = JwtKeys::from_ref(state);
        match keys.verify(&token) {
            Ok(claims) => Ok(SessionUser(claims)),
            Err(e) => {
                warn!(error = %e, "invalid or expired session token");
                Err(unauthorized("Invalid or expired session"))
            }
        }
    }
}
