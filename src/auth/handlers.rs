use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{ErrorBody, RegisterRequest, RegisterResponse, SessionResponse},
        errors::SignupError,
        extractors::SessionUser,
        services::{self, USER_CREATED_CODE, USER_CREATED_MESSAGE},
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/sign-up", post(sign_up))
}

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/auth/session", get(session))
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<RegisterResponse>), SignupError> {
    let Json(payload) = payload?;
    let registration = services::register(&state, payload).await?;
    info!(uid = %registration.user.uid, email = %registration.user.email, "user registered");

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, registration.set_cookie);

    Ok((
        StatusCode::CREATED,
        headers,
        Json(RegisterResponse {
            message: USER_CREATED_MESSAGE.into(),
            code: USER_CREATED_CODE.into(),
        }),
    ))
}

#[instrument(skip(state, claims))]
pub async fn session(
    State(state): State<AppState>,
    SessionUser(claims): SessionUser,
) -> Result<Json<SessionResponse>, Response> {
    match state.users.find_by_email(&claims.email).await {
        Ok(Some(user)) => Ok(Json(SessionResponse {
            uid: user.uid,
            email: user.email,
            nickname: user.nickname,
        })),
        Ok(None) => {
            warn!(email = %claims.email, "session for unknown user");
            Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody {
                    message: "User not found".into(),
                    err: "unauthorized".into(),
                }),
            )
                .into_response())
        }
        Err(e) => {
            error!(error = %e, "session lookup failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    message: "Server Error".into(),
                    err: "server-error".into(),
                }),
            )
                .into_response())
        }
    }
}
