use axum::http::HeaderValue;
use tracing::instrument;

use crate::{
    auth::{
        cookie::{self, CookieOptions, SESSION_COOKIE_NAME},
        dto::RegisterRequest,
        errors::SignupError,
        jwt::JwtKeys,
        password::hash_password,
        repo_types::{NewUser, User},
    },
    state::AppState,
};

pub const USER_CREATED_MESSAGE: &str = "Successfully created a new user";
pub const USER_CREATED_CODE: &str = "user-created";

/// Outcome of a successful signup.
#[derive(Debug)]
pub struct Registration {
    pub user: User,
    pub set_cookie: HeaderValue,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hash the password, persist the account, then issue the session cookie.
/// Nothing is signed unless the insert succeeded.
#[instrument(skip_all, fields(email = %payload.email))]
pub async fn register(state: &AppState, payload: RegisterRequest) -> Result<Registration, SignupError> {
    let RegisterRequest {
        email,
        nickname,
        password,
    } = payload;
    let email = normalize_email(&email);

    if email.is_empty() {
        return Err(SignupError::validation("Email is required"));
    }
    if nickname.is_empty() {
        return Err(SignupError::validation("Nickname is required"));
    }
    if password.is_empty() {
        return Err(SignupError::validation("Password is required"));
    }

    // argon2 is CPU bound; keep it off the async workers.
    let cost = state.config.password_hash_cost;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(SignupError::unknown)?
        .map_err(SignupError::unknown)?;

    let user = state
        .users
        .create(NewUser::new(email, nickname, password_hash))
        .await?;

    let keys = JwtKeys::from(&state.config.jwt);
    let token = keys
        .sign(&user.email, &user.nickname)
        .map_err(SignupError::unknown)?;

    let header = cookie::serialize(SESSION_COOKIE_NAME, &token, &CookieOptions::session())
        .map_err(SignupError::unknown)?;
    let set_cookie = HeaderValue::from_str(&header).map_err(SignupError::unknown)?;

    Ok(Registration { user, set_cookie })
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use axum::http::StatusCode;
    use uuid::Version;

    use super::*;
    use crate::auth::{password::verify_password, repo::memory::MemoryUserStore};

    fn token_of(reg: &Registration) -> String {
        let header = reg.set_cookie.to_str().unwrap();
        let pair = header.split(';').next().unwrap();
        pair.strip_prefix("jwt=").unwrap().to_owned()
    }

    fn request(email: &str, nickname: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            nickname: nickname.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_persists_hashed_user_and_issues_cookie() {
        let store = Arc::new(MemoryUserStore::new());
        let state = AppState::fake(store.clone());

        let reg = register(&state, request("jane@example.com", "jane", "hunter2"))
            .await
            .expect("register");

        assert_eq!(reg.user.uid.get_version(), Some(Version::Random));
        assert_ne!(reg.user.password_hash, "hunter2");
        assert!(verify_password("hunter2", &reg.user.password_hash).unwrap());

        let cookie = reg.set_cookie.to_str().unwrap();
        assert!(cookie.starts_with("jwt="));
        assert!(!token_of(&reg).is_empty());
        assert!(cookie.ends_with("Expires=Fri, 31 Dec 9999 12:00:00 GMT"));

        let stored = store.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].uid, reg.user.uid);
        assert_ne!(stored[0].password_hash, "hunter2");
    }

    #[tokio::test]
    async fn issued_token_carries_email_and_nickname() {
        let state = AppState::fake(Arc::new(MemoryUserStore::new()));
        let reg = register(&state, request("a@x.com", "A", "pw")).await.unwrap();

        let claims = JwtKeys::from(&state.config.jwt).verify(&token_of(&reg)).unwrap();
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.nickname, "A");
        assert_eq!(claims.iss, "test-issuer");
    }

    #[tokio::test]
    async fn email_is_normalized_before_insert() {
        let store = Arc::new(MemoryUserStore::new());
        let state = AppState::fake(store.clone());
        register(&state, request("  Jane@Example.COM ", " jane ", "pw"))
            .await
            .unwrap();
        let stored = store.all();
        assert_eq!(stored[0].email, "jane@example.com");
        assert_eq!(stored[0].nickname, " jane ");
    }

    #[tokio::test]
    async fn nickname_survives_token_roundtrip_verbatim() {
        let state = AppState::fake(Arc::new(MemoryUserStore::new()));
        let reg = register(&state, request("Jane@X.com", " J ", "pw")).await.unwrap();

        let claims = JwtKeys::from(&state.config.jwt).verify(&token_of(&reg)).unwrap();
        assert_eq!(claims.email, "jane@x.com");
        assert_eq!(claims.nickname, " J ");
    }

    #[tokio::test]
    async fn whitespace_password_is_hashed_like_any_other() {
        let store = Arc::new(MemoryUserStore::new());
        let state = AppState::fake(store.clone());

        let reg = register(&state, request("a@x.com", "A", "   ")).await.expect("register");
        assert_ne!(reg.user.password_hash, "   ");
        assert!(verify_password("   ", &reg.user.password_hash).unwrap());
        assert_eq!(store.all().len(), 1);
    }

    #[tokio::test]
    async fn repeated_signups_get_distinct_uids_without_unique_index() {
        let store = Arc::new(MemoryUserStore::without_unique_email());
        let state = AppState::fake(store.clone());

        let mut uids = HashSet::new();
        for _ in 0..5 {
            let reg = register(&state, request("dup@x.com", "dup", "pw")).await.unwrap();
            uids.insert(reg.user.uid);
        }
        assert_eq!(uids.len(), 5);
        // No dedup happens above the store.
        assert_eq!(store.all().len(), 5);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_by_unique_store() {
        let store = Arc::new(MemoryUserStore::new());
        let state = AppState::fake(store.clone());

        register(&state, request("dup@x.com", "one", "pw")).await.unwrap();
        let err = register(&state, request("DUP@x.com", "two", "pw"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(store.all().len(), 1);
    }

    #[tokio::test]
    async fn store_outage_returns_500_and_no_record() {
        let store = Arc::new(MemoryUserStore::new());
        store.set_unavailable(true);
        let state = AppState::fake(store.clone());

        let err = register(&state, request("a@x.com", "A", "pw")).await.unwrap_err();
        assert!(matches!(err, SignupError::Persistence { .. }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.all().is_empty());
    }

    #[tokio::test]
    async fn empty_fields_are_rejected_before_hashing() {
        let store = Arc::new(MemoryUserStore::new());
        let state = AppState::fake(store.clone());

        for req in [
            request(" ", "A", "pw"),
            request("a@x.com", "", "pw"),
            request("a@x.com", "A", ""),
        ] {
            let err = register(&state, req).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.code(), "validation-failed");
        }
        assert!(store.all().is_empty());
    }
}
