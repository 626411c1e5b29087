use crate::app_state::AppState;
use crate::db::User;
use crate::errors::AppErrors;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use tracing::debug;

mod password;
mod sessions;

pub use password::{hash_password, verify_password};
pub use sessions::{Session, Sessions};

pub const SESSION_COOKIE: &str = "session";

/// Session token from `Authorization: Bearer` or, failing that, the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

pub fn expired_session_cookie() -> String {
    session_cookie("", 0)
}

/// The user behind the request's session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

impl CurrentUser {
    pub fn id(&self) -> u32 {
        self.user.id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppErrors;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AppErrors::Unauthenticated)?;
        let session = state
            .sessions
            .get(&token)
            .await
            .ok_or(AppErrors::Unauthenticated)?;
        match state.db.get_user(session.user_id).await {
            Ok(user) => Ok(Self { user, token }),
            Err(e) if e.is_not_found() => {
                debug!(user_id = session.user_id, "session points to a missing user");
                state.sessions.remove(&token).await;
                Err(AppErrors::Unauthenticated)
            }
            Err(e) => Err(e.into()),
        }
    }
}
