use crate::app_state::AppState;
use crate::auth::{self, CurrentUser};
use crate::db::{DatabaseError, LoginUser, NewUser, PublicUser, RegisterUser, User};
use crate::errors::AppErrors;
use crate::routes::extract::Json;
use crate::routes::Message;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Result};
use serde::Serialize;
use tracing::info;
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub token: String,
}

async fn start_session(state: &AppState, user: &User) -> (String, AuthResponse) {
    let session = state.sessions.create(user.id).await;
    let cookie = auth::session_cookie(&session.token, state.sessions.ttl().num_seconds());
    let body = AuthResponse {
        user: user.into(),
        token: session.token,
    };
    (cookie, body)
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUser>,
) -> Result<impl IntoResponse, AppErrors> {
    payload.validate()?;
    if state.db.get_user_by_username(&payload.username).await?.is_some() {
        return Err(DatabaseError::DuplicateUsername.into());
    }
    if state.db.get_user_by_email(&payload.email).await?.is_some() {
        return Err(DatabaseError::DuplicateEmail.into());
    }
    let password_hash = auth::hash_password(&payload.password)?;
    let user = state
        .db
        .create_user(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await?;
    info!(user_id = user.id, "user registered");
    let (cookie, body) = start_session(&state, &user).await;
    Ok((StatusCode::CREATED, [(SET_COOKIE, cookie)], Json(body)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginUser>,
) -> Result<impl IntoResponse, AppErrors> {
    payload.validate()?;
    let user = state
        .db
        .get_user_by_username(&payload.username)
        .await?
        .ok_or(AppErrors::InvalidCredentials)?;
    if !auth::verify_password(&payload.password, &user.password_hash)? {
        return Err(AppErrors::InvalidCredentials);
    }
    let (cookie, body) = start_session(&state, &user).await;
    Ok(([(SET_COOKIE, cookie)], Json(body)))
}

pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, AppErrors> {
    state.sessions.remove(&current.token).await;
    Ok((
        [(SET_COOKIE, auth::expired_session_cookie())],
        Json(Message::new("Logged out successfully")),
    ))
}

pub async fn me(current: CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(&current.user))
}
