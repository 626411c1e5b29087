use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::db::{storage_price, CreateAlert, NewPriceAlert, PriceAlert, UpdateAlert};
use crate::errors::AppErrors;
use crate::routes::extract::{Json, Path};
use crate::routes::Message;
use crate::tracker;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Result;
use chrono::Utc;
use validator::Validate;

/// Alert `id` if it belongs to one of the user's products.
async fn owned_alert(state: &AppState, user_id: u32, id: u32) -> Result<PriceAlert, AppErrors> {
    let alert = state.db.get_alert(id).await?;
    tracker::owned_product(state, user_id, alert.product_id).await?;
    Ok(alert)
}

pub async fn create_alert(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(product_id): Path<u32>,
    Json(payload): Json<CreateAlert>,
) -> Result<(StatusCode, Json<PriceAlert>), AppErrors> {
    payload.validate()?;
    tracker::owned_product(&state, current.id(), product_id).await?;
    let alert = state
        .db
        .create_alert(NewPriceAlert {
            product_id,
            target_price: storage_price(payload.target_price).unwrap_or(payload.target_price),
            active: payload.active,
            created_at: Utc::now(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

pub async fn product_alerts(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(product_id): Path<u32>,
) -> Result<Json<Vec<PriceAlert>>, AppErrors> {
    tracker::owned_product(&state, current.id(), product_id).await?;
    let alerts = state.db.alerts_by_product(product_id).await?;
    Ok(Json(alerts))
}

pub async fn alerts(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<PriceAlert>>, AppErrors> {
    let alerts = state.db.alerts_by_user(current.id()).await?;
    Ok(Json(alerts))
}

pub async fn update_alert(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u32>,
    Json(payload): Json<UpdateAlert>,
) -> Result<Json<PriceAlert>, AppErrors> {
    owned_alert(&state, current.id(), id).await?;
    let alert = state.db.update_alert_status(id, payload.active).await?;
    Ok(Json(alert))
}

pub async fn delete_alert(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u32>,
) -> Result<Json<Message>, AppErrors> {
    owned_alert(&state, current.id(), id).await?;
    state.db.delete_alert(id).await?;
    Ok(Json(Message::new("Price alert deleted successfully")))
}
