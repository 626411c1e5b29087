use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::db::{AddProduct, PriceHistory, Product};
use crate::errors::AppErrors;
use crate::routes::extract::{Json, Path};
use crate::routes::Message;
use crate::tracker;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Result;
use validator::Validate;

pub async fn add_product(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<AddProduct>,
) -> Result<(StatusCode, Json<Product>), AppErrors> {
    payload.validate()?;
    let product = tracker::add_product(&state, current.id(), &payload.url).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn products(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<Product>>, AppErrors> {
    let products = state.db.products_by_user(current.id()).await?;
    Ok(Json(products))
}

pub async fn product(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u32>,
) -> Result<Json<Product>, AppErrors> {
    let product = tracker::owned_product(&state, current.id(), id).await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u32>,
) -> Result<Json<Message>, AppErrors> {
    tracker::delete_product(&state, current.id(), id).await?;
    Ok(Json(Message::new("Product deleted successfully")))
}

pub async fn refresh(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u32>,
) -> Result<Json<Product>, AppErrors> {
    let product = tracker::refresh_product(&state, current.id(), id).await?;
    Ok(Json(product))
}

pub async fn history(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<u32>,
) -> Result<Json<Vec<PriceHistory>>, AppErrors> {
    tracker::owned_product(&state, current.id(), id).await?;
    let history = state.db.history_by_product(id).await?;
    Ok(Json(history))
}
