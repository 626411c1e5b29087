pub mod app_state;
pub mod auth;
pub mod configuration;
pub mod db;
pub mod errors;
pub mod notifier;
pub mod parser;
mod routes;
pub mod tracker;

use crate::app_state::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/health_check", get(routes::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/products",
            get(routes::products::products).post(routes::products::add_product),
        )
        .route(
            "/products/:id",
            get(routes::products::product).delete(routes::products::delete_product),
        )
        .route("/products/:id/refresh", post(routes::products::refresh))
        .route("/products/:id/history", get(routes::products::history))
        .route(
            "/products/:id/alerts",
            get(routes::alerts::product_alerts).post(routes::alerts::create_alert),
        )
        .route("/alerts", get(routes::alerts::alerts))
        .route(
            "/alerts/:id",
            put(routes::alerts::update_alert).delete(routes::alerts::delete_alert),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
