use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

pub mod alerts;
pub mod auth;
pub mod extract;
pub mod products;

pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
