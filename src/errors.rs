use crate::db::DatabaseError;
use crate::parser::ParserError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("socket address parsing error: {0}")]
    SocketAddressParsingError(#[from] std::net::AddrParseError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ConfigurationError(#[from] ConfigurationError),
    #[error(transparent)]
    AppErrors(#[from] AppErrors),
    #[error(transparent)]
    ParserError(#[from] ParserError),
    #[error("http client error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("unknown database type")]
    UnknownDatabaseType,
    #[error("relational database requires protocol, host, port, user, password and name")]
    MissingDatabaseSettings,
    #[error("{0} is not a supported environment, use either `dev` or `prod`")]
    UnknownEnvironment(String),
    #[error("failed to read configuration: {0}")]
    ConfigError(#[from] config::ConfigError),
}

#[derive(Error, Debug)]
pub enum AppErrors {
    #[error("validation failed")]
    Validation(#[from] validator::ValidationErrors),
    #[error("{}", .0.body_text())]
    InvalidJson(#[from] JsonRejection),
    #[error("{}", .0.body_text())]
    InvalidPath(#[from] PathRejection),
    #[error("not authenticated")]
    Unauthenticated,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("not authorized to access this resource")]
    Forbidden,
    #[error(transparent)]
    DatabaseError(#[from] DatabaseError),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    ConfigurationError(#[from] ConfigurationError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<validator::ValidationErrors>,
}

impl AppErrors {
    pub fn status(&self) -> StatusCode {
        match self {
            AppErrors::Validation(_) | AppErrors::InvalidJson(_) | AppErrors::InvalidPath(_) => {
                StatusCode::BAD_REQUEST
            }
            AppErrors::Unauthenticated | AppErrors::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppErrors::Forbidden => StatusCode::FORBIDDEN,
            AppErrors::DatabaseError(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            AppErrors::DatabaseError(err) if err.is_duplicate() => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppErrors::Validation(_) | AppErrors::InvalidJson(_) | AppErrors::InvalidPath(_) => {
                "validation"
            }
            AppErrors::Unauthenticated | AppErrors::InvalidCredentials => "unauthenticated",
            AppErrors::Forbidden => "forbidden",
            AppErrors::DatabaseError(err) if err.is_not_found() => "not_found",
            AppErrors::DatabaseError(err) if err.is_duplicate() => "duplicate",
            _ => "internal",
        }
    }
}

impl IntoResponse for AppErrors {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {self}");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            kind: self.kind(),
            message,
            errors: match self {
                AppErrors::Validation(errors) => Some(errors),
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}
