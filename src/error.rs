//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
    #[error("unknown column '{column}' for collection {collection}")]
    UnknownColumn { collection: String, column: String },
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("authentication failed: {0}")]
    AuthFailure(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("render: {0}")]
    Render(#[from] tera::Error),
    #[error("credential: {0}")]
    Credential(String),
    #[error("session: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AppError {
    /// Stable machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::UnknownCollection(_) => "unknown_collection",
            AppError::UnknownColumn { .. } => "unknown_column",
            AppError::ConstraintViolation(_) => "constraint_violation",
            AppError::StoreUnavailable(_) => "store_unavailable",
            AppError::AuthFailure(_) => "auth_failure",
            AppError::BadRequest(_) => "bad_request",
            AppError::Render(_) => "render_error",
            AppError::Credential(_) => "credential_error",
            AppError::Session(_) => "session_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthFailure(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Statement-level rejections (unique, foreign key, bad cast) are constraint
/// violations; everything else means the store could not be reached or used.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => AppError::ConstraintViolation(db.message().to_string()),
            sqlx::Error::ColumnDecode { index, source } => {
                AppError::ConstraintViolation(format!("column {}: {}", index, source))
            }
            other => AppError::StoreUnavailable(other.to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
