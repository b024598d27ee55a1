//! JSON bodies for endpoints that answer scripts rather than pages.

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Body of `POST /delete/:table/:id`; failures use the `AppError` envelope.
#[derive(Debug, Serialize)]
pub struct DeleteOutcome {
    pub success: bool,
}

pub fn deleted() -> (StatusCode, Json<DeleteOutcome>) {
    (StatusCode::OK, Json(DeleteOutcome { success: true }))
}
