//! Authorization gate and the login check.

use crate::auth::password::{self, Verification};
use crate::auth::session::Principal;
use crate::collection::{EMPLOYEES, PASSWORD_COLUMN};
use crate::error::AppError;
use crate::extractors::AuthContext;
use crate::service::RecordRepository;
use crate::state::AppState;
use crate::store::Record;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

pub const USERNAME_COLUMN: &str = "username";
/// Staff privilege level, exposed as the session role.
pub const ROLE_COLUMN: &str = "level";

pub const INVALID_LOGIN: &str = "Invalid login";
pub const ACCESS_DENIED: &str = "Please log in to access this page";

const PUBLIC_PATHS: &[&str] = &["/", "/login", "/logout", "/signUp", "/health", "/favicon.ico"];
const STATIC_ROOTS: &[&str] = &["/css", "/photos"];

#[derive(Debug, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
        || STATIC_ROOTS
            .iter()
            .any(|root| path == *root || path.strip_prefix(root).is_some_and(|rest| rest.starts_with('/')))
}

pub fn authorize(path: &str, authenticated: bool) -> Access {
    if is_public_path(path) || authenticated {
        Access::Allow
    } else {
        Access::Deny
    }
}

/// Middleware: public paths pass; anything else needs a session, else the
/// login view is rendered with an access-denied message.
pub async fn require_session(
    State(state): State<AppState>,
    ctx: AuthContext,
    mut request: Request,
    next: Next,
) -> Response {
    match authorize(request.uri().path(), ctx.is_authenticated()) {
        Access::Allow => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Access::Deny => {
            tracing::info!(path = %request.uri().path(), "unauthenticated request denied");
            match state.views.login(ACCESS_DENIED) {
                Ok(page) => (StatusCode::UNAUTHORIZED, page).into_response(),
                Err(e) => e.into_response(),
            }
        }
    }
}

/// Check credentials against the staff collection. Every failure, including
/// store errors, is the same `AuthFailure`.
pub async fn authenticate(
    records: &RecordRepository,
    username: &str,
    candidate: &str,
) -> Result<Principal, AppError> {
    let invalid = || AppError::AuthFailure(INVALID_LOGIN.to_string());
    let row = match records.find_by(EMPLOYEES.name, USERNAME_COLUMN, username).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            password::verify_dummy(candidate);
            tracing::info!(username, "login rejected");
            return Err(invalid());
        }
        Err(e) => {
            tracing::error!(error = %e, "login lookup failed");
            password::verify_dummy(candidate);
            return Err(invalid());
        }
    };

    let stored = row.get(PASSWORD_COLUMN).and_then(Value::as_str).unwrap_or_default();
    let principal = principal_of(&row);
    match password::verify_stored(candidate, stored) {
        Verification::Invalid => {
            tracing::info!(username, "login rejected");
            Err(invalid())
        }
        Verification::Valid => {
            tracing::info!(username, "login accepted");
            Ok(principal)
        }
        Verification::ValidLegacy => {
            let mut fields = Record::new();
            fields.insert(PASSWORD_COLUMN.to_string(), Value::String(candidate.to_string()));
            if let Err(e) = records.update(EMPLOYEES.name, &principal.user_id, fields).await {
                tracing::warn!(username, error = %e, "could not rehash legacy password");
            } else {
                tracing::info!(username, "legacy password rehashed");
            }
            tracing::info!(username, "login accepted");
            Ok(principal)
        }
    }
}

fn text_of(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn principal_of(row: &Record) -> Principal {
    Principal {
        user_id: text_of(row.get(EMPLOYEES.identity_column)),
        username: text_of(row.get(USERNAME_COLUMN)),
        role: text_of(row.get(ROLE_COLUMN)),
    }
}
