//! Login and logout.

use crate::auth::authenticate;
use crate::error::AppError;
use crate::extractors::AuthContext;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_form(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    state.views.login("")
}

/// On success the caller gets a fresh session id and is sent to the console;
/// on failure the form is shown again with 401. The username must match exactly.
pub async fn login(
    State(state): State<AppState>,
    mut ctx: AuthContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match authenticate(&state.records, &form.username, &form.password).await {
        Ok(principal) => {
            let user = ctx.log_in(principal).await?;
            tracing::info!(username = %user.username, role = %user.role, "session started");
            Ok(Redirect::to("/database").into_response())
        }
        Err(AppError::AuthFailure(message)) => {
            Ok((StatusCode::UNAUTHORIZED, state.views.login(&message)?).into_response())
        }
        Err(e) => Err(e),
    }
}

pub async fn logout(mut ctx: AuthContext) -> Result<Redirect, AppError> {
    let username = ctx.username().unwrap_or_default().to_string();
    if ctx.log_out().await? {
        tracing::info!(username = %username, "session ended");
    }
    Ok(Redirect::to("/"))
}
