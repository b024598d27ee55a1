//! Public pages: landing and customer self sign-up.

use super::record_from_form;
use crate::collection::CUSTOMERS;
use crate::error::AppError;
use crate::state::AppState;
use crate::views::display;
use axum::{extract::State, response::Html, Form};

const LOCATION_COLUMN: &str = "location";

pub async fn home(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    state.views.home()
}

pub async fn sign_up_form(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let schema = state.records.schema(CUSTOMERS.name).await?;
    state.views.sign_up(&schema, None, None)
}

/// Insert the submitted customer and show the assigned number.
pub async fn sign_up(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Html<String>, AppError> {
    let row = state.records.insert(CUSTOMERS.name, record_from_form(pairs)).await?;
    let schema = state.records.schema(CUSTOMERS.name).await?;
    let id = row.get(CUSTOMERS.identity_column).map(display);
    let location = row.get(LOCATION_COLUMN).map(display).filter(|l| !l.is_empty());
    state.views.sign_up(&schema, id, location)
}
