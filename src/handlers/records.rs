//! Console handlers: list, search, add, edit, delete over any registered collection.

use super::record_from_form;
use crate::collection::DEFAULT_COLLECTION;
use crate::error::AppError;
use crate::extractors::AuthContext;
use crate::response::{deleted, DeleteOutcome};
use crate::service::{ListParams, ListQuery, SearchForm};
use crate::state::AppState;
use crate::views::DatabasePage;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};

pub const RECORD_NOT_FOUND: &str = "Could not find record to edit.";

pub async fn database(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    listing(&state, &ctx, params, StatusCode::OK, "").await
}

pub async fn search(
    State(state): State<AppState>,
    ctx: AuthContext,
    Form(form): Form<SearchForm>,
) -> Result<Response, AppError> {
    listing(&state, &ctx, form.into(), StatusCode::OK, "").await
}

/// Render the database view for `params`; table defaults to customers.
async fn listing(
    state: &AppState,
    ctx: &AuthContext,
    params: ListParams,
    status: StatusCode,
    error_message: &str,
) -> Result<Response, AppError> {
    let table = params
        .table
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_COLLECTION);
    let schema = state.records.schema(table).await?;
    let query = ListQuery::build(&schema, &params)?;
    let records = state
        .records
        .list_in(&schema, query.filter.as_ref(), query.sort.as_ref())
        .await?;

    let mut page = DatabasePage::new(&schema, &records);
    page.username = ctx.username().unwrap_or_default().to_string();
    page.role = ctx.role().unwrap_or_default().to_string();
    page.error_message = error_message.to_string();
    page.search_term = params.search;
    page.col = params.col;
    if let Some(sort) = query.sort {
        page.current_sort_column = sort.column;
        page.current_sort_order = sort.direction.as_str().to_string();
    }
    Ok((status, state.views.database(&page)?).into_response())
}

pub async fn add_form(State(state): State<AppState>, Path(table): Path<String>) -> Result<Html<String>, AppError> {
    let schema = state.records.schema(&table).await?;
    state.views.add(&schema, "")
}

pub async fn add(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    let schema = state.records.schema(&table).await?;
    state.records.insert(schema.name(), record_from_form(pairs)).await?;
    Ok(Redirect::to(&format!("/database?table={}", schema.name())))
}

pub async fn edit_form(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path((table, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    match state.records.find(&table, &id).await? {
        Some(record) => {
            let schema = state.records.schema(&table).await?;
            Ok(state.views.edit(&schema, &id, &record)?.into_response())
        }
        None => {
            let params = ListParams {
                table: Some(table),
                ..Default::default()
            };
            listing(&state, &ctx, params, StatusCode::NOT_FOUND, RECORD_NOT_FOUND).await
        }
    }
}

pub async fn edit(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    let schema = state.records.schema(&table).await?;
    state.records.update(schema.name(), &id, record_from_form(pairs)).await?;
    Ok(Redirect::to(&format!("/database?table={}", schema.name())))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<DeleteOutcome>), AppError> {
    state.records.delete(&table, &id).await?;
    Ok(deleted())
}
