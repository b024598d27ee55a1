//! Page and record routes of the staff console.

use crate::handlers::{pages, records, session};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn console_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/signUp", get(pages::sign_up_form).post(pages::sign_up))
        .route("/login", get(session::login_form).post(session::login))
        .route("/logout", get(session::logout))
        .route("/database", get(records::database))
        .route("/search", post(records::search))
        .route("/add/:table", get(records::add_form).post(records::add))
        .route("/edit/:table/:id", get(records::edit_form).post(records::edit))
        .route("/delete/:table/:id", post(records::delete))
        .with_state(state)
}
