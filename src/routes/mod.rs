mod common;
mod console;

pub use common::common_routes;
pub use console::console_routes;

use crate::auth::{require_session, SESSION_COOKIE};
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue},
    middleware, Router,
};
use std::path::Path;
use tower_http::{
    limit::RequestBodyLimitLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer};

pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self' http://localhost:* ws://localhost:* wss://localhost:*; \
    connect-src 'self' http://localhost:* ws://localhost:* wss://localhost:*; \
    script-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net; \
    style-src 'self' 'unsafe-inline' https://cdn.jsdelivr.net; \
    img-src 'self' data: https:; \
    font-src 'self' https://cdn.jsdelivr.net;";

const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Full application: pages, records, health checks and static assets behind the
/// session gate, with the security header and request tracing applied to every response.
pub fn app_router(state: AppState, static_dir: &Path) -> Router {
    let sessions = SessionManagerLayer::new(state.sessions.store())
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(state.sessions.secure())
        .with_expiry(Expiry::OnInactivity(state.sessions.idle_ttl()))
        .with_always_save(true)
        .with_signed(state.sessions.key());
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(console_routes(state.clone()))
        .nest_service("/css", ServeDir::new(static_dir.join("css")))
        .nest_service("/photos", ServeDir::new(static_dir.join("photos")))
        .layer(middleware::from_fn_with_state(state, require_session))
        .layer(sessions)
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
}
