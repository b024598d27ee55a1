//! Per-request authorization context resolved from the session cookie.

use crate::auth::session::{Principal, SessionUser, SESSION_USER_KEY};
use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use tower_sessions::Session;

/// The caller's session and, when logged in, who they are. Handlers take
/// this explicitly instead of reading shared session state.
#[derive(Clone)]
pub struct AuthContext {
    pub session: Session,
    pub user: Option<SessionUser>,
}

impl AuthContext {
    pub fn is_authenticated(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_authenticated)
    }

    pub fn role(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.role.as_str())
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }

    /// Start an authenticated session under a fresh id; the previous id is discarded.
    pub async fn log_in(&mut self, principal: Principal) -> Result<&SessionUser, AppError> {
        self.session.cycle_id().await?;
        let user = SessionUser::new(principal);
        self.session.insert(SESSION_USER_KEY, &user).await?;
        Ok(self.user.insert(user))
    }

    /// Drop the session and its data; returns whether someone was logged in.
    pub async fn log_out(&mut self) -> Result<bool, AppError> {
        self.session.flush().await?;
        Ok(self.user.take().is_some())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // The gate has already resolved it for this request.
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(ctx.clone());
        }
        let session = Session::from_request_parts(parts, state).await?;
        let user = match session.get::<SessionUser>(SESSION_USER_KEY).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable session treated as anonymous");
                None
            }
        };
        Ok(AuthContext { session, user })
    }
}
