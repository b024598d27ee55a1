//! Shared application state for all routes.

use crate::auth::SessionSettings;
use crate::service::RecordRepository;
use crate::views::Views;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub records: RecordRepository,
    pub sessions: SessionSettings,
    pub views: Arc<Views>,
}
