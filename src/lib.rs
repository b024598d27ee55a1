//! Pantry console: session-gated record management for a food pantry, backed by PostgreSQL.

pub mod auth;
pub mod collection;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod views;

pub use collection::{Collection, CollectionRegistry, CollectionSchema, ColumnInfo, ColumnKind};
pub use config::{from_env, Settings};
pub use error::{AppError, ConfigError};
pub use migration::{apply_migrations, seed_admin};
pub use routes::app_router;
pub use service::RecordRepository;
pub use state::AppState;
pub use store::{InMemoryStore, PgRecordStore, Record, RecordStore};
pub use views::Views;
