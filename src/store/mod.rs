//! Backing-store seam: single-statement record operations against one collection.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgRecordStore;

use crate::collection::{Collection, CollectionSchema, ColumnInfo};
use crate::error::AppError;
use crate::service::{SearchSpec, SortSpec};
use async_trait::async_trait;
use serde_json::Value;

/// One row: column name to scalar, in column order.
pub type Record = serde_json::Map<String, Value>;

/// Row restriction. Columns are validated by the caller before a condition is built.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Matches(SearchSpec),
    Equals { column: String, value: Value },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Criteria {
    pub condition: Option<Condition>,
    pub sort: Option<SortSpec>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Columns of the collection's table, in table order.
    async fn columns(&self, collection: Collection) -> Result<Vec<ColumnInfo>, AppError>;

    async fn select(&self, schema: &CollectionSchema, criteria: &Criteria) -> Result<Vec<Record>, AppError>;

    /// Insert and return the stored row, including generated values.
    async fn insert(&self, schema: &CollectionSchema, fields: &Record) -> Result<Record, AppError>;

    /// Returns the number of rows touched; zero is not an error.
    async fn update(&self, schema: &CollectionSchema, id: &Value, fields: &Record) -> Result<u64, AppError>;

    /// Returns the number of rows removed; zero is not an error.
    async fn delete(&self, schema: &CollectionSchema, id: &Value) -> Result<u64, AppError>;

    /// Cheap connectivity check for `/ready`.
    async fn ping(&self) -> Result<(), AppError>;
}
