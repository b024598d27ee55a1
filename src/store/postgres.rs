//! PostgreSQL record store.

use super::{Criteria, Record, RecordStore};
use crate::collection::{Collection, CollectionSchema, ColumnInfo, ColumnKind};
use crate::error::AppError;
use crate::sql::{self, bind_text, quoted, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;
use std::sync::RwLock;

/// Executes builder output against a pool. Column layouts are cached per
/// collection after the first lookup; rows never are.
pub struct PgRecordStore {
    pool: PgPool,
    layouts: RwLock<HashMap<&'static str, Vec<ColumnInfo>>>,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        PgRecordStore {
            pool,
            layouts: RwLock::new(HashMap::new()),
        }
    }

    async fn describe(&self, collection: Collection) -> Result<Vec<ColumnInfo>, AppError> {
        let rows = sqlx::query_as::<_, (String, String, String, String, bool)>(sql::describe_columns())
            .bind(collection.name)
            .fetch_all(&self.pool)
            .await?;
        if rows.is_empty() {
            return Err(AppError::StoreUnavailable(format!(
                "table {} does not exist",
                collection.name
            )));
        }
        Ok(rows
            .into_iter()
            .map(|(name, udt_schema, udt_name, is_nullable, has_default)| ColumnInfo {
                name,
                pg_type: Some(format!("{}.{}", quoted(&udt_schema), quoted(&udt_name))),
                kind: ColumnKind::from_udt(&udt_name),
                nullable: is_nullable == "YES",
                has_default,
            })
            .collect())
    }
}

fn prepare(q: &QueryBuf) -> sqlx::query::Query<'_, Postgres, PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(bind_text(p));
    }
    query
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn columns(&self, collection: Collection) -> Result<Vec<ColumnInfo>, AppError> {
        {
            let cache = self
                .layouts
                .read()
                .map_err(|_| AppError::StoreUnavailable("layout cache poisoned".into()))?;
            if let Some(cols) = cache.get(collection.name) {
                return Ok(cols.clone());
            }
        }
        let cols = self.describe(collection).await?;
        if let Ok(mut cache) = self.layouts.write() {
            cache.insert(collection.name, cols.clone());
        }
        Ok(cols)
    }

    async fn select(&self, schema: &CollectionSchema, criteria: &Criteria) -> Result<Vec<Record>, AppError> {
        let q = sql::select_list(schema, criteria)?;
        let rows = prepare(&q).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn insert(&self, schema: &CollectionSchema, fields: &Record) -> Result<Record, AppError> {
        let q = sql::insert(schema, fields);
        let row = prepare(&q).fetch_one(&self.pool).await?;
        row_to_record(&row)
    }

    async fn update(&self, schema: &CollectionSchema, id: &Value, fields: &Record) -> Result<u64, AppError> {
        let Some(q) = sql::update(schema, id, fields) else {
            return Ok(0);
        };
        let done = prepare(&q).execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    async fn delete(&self, schema: &CollectionSchema, id: &Value) -> Result<u64, AppError> {
        let Some(q) = sql::delete(schema, id) else {
            return Ok(0);
        };
        let done = prepare(&q).execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn row_to_record(row: &PgRow) -> Result<Record, AppError> {
    use sqlx::{Column, Row, TypeInfo};
    let mut map = Record::new();
    for (i, col) in row.columns().iter().enumerate() {
        let v = cell_to_value(row, i, col.type_info().name())?;
        map.insert(col.name().to_string(), v);
    }
    Ok(map)
}

/// The select list leaves only integer, boolean and text cells undecoded; a
/// cell that still fails to decode is an error rather than a silent NULL.
fn cell_to_value(row: &PgRow, i: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    use sqlx::Row;
    fn num<T: Into<serde_json::Number>>(v: Option<T>) -> Value {
        v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null)
    }

    match type_name {
        "INT2" => row.try_get::<Option<i16>, _>(i).map(num),
        "INT4" => row.try_get::<Option<i32>, _>(i).map(num),
        "INT8" => row.try_get::<Option<i64>, _>(i).map(num),
        "BOOL" => row.try_get::<Option<bool>, _>(i).map(|v| v.map(Value::Bool).unwrap_or(Value::Null)),
        _ => row
            .try_get::<Option<String>, _>(i)
            .map(|v| v.map(Value::String).unwrap_or(Value::Null)),
    }
}
