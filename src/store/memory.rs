//! In-memory record store for tests and local demos.

use super::{Condition, Criteria, Record, RecordStore};
use crate::collection::{Collection, CollectionSchema, ColumnInfo, ColumnKind};
use crate::error::AppError;
use crate::service::SortDirection;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

struct Table {
    columns: Vec<ColumnInfo>,
    rows: Vec<Record>,
    next_id: i64,
}

/// Tables live in a map behind a lock. The identity column is generated
/// (sequence-like) and unique; NOT NULL columns without default are enforced.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table. The collection's identity column is added first if not listed.
    pub fn with_collection(self, collection: Collection, columns: &[(&str, ColumnKind)]) -> Self {
        let mut cols = Vec::with_capacity(columns.len() + 1);
        if !columns.iter().any(|(n, _)| *n == collection.identity_column) {
            cols.push(ColumnInfo::untyped(collection.identity_column, ColumnKind::Integer));
        }
        cols.extend(columns.iter().map(|(n, k)| ColumnInfo::untyped(n, *k)));
        for c in cols.iter_mut() {
            if c.name == collection.identity_column {
                c.has_default = true;
                c.nullable = false;
            }
        }
        if let Ok(mut tables) = self.tables.write() {
            tables.insert(
                collection.name,
                Table {
                    columns: cols,
                    rows: Vec::new(),
                    next_id: 1,
                },
            );
        }
        self
    }

    /// Mark a column NOT NULL (no default).
    pub fn with_required(self, collection: Collection, column: &str) -> Self {
        if let Ok(mut tables) = self.tables.write() {
            if let Some(t) = tables.get_mut(collection.name) {
                if let Some(c) = t.columns.iter_mut().find(|c| c.name == column) {
                    c.nullable = false;
                }
            }
        }
        self
    }

    /// Snapshot of a table's rows, in insertion order.
    pub fn rows(&self, collection: Collection) -> Vec<Record> {
        self.tables
            .read()
            .ok()
            .and_then(|t| t.get(collection.name).map(|t| t.rows.clone()))
            .unwrap_or_default()
    }

    fn with_table<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Table) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| AppError::StoreUnavailable("store lock poisoned".into()))?;
        let table = tables
            .get_mut(name)
            .ok_or_else(|| AppError::StoreUnavailable(format!("table {} does not exist", name)))?;
        f(table)
    }
}

/// Text form of a scalar, as a `::text` cast would print it.
fn as_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (as_text(a), as_text(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// NULLs sort last ascending, like PostgreSQL.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => as_text(a).cmp(&as_text(b)),
    }
}

fn matches(row: &Record, condition: &Condition) -> bool {
    match condition {
        Condition::Matches(search) => row
            .get(&search.column)
            .and_then(as_text)
            .map(|s| s.to_lowercase().contains(&search.pattern.to_lowercase()))
            .unwrap_or(false),
        Condition::Equals { column, value } => row
            .get(column)
            .map(|v| same_value(v, value))
            .unwrap_or(false),
    }
}

fn violation(table: &Table, schema: &CollectionSchema, row: &Record, skip: Option<usize>) -> Option<String> {
    for c in &table.columns {
        if !c.nullable && row.get(&c.name).map(Value::is_null).unwrap_or(true) {
            return Some(format!("null value in column \"{}\" violates not-null constraint", c.name));
        }
    }
    let key = schema.identity_column();
    let id = row.get(key)?;
    let clash = table
        .rows
        .iter()
        .enumerate()
        .any(|(i, r)| Some(i) != skip && r.get(key).map(|v| same_value(v, id)).unwrap_or(false));
    clash.then(|| format!("duplicate key value violates unique constraint on \"{}\"", key))
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn columns(&self, collection: Collection) -> Result<Vec<ColumnInfo>, AppError> {
        self.with_table(collection.name, |t| Ok(t.columns.clone()))
    }

    async fn select(&self, schema: &CollectionSchema, criteria: &Criteria) -> Result<Vec<Record>, AppError> {
        self.with_table(schema.name(), |t| {
            let mut rows: Vec<Record> = t
                .rows
                .iter()
                .filter(|r| criteria.condition.as_ref().map(|c| matches(r, c)).unwrap_or(true))
                .cloned()
                .collect();
            if let Some(sort) = &criteria.sort {
                rows.sort_by(|a, b| {
                    let ord = compare(
                        a.get(&sort.column).unwrap_or(&Value::Null),
                        b.get(&sort.column).unwrap_or(&Value::Null),
                    );
                    match sort.direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                });
            }
            Ok(rows)
        })
    }

    async fn insert(&self, schema: &CollectionSchema, fields: &Record) -> Result<Record, AppError> {
        self.with_table(schema.name(), |t| {
            let key = schema.identity_column();
            let mut row = Record::new();
            for c in &t.columns {
                let v = match fields.get(&c.name) {
                    Some(v) => v.clone(),
                    None if c.name == key => Value::Number(t.next_id.into()),
                    None => Value::Null,
                };
                row.insert(c.name.clone(), v);
            }
            if let Some(msg) = violation(t, schema, &row, None) {
                return Err(AppError::ConstraintViolation(msg));
            }
            if let Some(n) = row.get(key).and_then(Value::as_i64) {
                t.next_id = t.next_id.max(n + 1);
            }
            t.rows.push(row.clone());
            Ok(row)
        })
    }

    async fn update(&self, schema: &CollectionSchema, id: &Value, fields: &Record) -> Result<u64, AppError> {
        self.with_table(schema.name(), |t| {
            let key = schema.identity_column();
            let Some(pos) = t
                .rows
                .iter()
                .position(|r| r.get(key).map(|v| same_value(v, id)).unwrap_or(false))
            else {
                return Ok(0);
            };
            let mut row = t.rows[pos].clone();
            for (k, v) in fields {
                if k != key && row.contains_key(k) {
                    row.insert(k.clone(), v.clone());
                }
            }
            if let Some(msg) = violation(t, schema, &row, Some(pos)) {
                return Err(AppError::ConstraintViolation(msg));
            }
            t.rows[pos] = row;
            Ok(1)
        })
    }

    async fn delete(&self, schema: &CollectionSchema, id: &Value) -> Result<u64, AppError> {
        self.with_table(schema.name(), |t| {
            let key = schema.identity_column();
            let before = t.rows.len();
            t.rows
                .retain(|r| !r.get(key).map(|v| same_value(v, id)).unwrap_or(false));
            Ok((before - t.rows.len()) as u64)
        })
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CUSTOMERS;
    use crate::service::{SearchSpec, SortSpec};
    use serde_json::json;

    async fn store_and_schema() -> (InMemoryStore, CollectionSchema) {
        let store = InMemoryStore::new()
            .with_collection(CUSTOMERS, &[("first_name", ColumnKind::Text), ("location", ColumnKind::Text)])
            .with_required(CUSTOMERS, "first_name");
        let columns = store.columns(CUSTOMERS).await.unwrap();
        (store, CollectionSchema { collection: CUSTOMERS, columns })
    }

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn insert_generates_identity_and_fills_nulls() {
        let (store, schema) = store_and_schema().await;
        let row = store.insert(&schema, &record(&[("first_name", json!("Ann"))])).await.unwrap();
        assert_eq!(row.get("customer_id"), Some(&json!(1)));
        assert_eq!(row.get("location"), Some(&Value::Null));
        let keys: Vec<_> = row.keys().cloned().collect();
        assert_eq!(keys, vec!["customer_id", "first_name", "location"]);
    }

    #[tokio::test]
    async fn not_null_and_duplicate_identity_are_violations() {
        let (store, schema) = store_and_schema().await;
        let err = store.insert(&schema, &record(&[("location", json!("Provo"))])).await.unwrap_err();
        assert!(matches!(err, AppError::ConstraintViolation(_)));

        store
            .insert(&schema, &record(&[("customer_id", json!(5)), ("first_name", json!("A"))]))
            .await
            .unwrap();
        let err = store
            .insert(&schema, &record(&[("customer_id", json!(5)), ("first_name", json!("B"))]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn select_filters_and_sorts_with_nulls_last() {
        let (store, schema) = store_and_schema().await;
        for (name, loc) in [("Zed", json!("Orem")), ("amy", Value::Null), ("Bob", json!("Provo"))] {
            store
                .insert(&schema, &record(&[("first_name", json!(name)), ("location", loc)]))
                .await
                .unwrap();
        }
        let criteria = Criteria {
            condition: None,
            sort: Some(SortSpec { column: "location".into(), direction: SortDirection::Asc }),
        };
        let rows = store.select(&schema, &criteria).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["first_name"].clone()).collect();
        assert_eq!(names, vec![json!("Zed"), json!("Bob"), json!("amy")]);

        let criteria = Criteria {
            condition: Some(Condition::Matches(SearchSpec { column: "first_name".into(), pattern: "AM".into() })),
            sort: None,
        };
        let rows = store.select(&schema, &criteria).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_missing_rows_touch_nothing() {
        let (store, schema) = store_and_schema().await;
        let n = store.update(&schema, &json!(42), &record(&[("first_name", json!("X"))])).await.unwrap();
        assert_eq!(n, 0);
        assert_eq!(store.delete(&schema, &json!(42)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn identity_matches_across_text_and_number() {
        let (store, schema) = store_and_schema().await;
        store.insert(&schema, &record(&[("first_name", json!("Ann"))])).await.unwrap();
        assert_eq!(store.delete(&schema, &json!("1")).await.unwrap(), 1);
    }
}
