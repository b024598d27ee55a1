//! Generic record operations over any registered collection.

use crate::auth::password;
use crate::collection::{CollectionRegistry, CollectionSchema, ColumnInfo, ColumnKind, EMPLOYEES, PASSWORD_COLUMN};
use crate::error::AppError;
use crate::service::{SearchSpec, SortSpec};
use crate::store::{Condition, Criteria, Record, RecordStore};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct RecordRepository {
    store: Arc<dyn RecordStore>,
}

impl RecordRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        RecordRepository { store }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Resolve the collection, then ask the store for its columns.
    pub async fn schema(&self, collection: &str) -> Result<CollectionSchema, AppError> {
        let collection = CollectionRegistry::resolve(collection)?;
        let columns = self.store.columns(collection).await?;
        Ok(CollectionSchema { collection, columns })
    }

    /// All records, optionally filtered (case-insensitive contains) and sorted.
    pub async fn list(
        &self,
        collection: &str,
        filter: Option<&SearchSpec>,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<Record>, AppError> {
        let schema = self.schema(collection).await?;
        self.list_in(&schema, filter, sort).await
    }

    /// Same as `list` for a schema the caller already holds.
    pub async fn list_in(
        &self,
        schema: &CollectionSchema,
        filter: Option<&SearchSpec>,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<Record>, AppError> {
        let condition = match filter {
            Some(f) => {
                schema.require_visible_column(&f.column)?;
                (!f.pattern.is_empty()).then(|| Condition::Matches(f.clone()))
            }
            None => None,
        };
        if let Some(s) = sort {
            schema.require_visible_column(&s.column)?;
        }
        let criteria = Criteria {
            condition,
            sort: sort.cloned(),
        };
        self.store.select(schema, &criteria).await
    }

    /// Record whose identity column equals `id`.
    pub async fn find(&self, collection: &str, id: &str) -> Result<Option<Record>, AppError> {
        let schema = self.schema(collection).await?;
        let column = schema.identity_column();
        self.find_by_in(&schema, column, id).await
    }

    /// First record whose `column` equals `value` exactly.
    pub async fn find_by(&self, collection: &str, column: &str, value: &str) -> Result<Option<Record>, AppError> {
        let schema = self.schema(collection).await?;
        self.find_by_in(&schema, column, value).await
    }

    async fn find_by_in(
        &self,
        schema: &CollectionSchema,
        column: &str,
        value: &str,
    ) -> Result<Option<Record>, AppError> {
        let info = schema.require_column(column)?;
        let criteria = Criteria {
            condition: Some(Condition::Equals {
                column: column.to_string(),
                value: coerce_value(info, Value::String(value.to_string())),
            }),
            sort: None,
        };
        let rows = self.store.select(schema, &criteria).await?;
        Ok(rows.into_iter().next())
    }

    /// Persist exactly the submitted fields; returns the stored record.
    pub async fn insert(&self, collection: &str, fields: Record) -> Result<Record, AppError> {
        let schema = self.schema(collection).await?;
        let fields = prepare_fields(&schema, fields)?;
        let row = self.store.insert(&schema, &fields).await?;
        tracing::info!(collection = schema.name(), id = ?row.get(schema.identity_column()), "record inserted");
        Ok(row)
    }

    /// Overwrite submitted fields of the record `id`. A missing record is a no-op.
    pub async fn update(&self, collection: &str, id: &str, fields: Record) -> Result<(), AppError> {
        let schema = self.schema(collection).await?;
        let fields = prepare_fields(&schema, fields)?;
        let id = identity_value(&schema, id);
        let n = self.store.update(&schema, &id, &fields).await?;
        tracing::info!(collection = schema.name(), id = %id, rows = n, "record updated");
        Ok(())
    }

    /// Remove the record `id`. Succeeds whether or not it existed.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        let schema = self.schema(collection).await?;
        let id = identity_value(&schema, id);
        let n = self.store.delete(&schema, &id).await?;
        tracing::info!(collection = schema.name(), id = %id, rows = n, "record deleted");
        Ok(())
    }
}

fn identity_value(schema: &CollectionSchema, id: &str) -> Value {
    let raw = Value::String(id.to_string());
    match schema.identity() {
        Some(info) => coerce_value(info, raw),
        None => raw,
    }
}

/// Allow-list field names, coerce form text, and hash credentials.
fn prepare_fields(schema: &CollectionSchema, fields: Record) -> Result<Record, AppError> {
    let mut out = Record::new();
    for (name, value) in fields {
        let info = schema.require_column(&name)?;
        let value = coerce_value(info, value);
        let value = if schema.collection == EMPLOYEES && name == PASSWORD_COLUMN {
            protect_password(value)?
        } else {
            value
        };
        out.insert(name, value);
    }
    Ok(out)
}

/// Hash a submitted credential. An empty or missing one is refused.
fn protect_password(value: Value) -> Result<Value, AppError> {
    match value {
        Value::String(s) if s.is_empty() => Err(AppError::ConstraintViolation("password must not be empty".into())),
        Value::String(s) if !password::is_password_hash(&s) => Ok(Value::String(password::hash_password(&s)?)),
        Value::Null => Err(AppError::ConstraintViolation("password must not be empty".into())),
        other => Ok(other),
    }
}

/// Form values arrive as text. Empty text in a non-text column is NULL;
/// integer and boolean text become typed values. Anything else passes as-is
/// and the store casts it.
pub fn coerce_value(column: &ColumnInfo, v: Value) -> Value {
    let Value::String(s) = v else { return v };
    match column.kind {
        ColumnKind::Text => Value::String(s),
        _ if s.trim().is_empty() => Value::Null,
        ColumnKind::Integer => match s.trim().parse::<i64>() {
            Ok(n) => Value::Number(n.into()),
            Err(_) => Value::String(s),
        },
        ColumnKind::Boolean => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Value::Bool(true),
            "false" | "off" | "no" | "0" => Value::Bool(false),
            _ => Value::String(s),
        },
        _ => Value::String(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn col(kind: ColumnKind) -> ColumnInfo {
        ColumnInfo::untyped("c", kind)
    }

    #[test]
    fn coercion_by_column_kind() {
        assert_eq!(coerce_value(&col(ColumnKind::Integer), json!(" 12 ")), json!(12));
        assert_eq!(coerce_value(&col(ColumnKind::Integer), json!("")), Value::Null);
        assert_eq!(coerce_value(&col(ColumnKind::Integer), json!("abc")), json!("abc"));
        assert_eq!(coerce_value(&col(ColumnKind::Text), json!("")), json!(""));
        assert_eq!(coerce_value(&col(ColumnKind::Boolean), json!("on")), json!(true));
        assert_eq!(coerce_value(&col(ColumnKind::Temporal), json!("2024-01-07")), json!("2024-01-07"));
        assert_eq!(coerce_value(&col(ColumnKind::Temporal), json!(" ")), Value::Null);
    }

    #[test]
    fn plaintext_passwords_are_hashed_once() {
        let hashed = protect_password(json!("hunter2")).unwrap();
        let s = hashed.as_str().unwrap().to_string();
        assert!(password::is_password_hash(&s));
        assert_eq!(protect_password(hashed).unwrap(), json!(s));
    }

    #[test]
    fn empty_passwords_are_refused() {
        for v in [json!(""), Value::Null] {
            assert!(matches!(protect_password(v), Err(AppError::ConstraintViolation(_))));
        }
    }
}
