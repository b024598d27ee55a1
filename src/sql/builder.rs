//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for a collection.
//!
//! Identifiers come from the registry or the introspected schema only; values
//! always travel as parameters.

use crate::collection::{CollectionSchema, ColumnInfo, ColumnKind};
use crate::error::AppError;
use crate::sql::params::contains_pattern;
use crate::store::{Condition, Criteria};
use serde_json::Value;

/// Quote identifier for PostgreSQL.
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Push a value destined for `column` and return its (cast) placeholder.
    fn push_for(&mut self, column: &ColumnInfo, v: Value) -> String {
        let n = self.push_param(v);
        placeholder(column, n)
    }
}

fn placeholder(column: &ColumnInfo, n: u32) -> String {
    column
        .pg_type
        .as_deref()
        .map(|t| format!("${}::{}", n, t))
        .unwrap_or_else(|| format!("${}", n))
}

/// SELECT list: only integer, boolean and text columns are decoded natively;
/// every other type comes back in its PostgreSQL text form.
fn select_column_list(schema: &CollectionSchema) -> String {
    schema
        .columns
        .iter()
        .map(|c| {
            let q = quoted(&c.name);
            match c.kind {
                ColumnKind::Integer | ColumnKind::Boolean | ColumnKind::Text => q,
                ColumnKind::Decimal | ColumnKind::Temporal | ColumnKind::Other => format!("{}::text AS {}", q, q),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every column named in `criteria` must belong to `schema`.
pub fn select_list(schema: &CollectionSchema, criteria: &Criteria) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut where_clause = String::new();
    match &criteria.condition {
        Some(Condition::Matches(search)) => {
            schema.require_column(&search.column)?;
            let n = q.push_param(Value::String(contains_pattern(&search.pattern)));
            where_clause = format!(" WHERE {}::text ILIKE ${}", quoted(&search.column), n);
        }
        Some(Condition::Equals { column, value }) => {
            let info = schema.require_column(column)?;
            let ph = q.push_for(info, value.clone());
            where_clause = format!(" WHERE {} = {}", quoted(column), ph);
        }
        None => {}
    }
    let order_clause = match &criteria.sort {
        Some(s) => {
            schema.require_column(&s.column)?;
            format!(" ORDER BY {} {}", quoted(&s.column), s.direction.as_sql())
        }
        None => String::new(),
    };
    q.sql = format!(
        "SELECT {} FROM {}{}{}",
        select_column_list(schema),
        quoted(schema.name()),
        where_clause,
        order_clause
    );
    Ok(q)
}

/// INSERT exactly the submitted columns; the store fills the rest from its defaults.
pub fn insert(schema: &CollectionSchema, fields: &serde_json::Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &schema.columns {
        let Some(val) = fields.get(&c.name) else { continue };
        placeholders.push(q.push_for(c, val.clone()));
        cols.push(quoted(&c.name));
    }
    let returning = select_column_list(schema);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", quoted(schema.name()), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(schema.name()),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by identity: SET only submitted columns, never the identity itself.
/// Returns None when nothing would be written.
pub fn update(
    schema: &CollectionSchema,
    id: &Value,
    fields: &serde_json::Map<String, Value>,
) -> Option<QueryBuf> {
    let identity = schema.identity()?;
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &schema.columns {
        if c.name == identity.name {
            continue;
        }
        let Some(val) = fields.get(&c.name) else { continue };
        let rhs = q.push_for(c, val.clone());
        sets.push(format!("{} = {}", quoted(&c.name), rhs));
    }
    if sets.is_empty() {
        return None;
    }
    let id_ph = q.push_for(identity, id.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        quoted(schema.name()),
        sets.join(", "),
        quoted(&identity.name),
        id_ph
    );
    Some(q)
}

/// DELETE by identity.
pub fn delete(schema: &CollectionSchema, id: &Value) -> Option<QueryBuf> {
    let identity = schema.identity()?;
    let mut q = QueryBuf::new();
    let id_ph = q.push_for(identity, id.clone());
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        quoted(schema.name()),
        quoted(&identity.name),
        id_ph
    );
    Some(q)
}

/// Column introspection for one table in the connection's current schema.
pub fn describe_columns() -> &'static str {
    "SELECT column_name::text, udt_schema::text, udt_name::text, is_nullable::text, \
     (column_default IS NOT NULL OR is_identity = 'YES') AS has_default \
     FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = $1 \
     ORDER BY ordinal_position"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CUSTOMERS;
    use crate::service::{SearchSpec, SortDirection, SortSpec};
    use serde_json::json;

    fn customers() -> CollectionSchema {
        let col = |name: &str, udt: &str, kind| ColumnInfo {
            name: name.into(),
            pg_type: Some(format!("\"pg_catalog\".\"{}\"", udt)),
            kind,
            nullable: true,
            has_default: name == "customer_id",
        };
        CollectionSchema {
            collection: CUSTOMERS,
            columns: vec![
                col("customer_id", "int4", ColumnKind::Integer),
                col("first_name", "text", ColumnKind::Text),
                col("balance", "numeric", ColumnKind::Decimal),
                col("pickup_time", "time", ColumnKind::Temporal),
            ],
        }
    }

    #[test]
    fn list_without_criteria_keeps_natural_order() {
        let q = select_list(&customers(), &Criteria::default()).unwrap();
        assert_eq!(
            q.sql,
            "SELECT \"customer_id\", \"first_name\", \"balance\"::text AS \"balance\", \
             \"pickup_time\"::text AS \"pickup_time\" FROM \"customers\""
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn list_with_search_and_sort() {
        let criteria = Criteria {
            condition: Some(Condition::Matches(SearchSpec {
                column: "first_name".into(),
                pattern: "ann".into(),
            })),
            sort: Some(SortSpec {
                column: "customer_id".into(),
                direction: SortDirection::Desc,
            }),
        };
        let q = select_list(&customers(), &criteria).unwrap();
        assert!(q.sql.ends_with(" WHERE \"first_name\"::text ILIKE $1 ORDER BY \"customer_id\" DESC"));
        assert_eq!(q.params, vec![json!("%ann%")]);
    }

    #[test]
    fn equals_casts_to_column_type() {
        let criteria = Criteria {
            condition: Some(Condition::Equals {
                column: "customer_id".into(),
                value: json!(7),
            }),
            sort: None,
        };
        let q = select_list(&customers(), &criteria).unwrap();
        assert!(q.sql.ends_with(" WHERE \"customer_id\" = $1::\"pg_catalog\".\"int4\""));
    }

    #[test]
    fn time_of_day_and_interval_columns_are_read_as_text() {
        let mut schema = customers();
        schema.columns.push(ColumnInfo {
            name: "wait".into(),
            pg_type: Some("\"pg_catalog\".\"interval\"".into()),
            kind: ColumnKind::from_udt("interval"),
            nullable: true,
            has_default: false,
        });
        let q = select_list(&schema, &Criteria::default()).unwrap();
        assert!(q.sql.contains("\"pickup_time\"::text AS \"pickup_time\""));
        assert!(q.sql.contains("\"wait\"::text AS \"wait\""));

        let returning = insert(&schema, &serde_json::Map::new()).sql;
        assert!(returning.contains("\"pickup_time\"::text AS \"pickup_time\""));
    }

    #[test]
    fn columns_outside_the_schema_never_reach_the_query() {
        let equals = Criteria {
            condition: Some(Condition::Equals {
                column: "nickname".into(),
                value: json!("x"),
            }),
            sort: None,
        };
        assert!(matches!(
            select_list(&customers(), &equals),
            Err(AppError::UnknownColumn { .. })
        ));

        let sort = Criteria {
            condition: None,
            sort: Some(SortSpec {
                column: "nickname".into(),
                direction: SortDirection::Asc,
            }),
        };
        assert!(select_list(&customers(), &sort).is_err());
    }

    #[test]
    fn insert_uses_only_submitted_columns() {
        let mut fields = serde_json::Map::new();
        fields.insert("first_name".into(), json!("Ann"));
        let q = insert(&customers(), &fields);
        assert!(q.sql.starts_with(
            "INSERT INTO \"customers\" (\"first_name\") VALUES ($1::\"pg_catalog\".\"text\") RETURNING "
        ));
        assert_eq!(q.params, vec![json!("Ann")]);
    }

    #[test]
    fn update_skips_identity_and_binds_id_last() {
        let mut fields = serde_json::Map::new();
        fields.insert("customer_id".into(), json!(99));
        fields.insert("first_name".into(), json!("Bea"));
        let q = update(&customers(), &json!(3), &fields).unwrap();
        assert_eq!(
            q.sql,
            "UPDATE \"customers\" SET \"first_name\" = $1::\"pg_catalog\".\"text\" \
             WHERE \"customer_id\" = $2::\"pg_catalog\".\"int4\""
        );
        assert_eq!(q.params, vec![json!("Bea"), json!(3)]);
    }

    #[test]
    fn update_with_nothing_to_set_is_none() {
        let mut fields = serde_json::Map::new();
        fields.insert("customer_id".into(), json!(99));
        assert!(update(&customers(), &json!(3), &fields).is_none());
    }

    #[test]
    fn delete_by_identity() {
        let q = delete(&customers(), &json!("12")).unwrap();
        assert_eq!(
            q.sql,
            "DELETE FROM \"customers\" WHERE \"customer_id\" = $1::\"pg_catalog\".\"int4\""
        );
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quoted("we\"ird"), "\"we\"\"ird\"");
    }
}
