//! Create the console's tables when they are absent, and seed the first administrator.
//! Order follows foreign-key dependencies: orders reference customers and employees.

use crate::auth::gate::{ROLE_COLUMN, USERNAME_COLUMN};
use crate::collection::{EMPLOYEES, PASSWORD_COLUMN};
use crate::config::BootstrapAdmin;
use crate::error::AppError;
use crate::service::RecordRepository;
use crate::store::Record;
use serde_json::Value;
use sqlx::PgPool;

const ADMIN_LEVEL: &str = "admin";

const TABLES: &[(&str, &str)] = &[
    (
        "customers",
        r#"CREATE TABLE IF NOT EXISTS "customers" (
    "customer_id" SERIAL PRIMARY KEY,
    "first_name" TEXT,
    "last_name" TEXT,
    "email" TEXT,
    "phone" TEXT,
    "household_size" INTEGER,
    "location" TEXT,
    "created_at" DATE NOT NULL DEFAULT CURRENT_DATE
)"#,
    ),
    (
        "employees",
        r#"CREATE TABLE IF NOT EXISTS "employees" (
    "employee_id" SERIAL PRIMARY KEY,
    "first_name" TEXT,
    "last_name" TEXT,
    "username" TEXT NOT NULL UNIQUE,
    "password" TEXT NOT NULL,
    "level" TEXT NOT NULL DEFAULT 'staff'
)"#,
    ),
    (
        "orders",
        r#"CREATE TABLE IF NOT EXISTS "orders" (
    "order_id" SERIAL PRIMARY KEY,
    "customer_id" INTEGER REFERENCES "customers" ("customer_id") ON DELETE SET NULL,
    "employee_id" INTEGER REFERENCES "employees" ("employee_id") ON DELETE SET NULL,
    "order_date" DATE NOT NULL DEFAULT CURRENT_DATE,
    "items" TEXT,
    "location" TEXT
)"#,
    ),
];

/// Idempotent: existing tables are left untouched.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    for (table, ddl) in TABLES {
        tracing::debug!(table, "ensure table");
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!(tables = TABLES.len(), "migrations applied");
    Ok(())
}

/// Insert `admin` when the staff table is empty. Returns whether a row was written.
pub async fn seed_admin(records: &RecordRepository, admin: &BootstrapAdmin) -> Result<bool, AppError> {
    if !records.list(EMPLOYEES.name, None, None).await?.is_empty() {
        tracing::debug!("employees present; bootstrap admin skipped");
        return Ok(false);
    }
    let mut fields = Record::new();
    fields.insert(USERNAME_COLUMN.to_string(), Value::String(admin.username.clone()));
    fields.insert(PASSWORD_COLUMN.to_string(), Value::String(admin.password.clone()));
    fields.insert(ROLE_COLUMN.to_string(), Value::String(ADMIN_LEVEL.to_string()));
    records.insert(EMPLOYEES.name, fields).await?;
    tracing::info!(username = %admin.username, "bootstrap admin created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::is_password_hash;
    use crate::collection::ColumnKind;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    fn repo() -> (Arc<InMemoryStore>, RecordRepository) {
        let store = Arc::new(InMemoryStore::new().with_collection(
            EMPLOYEES,
            &[
                ("username", ColumnKind::Text),
                ("password", ColumnKind::Text),
                ("level", ColumnKind::Text),
            ],
        ));
        (store.clone(), RecordRepository::new(store))
    }

    fn admin() -> BootstrapAdmin {
        BootstrapAdmin {
            username: "root".into(),
            password: "changeme".into(),
        }
    }

    #[test]
    fn every_table_is_create_if_not_exists() {
        let names: Vec<&str> = TABLES.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["customers", "employees", "orders"]);
        for (_, ddl) in TABLES {
            assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS"));
        }
    }

    #[tokio::test]
    async fn seeds_hashed_admin_once() {
        let (store, records) = repo();
        assert!(seed_admin(&records, &admin()).await.unwrap());
        assert!(!seed_admin(&records, &admin()).await.unwrap());

        let rows = store.rows(EMPLOYEES);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["level"], "admin");
        assert!(is_password_hash(rows[0]["password"].as_str().unwrap()));
    }
}
