//! Collection registry: the closed set of managed tables and their identity columns.
//!
//! Every path that reads by id, writes or deletes resolves the collection here
//! first, so an unregistered name never reaches the store.

use crate::error::AppError;

/// A registered collection: table name and the column that identifies a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Collection {
    pub name: &'static str,
    pub identity_column: &'static str,
}

pub const CUSTOMERS: Collection = Collection { name: "customers", identity_column: "customer_id" };
pub const EMPLOYEES: Collection = Collection { name: "employees", identity_column: "employee_id" };
pub const ORDERS: Collection = Collection { name: "orders", identity_column: "order_id" };

/// Credential column of `employees`: written hashed, never displayed or searched.
pub const PASSWORD_COLUMN: &str = "password";

impl Collection {
    pub fn is_hidden(&self, column: &str) -> bool {
        *self == EMPLOYEES && column == PASSWORD_COLUMN
    }
}

const REGISTERED: [Collection; 3] = [CUSTOMERS, EMPLOYEES, ORDERS];

/// Collection listed when a request names none.
pub const DEFAULT_COLLECTION: &str = "customers";

pub struct CollectionRegistry;

impl CollectionRegistry {
    pub fn resolve(name: &str) -> Result<Collection, AppError> {
        REGISTERED
            .iter()
            .find(|c| c.name == name)
            .copied()
            .ok_or_else(|| AppError::UnknownCollection(name.to_string()))
    }

    pub fn identity_column_of(name: &str) -> Result<&'static str, AppError> {
        Self::resolve(name).map(|c| c.identity_column)
    }

    pub fn collections() -> &'static [Collection] {
        &REGISTERED
    }
}

/// One column as reported by the store.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    /// Store type used for SQL casts (e.g. `"pg_catalog"."int4"`). None for untyped stores.
    pub pg_type: Option<String>,
    pub kind: ColumnKind,
    pub nullable: bool,
    /// Whether the store fills the column when it is omitted (serial, DEFAULT).
    pub has_default: bool,
}

/// Coarse value class, enough to coerce form text before it is bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Decimal,
    Boolean,
    Temporal,
    Other,
}

impl ColumnKind {
    /// Classify a PostgreSQL `udt_name`.
    pub fn from_udt(udt: &str) -> Self {
        match udt {
            "int2" | "int4" | "int8" => ColumnKind::Integer,
            "numeric" | "float4" | "float8" | "money" => ColumnKind::Decimal,
            "bool" => ColumnKind::Boolean,
            "date" | "time" | "timetz" | "timestamp" | "timestamptz" | "interval" => ColumnKind::Temporal,
            "text" | "varchar" | "bpchar" | "char" | "name" | "citext" => ColumnKind::Text,
            _ => ColumnKind::Other,
        }
    }
}

impl ColumnInfo {
    /// Column with no store type information; used by the in-memory store.
    pub fn untyped(name: &str, kind: ColumnKind) -> Self {
        ColumnInfo {
            name: name.to_string(),
            pg_type: None,
            kind,
            nullable: true,
            has_default: false,
        }
    }
}

/// A registered collection with its introspected columns.
#[derive(Clone, Debug)]
pub struct CollectionSchema {
    pub collection: Collection,
    pub columns: Vec<ColumnInfo>,
}

impl CollectionSchema {
    pub fn name(&self) -> &'static str {
        self.collection.name
    }

    pub fn identity_column(&self) -> &'static str {
        self.collection.identity_column
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn identity(&self) -> Option<&ColumnInfo> {
        self.column(self.collection.identity_column)
    }

    /// Allow-list check for client-supplied column names.
    pub fn require_column(&self, name: &str) -> Result<&ColumnInfo, AppError> {
        self.column(name).ok_or_else(|| AppError::UnknownColumn {
            collection: self.collection.name.to_string(),
            column: name.to_string(),
        })
    }

    /// Columns that may be listed, searched and sorted on.
    pub fn visible_columns(&self) -> Vec<&ColumnInfo> {
        self.columns.iter().filter(|c| !self.collection.is_hidden(&c.name)).collect()
    }

    /// Like `require_column`, but a hidden column counts as unknown.
    pub fn require_visible_column(&self, name: &str) -> Result<&ColumnInfo, AppError> {
        if self.collection.is_hidden(name) {
            return Err(AppError::UnknownColumn {
                collection: self.collection.name.to_string(),
                column: name.to_string(),
            });
        }
        self.require_column(name)
    }

    /// Columns shown on the add form: everything the store will not fill by itself.
    pub fn input_columns(&self) -> Vec<&ColumnInfo> {
        self.columns
            .iter()
            .filter(|c| !(c.name == self.collection.identity_column && c.has_default))
            .collect()
    }
}
