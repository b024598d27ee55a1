//! Search and sort construction from raw request input.
//!
//! Column names arrive from query strings and forms; they are checked against
//! the collection's schema before any clause is built.

use crate::collection::CollectionSchema;
use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Case-insensitive "column contains pattern".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchSpec {
    pub column: String,
    pub pattern: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Exactly `desc` sorts descending; anything else is ascending.
    pub fn parse(raw: &str) -> Self {
        if raw == "desc" {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

/// Query string of `GET /database`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub col: String,
    #[serde(default, rename = "sortColumn")]
    pub sort_column: String,
    #[serde(default, rename = "sortOrder")]
    pub sort_order: String,
}

/// Body of `POST /search`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub col: String,
    #[serde(default)]
    pub search: String,
}

impl From<SearchForm> for ListParams {
    fn from(f: SearchForm) -> Self {
        ListParams {
            table: f.table,
            search: f.search,
            col: f.col,
            ..Default::default()
        }
    }
}

/// Validated filter and sort for one listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: Option<SearchSpec>,
    pub sort: Option<SortSpec>,
}

impl ListQuery {
    /// An empty column disables the corresponding clause; a non-empty one must be in the schema.
    pub fn build(schema: &CollectionSchema, params: &ListParams) -> Result<Self, AppError> {
        let col = params.col.trim();
        let filter = if col.is_empty() {
            None
        } else {
            schema.require_visible_column(col)?;
            (!params.search.is_empty()).then(|| SearchSpec {
                column: col.to_string(),
                pattern: params.search.clone(),
            })
        };

        let sort_column = params.sort_column.trim();
        let sort = if sort_column.is_empty() {
            None
        } else {
            schema.require_visible_column(sort_column)?;
            Some(SortSpec {
                column: sort_column.to_string(),
                direction: SortDirection::parse(&params.sort_order),
            })
        };

        Ok(ListQuery { filter, sort })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{ColumnInfo, ColumnKind, CUSTOMERS, EMPLOYEES};

    fn schema() -> CollectionSchema {
        CollectionSchema {
            collection: CUSTOMERS,
            columns: vec![
                ColumnInfo::untyped("customer_id", ColumnKind::Integer),
                ColumnInfo::untyped("last_name", ColumnKind::Text),
            ],
        }
    }

    fn params(col: &str, search: &str, sort_column: &str, sort_order: &str) -> ListParams {
        ListParams {
            table: None,
            search: search.into(),
            col: col.into(),
            sort_column: sort_column.into(),
            sort_order: sort_order.into(),
        }
    }

    #[test]
    fn sort_order_normalizes_to_asc() {
        assert_eq!(SortDirection::parse("desc"), SortDirection::Desc);
        assert_eq!(SortDirection::parse("asc"), SortDirection::Asc);
        assert_eq!(SortDirection::parse("DESC; DROP TABLE x"), SortDirection::Asc);
        assert_eq!(SortDirection::parse(""), SortDirection::Asc);
    }

    #[test]
    fn empty_inputs_build_nothing() {
        let q = ListQuery::build(&schema(), &ListParams::default()).unwrap();
        assert_eq!(q, ListQuery::default());
    }

    #[test]
    fn search_and_sort_are_built_from_known_columns() {
        let q = ListQuery::build(&schema(), &params("last_name", "smi", "customer_id", "desc")).unwrap();
        assert_eq!(
            q.filter,
            Some(SearchSpec { column: "last_name".into(), pattern: "smi".into() })
        );
        assert_eq!(
            q.sort,
            Some(SortSpec { column: "customer_id".into(), direction: SortDirection::Desc })
        );
    }

    #[test]
    fn empty_pattern_means_no_filter() {
        let q = ListQuery::build(&schema(), &params("last_name", "", "", "")).unwrap();
        assert!(q.filter.is_none());
    }

    #[test]
    fn injected_column_names_are_rejected() {
        let err = ListQuery::build(&schema(), &params("last_name\" OR 1=1 --", "x", "", "")).unwrap_err();
        assert!(matches!(err, AppError::UnknownColumn { .. }));
        let err = ListQuery::build(&schema(), &params("", "", "password", "asc")).unwrap_err();
        assert!(matches!(err, AppError::UnknownColumn { .. }));
    }

    #[test]
    fn staff_passwords_cannot_be_searched_or_sorted() {
        let staff = CollectionSchema {
            collection: EMPLOYEES,
            columns: vec![
                ColumnInfo::untyped("employee_id", ColumnKind::Integer),
                ColumnInfo::untyped("password", ColumnKind::Text),
            ],
        };
        let err = ListQuery::build(&staff, &params("password", "$argon2", "", "")).unwrap_err();
        assert!(matches!(err, AppError::UnknownColumn { .. }));
        let err = ListQuery::build(&staff, &params("", "", "password", "desc")).unwrap_err();
        assert!(matches!(err, AppError::UnknownColumn { .. }));
    }

    #[test]
    fn search_form_converts_without_sort() {
        let form = SearchForm { table: Some("orders".into()), col: "order_id".into(), search: "4".into() };
        let p: ListParams = form.into();
        assert_eq!(p.table.as_deref(), Some("orders"));
        assert!(p.sort_column.is_empty());
    }
}
