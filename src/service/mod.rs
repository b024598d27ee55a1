//! Record repository and the search/sort inputs it accepts.

mod query;
mod repository;
pub use query::{ListParams, ListQuery, SearchForm, SearchSpec, SortDirection, SortSpec};
pub use repository::{coerce_value, RecordRepository};
