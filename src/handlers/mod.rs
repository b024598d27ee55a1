pub mod pages;
pub mod records;
pub mod session;

use crate::store::Record;
use serde_json::Value;

/// Submitted form pairs as a record of text values, in submission order.
/// A repeated name keeps its last value.
pub(crate) fn record_from_form(pairs: Vec<(String, String)>) -> Record {
    pairs.into_iter().map(|(name, value)| (name, Value::String(value))).collect()
}
