use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Ne,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,

    #[serde(rename = "$in")] In,
    #[serde(rename = "$nin")] NIn,

    #[serde(rename = "$exists")] Exists,
    #[serde(rename = "$not")] Not,
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub field: String,
    pub operator: FilterOp,
    pub data: Value,
}

/// Options accepted alongside a query or update
/// Unrecognized keys are kept in `extra` and handed to the store untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(default, skip_serializing_if = "is_false")]
    pub with_deleted: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub multi: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub upsert: bool,
    #[serde(rename = "new", default, skip_serializing_if = "is_false")]
    pub return_new: bool,
    #[serde(flatten)]
    pub extra: Document,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that bypass the default exclusion predicate
    pub fn with_deleted() -> Self {
        Self { with_deleted: true, ..Default::default() }
    }

    pub fn multi() -> Self {
        Self { multi: true, ..Default::default() }
    }

    pub fn from_document(document: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(document))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub field: String,
    pub sort: SortDirection,
}
