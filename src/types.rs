/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A stored document: an ordered JSON object keyed by field name
pub type Document = Map<String, Value>;

/// Store operations that can receive the three-variant treatment
/// Names match the option strings accepted by `overrideMethods`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "countDocuments")]
    CountDocuments,
    #[serde(rename = "find")]
    Find,
    #[serde(rename = "findOne")]
    FindOne,
    #[serde(rename = "findOneAndUpdate")]
    FindOneAndUpdate,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "updateOne")]
    UpdateOne,
    #[serde(rename = "updateMany")]
    UpdateMany,
    #[serde(rename = "aggregate")]
    Aggregate,
}

impl Method {
    /// Every operation that may be augmented, in declaration order
    pub const ALL: [Method; 9] = [
        Method::Count,
        Method::CountDocuments,
        Method::Find,
        Method::FindOne,
        Method::FindOneAndUpdate,
        Method::Update,
        Method::UpdateOne,
        Method::UpdateMany,
        Method::Aggregate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Count => "count",
            Method::CountDocuments => "countDocuments",
            Method::Find => "find",
            Method::FindOne => "findOne",
            Method::FindOneAndUpdate => "findOneAndUpdate",
            Method::Update => "update",
            Method::UpdateOne => "updateOne",
            Method::UpdateMany => "updateMany",
            Method::Aggregate => "aggregate",
        }
    }

    /// Parse an option string; unknown names yield None
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.as_str() == name)
    }

    /// Reads take a query builder and receive the predicate through it
    pub fn is_read(&self) -> bool {
        matches!(self, Method::Count | Method::CountDocuments | Method::Find | Method::FindOne)
    }

    /// Writes receive the predicate through the conditions slot
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Method::FindOneAndUpdate | Method::Update | Method::UpdateOne | Method::UpdateMany
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three access semantics generated for each augmented operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Excludes deleted documents unless `withDeleted: true` is passed
    Default,
    /// Only deleted documents (`<method>Deleted`)
    Deleted,
    /// No predicate injection (`<method>WithDeleted`)
    WithDeleted,
}

impl Variant {
    /// Method name suffix used by the original naming scheme
    pub fn suffix(&self) -> &'static str {
        match self {
            Variant::Default => "",
            Variant::Deleted => "Deleted",
            Variant::WithDeleted => "WithDeleted",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Default => f.write_str("default"),
            other => f.write_str(other.suffix()),
        }
    }
}

/// Which documents a filter or pipeline stage should let through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    ExcludeDeleted,
    OnlyDeleted,
    IncludeAll,
}

impl From<Variant> for Visibility {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Default => Visibility::ExcludeDeleted,
            Variant::Deleted => Visibility::OnlyDeleted,
            Variant::WithDeleted => Visibility::IncludeAll,
        }
    }
}
