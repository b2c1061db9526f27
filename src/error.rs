// Soft delete error types
use thiserror::Error;

use crate::database::store::StoreError;
use crate::filter::error::FilterError;
use crate::observer::error::ObserverError;
use crate::types::{Method, Variant};

/// Errors surfaced by the soft delete layer
///
/// Store failures are wrapped without reclassification so callers can match
/// on the original `StoreError`.
#[derive(Debug, Error)]
pub enum SoftDeleteError {
    /// Caller misuse detected before any store interaction
    #[error("Invalid invocation: {0}")]
    Invocation(String),

    /// The requested variant was not generated for this operation
    #[error("{method}{} is not available: '{method}' is not in overrideMethods", .variant.suffix())]
    VariantUnavailable { method: Method, variant: Variant },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Observer(#[from] ObserverError),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SoftDeleteError {
    pub fn invocation(message: impl Into<String>) -> Self {
        SoftDeleteError::Invocation(message.into())
    }

    /// The underlying store error, if this is one
    pub fn as_store_error(&self) -> Option<&StoreError> {
        match self {
            SoftDeleteError::Store(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_invocation(&self) -> bool {
        matches!(self, SoftDeleteError::Invocation(_))
    }
}
