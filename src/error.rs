//! Unified error handling for place inference.
//!
//! Only configuration problems are fatal. "No places found" is an empty
//! result, and malformed feedback is ignored rather than surfaced.

use thiserror::Error;

/// Errors produced by the place inference pipeline.
#[derive(Debug, Error)]
pub enum PlaceError {
    /// A threshold the pipeline cannot run with.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Configuration JSON that could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    /// The caller cancelled a batch run before every chunk was processed.
    #[error("run cancelled after {chunks_processed} of {chunks_total} chunks")]
    Cancelled {
        chunks_processed: usize,
        chunks_total: usize,
    },
}

impl PlaceError {
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        PlaceError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// True for errors raised before any work was done.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PlaceError::InvalidConfig { .. } | PlaceError::ConfigFormat(_)
        )
    }
}

/// A category name that is not one of the known categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown place category: {0}")]
pub struct ParseCategoryError(pub String);

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, PlaceError>;
