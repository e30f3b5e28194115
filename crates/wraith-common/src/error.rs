//! Error types for Project Wraith.
//!
//! Only wiring faults surface here. Expected gameplay outcomes (not enough
//! stamina, a duplicate hit, a starved ability) are plain return values.

use thiserror::Error;

/// Top-level error type for Wraith operations.
#[derive(Debug, Error)]
pub enum WraithError {
    /// A mandatory collaborator was not supplied at construction time.
    #[error("{component} requires {dependency}, but none was supplied")]
    MissingDependency {
        /// Component being constructed
        component: &'static str,
        /// Collaborator that was missing
        dependency: &'static str,
    },

    /// A numeric parameter was outside its valid domain.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: &'static str,
        /// Human-readable reason
        reason: String,
    },

    /// Configuration could not be loaded or validated.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WraithError {
    /// Shorthand for [`WraithError::MissingDependency`].
    #[must_use]
    pub const fn missing(component: &'static str, dependency: &'static str) -> Self {
        Self::MissingDependency {
            component,
            dependency,
        }
    }

    /// Shorthand for [`WraithError::InvalidValue`].
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for Wraith operations.
pub type WraithResult<T> = Result<T, WraithError>;
