//! Error types for Stash.
//!
//! Every failure in the cache is scoped to a single key: a fetch that
//! fails leaves its own entry in the `Error` state and never touches any
//! other entry. Errors are values that can be shared between every
//! consumer waiting on the same fetch, which is why [`StashError`] is
//! `Clone` and carries no boxed sources.
//!
//! # Example
//!
//! ```
//! use stash_core::{Result, StashError};
//!
//! fn lookup(id: &str) -> Result<String> {
//!     if id.trim().is_empty() {
//!         return Err(StashError::validation("meals", "id", "cannot be empty"));
//!     }
//!     Ok(format!("meal {}", id))
//! }
//!
//! assert!(lookup("52874").is_ok());
//! assert!(lookup(" ").unwrap_err().is_validation_error());
//! ```

use thiserror::Error;

/// Main error type for Stash operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StashError {
    /// The upstream transport failed (network error or non-2xx status).
    #[error("transport error for '{resource}': {message}")]
    Transport {
        /// Resource whose transport failed
        resource: String,
        /// Description of the failure
        message: String,
        /// HTTP status code, when the failure carried one
        status: Option<u16>,
    },

    /// The requested item does not exist upstream.
    #[error("{resource} with id '{id}' not found")]
    NotFound {
        /// Resource that was queried
        resource: String,
        /// Identifier that was requested
        id: String,
    },

    /// A fetched or submitted payload is malformed or incomplete.
    #[error("validation failed for {resource}.{field}: {message}")]
    Validation {
        /// Resource the payload belongs to
        resource: String,
        /// Offending field
        field: String,
        /// Why the value was rejected
        message: String,
    },

    /// An operation required a cached value that is not present.
    #[error("no cached value for key '{key}'")]
    NotCached {
        /// Rendered key tuple
        key: String,
    },

    /// The cached value under a key is of a different type than requested.
    #[error("cached value for key '{key}' has an unexpected type")]
    TypeMismatch {
        /// Rendered key tuple
        key: String,
    },

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StashError {
    /// Creates a transport error without a status code.
    pub fn transport(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            resource: resource.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Creates a transport error for a non-2xx HTTP response.
    pub fn http_status(resource: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Self::Transport {
            resource: resource.into(),
            message: format!("{} {}", status, reason.into()),
            status: Some(status),
        }
    }

    /// Creates a NotFound error.
    pub fn not_found(resource: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error.
    pub fn validation(
        resource: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            resource: resource.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a NotCached error.
    pub fn not_cached(key: impl ToString) -> Self {
        Self::NotCached {
            key: key.to_string(),
        }
    }

    /// Creates a TypeMismatch error.
    pub fn type_mismatch(key: impl ToString) -> Self {
        Self::TypeMismatch {
            key: key.to_string(),
        }
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if the requested item was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true if no cached value was available.
    pub fn is_not_cached(&self) -> bool {
        matches!(self, Self::NotCached { .. })
    }

    /// Returns true if this is a transport error.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns true if a retry might succeed.
    ///
    /// Client errors (4xx) are permanent; network failures and 5xx are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { status, .. } => !matches!(status, Some(400..=499)),
            _ => false,
        }
    }
}

/// Type alias for Results with StashError.
pub type Result<T> = std::result::Result<T, StashError>;
