//! Error types for tiercache.
//!
//! The cache is an optimization, never the source of truth, so the error
//! surface a caller can observe is deliberately tiny: input that is
//! malformed is rejected synchronously, before any tier is touched.
//! Everything that goes wrong behind the cache (the durable tier being
//! down, slow, or returning garbage) is absorbed inside the cache manager.
//!
//! # Example
//!
//! ```
//! use tiercache_core::{CacheError, Result};
//!
//! fn checked_key(key: &str) -> Result<&str> {
//!     if key.is_empty() {
//!         return Err(CacheError::validation("key", "must not be empty"));
//!     }
//!     Ok(key)
//! }
//!
//! assert!(checked_key("").unwrap_err().is_validation_error());
//! ```

use thiserror::Error;

/// Error type for caller-visible cache operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Input rejected before either tier was touched.
    #[error("Validation error for field '{field}': {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },
}

impl CacheError {
    /// Creates a Validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::Validation { field, .. } => field,
        }
    }
}

/// Type alias for Results with CacheError.
pub type Result<T> = std::result::Result<T, CacheError>;
