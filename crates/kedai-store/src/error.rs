//! # Store Error Types
//!
//! Error types for cart persistence.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  std::io::Error / serde_json::Error                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds the slot key and path                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CheckoutError::Store (kedai-checkout) ← Carries an error code         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A corrupt slot is NOT an error: `CartService::open` logs it and starts
//! with an empty cart.

use std::path::PathBuf;

use thiserror::Error;

/// Cart persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the slot failed.
    ///
    /// ## When This Occurs
    /// - Data directory not writable
    /// - Disk full
    #[error("Cart storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cart could not be encoded.
    #[error("Cart serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No platform data directory could be determined.
    ///
    /// ## When This Occurs
    /// - `$HOME` unset on Linux
    /// - Sandboxed environment without a home directory
    #[error("No data directory available for cart storage")]
    NoDataDir,

    /// The slot key cannot be used as a file name.
    #[error("Invalid cart storage key: '{0}'")]
    InvalidKey(String),
}

impl StoreError {
    /// Wraps an I/O error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
