//! # Checkout Error Types
//!
//! Error types for the backend port and the checkout session.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Checkout Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Input          │  │  Reconciliation │  │  Collaborators          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Validation     │  │  PaymentMismatch│  │  CollaboratorUnavailable│ │
//! │  │  EmptyCart      │  │  StockConflict  │  │  Rejected               │ │
//! │  │  InvalidState   │  │                 │  │  Store                  │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  Configuration  │   A failed proof upload after commit is NOT an   │
//! │  │                 │   error; it is a warning on the receipt.         │
//! │  │  InvalidConfig  │                                                   │
//! │  │  MissingDeviceId│                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use kedai_core::{CoreError, Money, StockConflict, ValidationError};
use kedai_store::StoreError;

// =============================================================================
// Backend Errors
// =============================================================================

/// Failure reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend could not be reached.
    ///
    /// ## When This Occurs
    /// - Device offline
    /// - Request timed out
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the request.
    ///
    /// ## When This Occurs
    /// - Stock decremented elsewhere between refetch and commit
    /// - Unknown transaction id for a proof upload
    #[error("Rejected by backend: {0}")]
    Rejected(String),
}

/// Result type for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

// =============================================================================
// Checkout Errors
// =============================================================================

/// Checkout error type covering every way a checkout step can fail.
///
/// After any of these the session is back in the state it was in before
/// the failing call, so the user can correct and retry.
#[derive(Debug, Error)]
pub enum CheckoutError {
    // =========================================================================
    // Input
    // =========================================================================
    /// Invalid or missing user input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Submitting an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Operation not allowed in the current session state.
    ///
    /// ## When This Occurs
    /// - Any call after the session committed or was aborted
    /// - Detaching a proof that was never attached
    #[error("Cannot {operation} while checkout is {state}")]
    InvalidState { operation: String, state: String },

    // =========================================================================
    // Reconciliation
    // =========================================================================
    /// Payment allocations do not add up to the cart total.
    #[error("Payments total {allocated} but the cart total is {expected}")]
    PaymentMismatch { expected: Money, allocated: Money },

    /// Cart quantities exceed freshly fetched stock.
    #[error("Insufficient stock: {}", format_conflicts(.0))]
    StockConflict(Vec<StockConflict>),

    // =========================================================================
    // Collaborators
    // =========================================================================
    /// The backend could not be reached.
    #[error("Backend unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// The backend refused the transaction.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// The persisted cart could not be written.
    #[error("Cart storage error: {0}")]
    Store(#[from] StoreError),

    // =========================================================================
    // Configuration
    // =========================================================================
    /// Invalid POS configuration.
    #[error("Invalid POS configuration: {0}")]
    InvalidConfig(String),

    /// No device id configured.
    #[error("Device ID not configured")]
    MissingDeviceId,

    /// Reading or writing the config file failed.
    #[error("Config file I/O failed: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// The config file is not valid TOML.
    #[error("Config file parse failed: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config could not be encoded as TOML.
    #[error("Config serialization failed: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

fn format_conflicts(conflicts: &[StockConflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl CheckoutError {
    /// Creates an InvalidState error.
    pub fn invalid_state(operation: impl Into<String>, state: impl ToString) -> Self {
        CheckoutError::InvalidState {
            operation: operation.into(),
            state: state.to_string(),
        }
    }

    /// Machine-readable code for the UI.
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutError::Validation(_) => ErrorCode::ValidationError,
            CheckoutError::EmptyCart => ErrorCode::EmptyCart,
            CheckoutError::InvalidState { .. } => ErrorCode::InvalidState,
            CheckoutError::PaymentMismatch { .. } => ErrorCode::PaymentMismatch,
            CheckoutError::StockConflict(_) => ErrorCode::InsufficientStock,
            CheckoutError::CollaboratorUnavailable(_) => ErrorCode::BackendUnavailable,
            CheckoutError::Rejected(_) => ErrorCode::Rejected,
            CheckoutError::Store(_) => ErrorCode::StorageError,
            CheckoutError::InvalidConfig(_)
            | CheckoutError::MissingDeviceId
            | CheckoutError::ConfigIo(_)
            | CheckoutError::ConfigParse(_)
            | CheckoutError::ConfigSerialize(_) => ErrorCode::ConfigError,
        }
    }

    /// Returns true if the same submission may succeed once the device is
    /// back online.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::CollaboratorUnavailable(_))
    }
}

impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::PaymentMismatch {
                expected,
                allocated,
            } => CheckoutError::PaymentMismatch {
                expected,
                allocated,
            },
            CoreError::StockConflict(conflicts) => CheckoutError::StockConflict(conflicts),
            CoreError::Validation(e) => CheckoutError::Validation(e),
        }
    }
}

impl From<BackendError> for CheckoutError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(reason) => CheckoutError::CollaboratorUnavailable(reason),
            BackendError::Rejected(reason) => CheckoutError::Rejected(reason),
        }
    }
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// UI Boundary
// =============================================================================

/// Error codes for the kiosk and POS screens.
///
/// ## Usage in Frontend
/// ```typescript
/// switch (e.code) {
///   case 'PAYMENT_MISMATCH':
///     highlightPaymentRows();
///     break;
///   case 'INSUFFICIENT_STOCK':
///     showStockDialog(e.message);
///     break;
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    EmptyCart,
    InvalidState,
    PaymentMismatch,
    InsufficientStock,
    BackendUnavailable,
    Rejected,
    StorageError,
    ConfigError,
}

/// Serialized error shown by the UI.
///
/// ```json
/// { "code": "PAYMENT_MISMATCH", "message": "Payments total Rp 44.999 but the cart total is Rp 45.000" }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&CheckoutError> for ErrorResponse {
    fn from(err: &CheckoutError) -> Self {
        ErrorResponse {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kedai_core::{ProductId, SaleUnitRef};

    #[test]
    fn test_core_error_mapping() {
        let err: CheckoutError = CoreError::PaymentMismatch {
            expected: Money::from_units(45_000),
            allocated: Money::from_units(44_999),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::PaymentMismatch);

        let err: CheckoutError = CoreError::Validation(ValidationError::Required {
            field: "payment method".into(),
        })
        .into();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_backend_error_mapping() {
        let err: CheckoutError = BackendError::Unavailable("offline".into()).into();
        assert!(matches!(err, CheckoutError::CollaboratorUnavailable(_)));
        assert!(err.is_retryable());

        let err: CheckoutError = BackendError::Rejected("stock".into()).into();
        assert_eq!(err.code(), ErrorCode::Rejected);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_response_serialization() {
        let err = CheckoutError::StockConflict(vec![StockConflict {
            unit: SaleUnitRef::Product(ProductId(1)),
            name: "Nasi".into(),
            requested: 5,
            available: 3,
        }]);
        let json = serde_json::to_value(ErrorResponse::from(&err)).unwrap();

        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
        assert!(json["message"].as_str().unwrap().contains("Nasi"));
    }
}
