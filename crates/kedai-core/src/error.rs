//! # Error Types
//!
//! Domain-specific error types for kedai-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kedai-core errors (this file)                                         │
//! │  ├── CoreError        - Payment mismatch, stock conflict               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kedai-store errors (separate crate)                                   │
//! │  └── StoreError       - Cart slot read/write failures                  │
//! │                                                                         │
//! │  kedai-checkout errors (separate crate)                                │
//! │  ├── BackendError     - Collaborator unavailable / rejected            │
//! │  └── CheckoutError    - What the UI boundary sees                      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → UI                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! Exhausted stock during cart mutation is an expected condition. The cart
//! reports it as a [`CartOutcome::NoOp`](crate::cart::CartOutcome), never as
//! an `Err`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;
use crate::types::SaleUnitRef;

// =============================================================================
// Stock Conflict
// =============================================================================

/// One cart line whose quantity exceeds freshly computed stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockConflict {
    pub unit: SaleUnitRef,
    pub name: String,
    pub requested: u64,
    pub available: u64,
}

impl std::fmt::Display for StockConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): requested {}, available {}",
            self.name, self.unit, self.requested, self.available
        )
    }
}

fn join_conflicts(conflicts: &[StockConflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Payment allocations do not add up to the cart total.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart total: Rp 45.000
    /// Cash Rp 20.000 + QRIS Rp 24.999 = Rp 44.999
    ///      │
    ///      ▼
    /// PaymentMismatch { expected: 45000, allocated: 44999 }
    ///      │
    ///      ▼
    /// UI shows: "Payments must equal Rp 45.000"
    /// ```
    #[error("Payments total {allocated} but the cart total is {expected}")]
    PaymentMismatch { expected: Money, allocated: Money },

    /// One or more lines exceed the stock available right now.
    #[error("Insufficient stock: {}", join_conflicts(.0))]
    StockConflict(Vec<StockConflict>),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements. The
/// offending action is rejected and the user corrects the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field or selection is missing.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., unparseable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Payment proof is not an image.
    #[error("Payment proof must be an image (JPG, PNG), got '{mime_type}'")]
    UnsupportedProofType { mime_type: String },

    /// Payment proof exceeds the size limit.
    #[error("Payment proof is {size} bytes, maximum is {max} bytes")]
    ProofTooLarge { size: u64, max: u64 },

    /// Operation is not allowed in the current context.
    #[error("{field} is not allowed: {reason}")]
    NotAllowed { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageId;

    #[test]
    fn test_error_messages() {
        let err = CoreError::PaymentMismatch {
            expected: Money::from_units(45_000),
            allocated: Money::from_units(44_999),
        };
        assert_eq!(
            err.to_string(),
            "Payments total Rp 44.999 but the cart total is Rp 45.000"
        );
    }

    #[test]
    fn test_stock_conflict_lists_every_line() {
        let err = CoreError::StockConflict(vec![StockConflict {
            unit: SaleUnitRef::Package(PackageId(2)),
            name: "Paket Hemat".to_string(),
            requested: 5,
            available: 3,
        }]);
        assert_eq!(
            err.to_string(),
            "Insufficient stock: Paket Hemat (pkg-2): requested 5, available 3"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "fulfillment type".to_string(),
        };
        assert_eq!(err.to_string(), "fulfillment type is required");

        let err = ValidationError::ProofTooLarge {
            size: 6_000_000,
            max: 5_242_880,
        };
        assert_eq!(
            err.to_string(),
            "Payment proof is 6000000 bytes, maximum is 5242880 bytes"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "payment method".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
