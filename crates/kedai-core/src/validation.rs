//! # Validation Module
//!
//! Input validation for the checkout screens.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend                                                     │
//! │  ├── Disables buttons when stock is exhausted                          │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + cart/checkout re-checks                        │
//! │  ├── Amount text, method names                                         │
//! │  └── Proof attachment type and size                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Authoritative stock decrement                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kedai_core::validation::{validate_amount_text, validate_proof};
//! use kedai_core::MAX_PROOF_BYTES;
//!
//! assert_eq!(validate_amount_text("25000").unwrap().units(), 25_000);
//! assert!(validate_proof("image/png", 120_000, MAX_PROOF_BYTES).is_ok());
//! assert!(validate_proof("application/pdf", 120_000, MAX_PROOF_BYTES).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted payment method display name.
const MAX_METHOD_NAME_LEN: usize = 50;

// =============================================================================
// Payment Input
// =============================================================================

/// Parses and validates an amount typed into a payment row.
///
/// ## Rules
/// - Decimal text, rounded to whole currency units
/// - Must not be negative
pub fn validate_amount_text(text: &str) -> ValidationResult<Money> {
    let amount = Money::parse_amount(text)?;

    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "payment amount".to_string(),
        });
    }

    Ok(amount)
}

/// Validates a payment method display name.
pub fn validate_method_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "payment method name".to_string(),
        });
    }

    if name.chars().count() > MAX_METHOD_NAME_LEN {
        return Err(ValidationError::OutOfRange {
            field: "payment method name length".to_string(),
            min: 1,
            max: MAX_METHOD_NAME_LEN as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Proof Attachment
// =============================================================================

/// Validates a payment proof before it is attached.
///
/// ## Rules
/// - MIME type must be `image/*`
/// - Size must not exceed `max_bytes` (5 MiB by default)
///
/// Oversized or wrong-type files are rejected outright, never truncated.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Kiosk: Upload transfer receipt                                         │
/// │                                                                         │
/// │  Customer picks file                                                    │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_proof(mime, size) ← THIS FUNCTION                            │
/// │       │                                                                 │
/// │       ├── not image/* ? → "must be an image (JPG, PNG)"                │
/// │       │                                                                 │
/// │       ├── > 5 MiB ? → "maximum is 5242880 bytes"                       │
/// │       │                                                                 │
/// │       └── OK → attach to checkout                                      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_proof(mime_type: &str, size: u64, max_bytes: u64) -> ValidationResult<()> {
    let is_image = mime_type
        .trim()
        .to_ascii_lowercase()
        .strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty());

    if !is_image {
        return Err(ValidationError::UnsupportedProofType {
            mime_type: mime_type.to_string(),
        });
    }

    if size > max_bytes {
        return Err(ValidationError::ProofTooLarge {
            size,
            max: max_bytes,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
