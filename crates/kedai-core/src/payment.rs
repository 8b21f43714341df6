//! # Payments
//!
//! Payment allocations and split-tender reconciliation.
//!
//! ## Split Tender
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart total: Rp 45.000                                                  │
//! │                                                                         │
//! │  ┌───────────────────────┬───────────────┬────────────┐                │
//! │  │ Category              │ Method        │ Amount     │                │
//! │  ├───────────────────────┼───────────────┼────────────┤                │
//! │  │ Offline               │ Tunai         │ Rp 20.000  │                │
//! │  │ Online / QRIS         │ QRIS          │ Rp 25.000  │                │
//! │  └───────────────────────┴───────────────┴────────────┘                │
//! │                                           Σ = Rp 45.000  ✅ exact       │
//! │                                                                         │
//! │  Σ must EQUAL the total. Over- and under-payment are both rejected.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Categories
// =============================================================================

/// Top-level payment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentCategory {
    /// Cash, card on terminal, bank transfer at the counter.
    Offline,
    /// E-wallets and QRIS.
    Online,
    /// Orders paid through a food delivery platform.
    FoodDelivery,
}

impl fmt::Display for PaymentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentCategory::Offline => write!(f, "offline"),
            PaymentCategory::Online => write!(f, "online"),
            PaymentCategory::FoodDelivery => write!(f, "food_delivery"),
        }
    }
}

/// Finer-grained payment channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentSubCategory {
    EWallet,
    Qris,
    ShopeeFood,
    GoFood,
    GrabFood,
    MaximFood,
    Tiktok,
}

impl PaymentSubCategory {
    /// The category this channel belongs to.
    pub fn category(&self) -> PaymentCategory {
        match self {
            PaymentSubCategory::EWallet | PaymentSubCategory::Qris => PaymentCategory::Online,
            _ => PaymentCategory::FoodDelivery,
        }
    }
}

// =============================================================================
// Allocation
// =============================================================================

/// A portion of the cart total paid through one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentAllocation {
    pub category: PaymentCategory,
    pub sub_category: Option<PaymentSubCategory>,

    /// Display name (e.g. "Tunai", "QRIS Statis").
    pub method_name: String,

    pub amount: Money,
}

impl PaymentAllocation {
    /// Creates an allocation with a zero amount, to be filled in later.
    pub fn new(
        category: PaymentCategory,
        sub_category: Option<PaymentSubCategory>,
        method_name: impl Into<String>,
    ) -> Self {
        PaymentAllocation {
            category,
            sub_category,
            method_name: method_name.into(),
            amount: Money::zero(),
        }
    }

    /// Cash at the counter.
    pub fn cash() -> Self {
        Self::new(PaymentCategory::Offline, None, "Tunai")
    }

    /// Debit or credit card on an external terminal.
    pub fn card() -> Self {
        Self::new(PaymentCategory::Offline, None, "Kartu Debit/Kredit")
    }

    /// Bank transfer.
    pub fn bank_transfer() -> Self {
        Self::new(PaymentCategory::Offline, None, "Transfer Bank")
    }

    /// An online or food-delivery channel; the category follows the channel.
    pub fn channel(sub_category: PaymentSubCategory, method_name: impl Into<String>) -> Self {
        Self::new(sub_category.category(), Some(sub_category), method_name)
    }

    /// Returns the same allocation carrying `amount`.
    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Sums the allocated amounts.
pub fn allocated_total(allocations: &[PaymentAllocation]) -> Money {
    allocations.iter().map(|a| a.amount).sum()
}

/// Checks that a payment split covers the total exactly.
///
/// ## Rules
/// - At least one allocation
/// - No negative amounts
/// - Σ amounts == total (integer equality, no tolerance)
///
/// ## Example
/// ```rust
/// use kedai_core::money::Money;
/// use kedai_core::payment::{reconcile, PaymentAllocation};
///
/// let total = Money::from_units(45_000);
/// let split = vec![
///     PaymentAllocation::cash().with_amount(Money::from_units(20_000)),
///     PaymentAllocation::card().with_amount(Money::from_units(25_000)),
/// ];
/// assert!(reconcile(&split, total).is_ok());
///
/// let short = vec![PaymentAllocation::cash().with_amount(Money::from_units(44_999))];
/// assert!(reconcile(&short, total).is_err());
/// ```
pub fn reconcile(allocations: &[PaymentAllocation], total: Money) -> CoreResult<()> {
    if allocations.is_empty() {
        return Err(ValidationError::Required {
            field: "payment method".to_string(),
        }
        .into());
    }

    if allocations.iter().any(|a| a.amount.is_negative()) {
        return Err(ValidationError::MustNotBeNegative {
            field: "payment amount".to_string(),
        }
        .into());
    }

    let allocated = allocated_total(allocations);
    if allocated != total {
        return Err(CoreError::PaymentMismatch {
            expected: total,
            allocated,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_split_passes() {
        let total = Money::from_units(75_000);
        let split = vec![
            PaymentAllocation::cash().with_amount(Money::from_units(50_000)),
            PaymentAllocation::channel(PaymentSubCategory::Qris, "QRIS")
                .with_amount(Money::from_units(25_000)),
        ];
        assert_eq!(reconcile(&split, total), Ok(()));
    }

    #[test]
    fn test_off_by_one_is_mismatch() {
        let total = Money::from_units(75_000);
        let under = vec![PaymentAllocation::cash().with_amount(Money::from_units(74_999))];
        let over = vec![PaymentAllocation::cash().with_amount(Money::from_units(75_001))];

        assert_eq!(
            reconcile(&under, total),
            Err(CoreError::PaymentMismatch {
                expected: total,
                allocated: Money::from_units(74_999),
            })
        );
        assert!(matches!(
            reconcile(&over, total),
            Err(CoreError::PaymentMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_split_requires_method() {
        let err = reconcile(&[], Money::from_units(1)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_negative_amount_rejected_even_if_sum_matches() {
        let split = vec![
            PaymentAllocation::cash().with_amount(Money::from_units(20_000)),
            PaymentAllocation::card().with_amount(Money::from_units(-5_000)),
        ];
        assert!(matches!(
            reconcile(&split, Money::from_units(15_000)),
            Err(CoreError::Validation(ValidationError::MustNotBeNegative { .. }))
        ));
    }

    #[test]
    fn test_channel_category_follows_sub_category() {
        let gofood = PaymentAllocation::channel(PaymentSubCategory::GoFood, "GoFood");
        assert_eq!(gofood.category, PaymentCategory::FoodDelivery);

        let ewallet = PaymentAllocation::channel(PaymentSubCategory::EWallet, "eWallet");
        assert_eq!(ewallet.category, PaymentCategory::Online);
    }
}
