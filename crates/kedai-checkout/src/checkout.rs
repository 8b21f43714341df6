//! # Checkout Session
//!
//! Reconciles a cart with payment and fresh stock, then commits it.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌───────────┐  choose method /    ┌─────────────────────┐            │
//! │   │ Selecting │  add allocation ───►│ PaymentMethodChosen │            │
//! │   └─────┬─────┘                     └──────┬───────▲──────┘            │
//! │         │                     attach_proof │       │ detach_proof      │
//! │         │                     (kiosk only) ▼       │                   │
//! │         │                          ┌───────────────┴─┐                 │
//! │         │                          │  ProofAttached  │                 │
//! │         │                          └────────┬────────┘                 │
//! │         │                                   │ submit()                 │
//! │         │                                   ▼                          │
//! │         │                          ┌─────────────────┐   failure       │
//! │         │                          │   Submitting    │──────────────►  │
//! │         │                          └────────┬────────┘  back to the    │
//! │         │ abort()                           │ accepted  previous state │
//! │         ▼                                   ▼                          │
//! │   ┌───────────┐                    ┌─────────────────┐                 │
//! │   │  Aborted  │                    │    Committed    │                 │
//! │   └───────────┘                    └─────────────────┘                 │
//! │                                                                         │
//! │  Terminal states accept no further operations.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Flows
//! - **Kiosk**: customer-facing. One online method (QRIS or bank transfer),
//!   paid in full, optionally with a proof image.
//! - **Counter**: staffed register. Any number of allocations whose amounts
//!   must add up to the cart total exactly.
//!
//! ## Submission
//! 1. Fulfillment type and payment method are present, cart is non-empty
//! 2. Payments reconcile with the recomputed cart total
//! 3. A fresh catalog is fetched and EVERY line is re-checked against it
//! 4. The transaction is committed, the cart cleared
//! 5. An attached proof is uploaded; failure there is only a warning

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use kedai_core::payment::{allocated_total, reconcile};
use kedai_core::validation::{validate_amount_text, validate_method_name, validate_proof};
use kedai_core::{
    Cart, FulfillmentType, InventorySnapshot, LocationId, Money, PaymentAllocation,
    PaymentCategory, PaymentSubCategory, ProofAttachment, TransactionId,
    TransactionItem, TransactionRequest, ValidationError, MAX_PROOF_BYTES,
};
use kedai_store::{CartService, CartStore};

use crate::backend::Backend;
use crate::error::{CheckoutError, CheckoutResult};

// =============================================================================
// Flow & State
// =============================================================================

/// Which screen is checking out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutFlow {
    /// Customer self-order kiosk.
    #[default]
    #[serde(alias = "self_order")]
    Kiosk,
    /// Cashier at the register.
    #[serde(alias = "pos", alias = "cashier")]
    Counter,
}

impl fmt::Display for CheckoutFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutFlow::Kiosk => write!(f, "kiosk"),
            CheckoutFlow::Counter => write!(f, "counter"),
        }
    }
}

impl FromStr for CheckoutFlow {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kiosk" | "self_order" => Ok(CheckoutFlow::Kiosk),
            "counter" | "pos" | "cashier" => Ok(CheckoutFlow::Counter),
            other => Err(CheckoutError::InvalidConfig(format!(
                "Unknown checkout flow: '{}'. Valid options: kiosk, counter",
                other
            ))),
        }
    }
}

/// Where a checkout session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    Selecting,
    PaymentMethodChosen,
    ProofAttached,
    Submitting,
    Committed,
    Aborted,
}

impl CheckoutState {
    /// Returns true once the session can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Committed | CheckoutState::Aborted)
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutState::Selecting => "selecting",
            CheckoutState::PaymentMethodChosen => "payment method chosen",
            CheckoutState::ProofAttached => "proof attached",
            CheckoutState::Submitting => "submitting",
            CheckoutState::Committed => "committed",
            CheckoutState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Payment methods offered on the kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KioskPaymentMethod {
    /// Static QRIS code printed at the outlet.
    Qris,
    /// Transfer to the outlet's bank account.
    BankTransfer,
}

impl KioskPaymentMethod {
    /// The allocation this method submits, before its amount is known.
    ///
    /// Both are online payments; only QRIS carries a sub-category.
    pub fn allocation(&self) -> PaymentAllocation {
        match self {
            KioskPaymentMethod::Qris => PaymentAllocation::new(
                PaymentCategory::Online,
                Some(PaymentSubCategory::Qris),
                "QRIS Statis",
            ),
            KioskPaymentMethod::BankTransfer => {
                PaymentAllocation::new(PaymentCategory::Online, None, "Transfer Bank")
            }
        }
    }
}

impl fmt::Display for KioskPaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KioskPaymentMethod::Qris => write!(f, "qris"),
            KioskPaymentMethod::BankTransfer => write!(f, "bank_transfer"),
        }
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// Something that went wrong after the transaction was already committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CheckoutWarning {
    /// The payment proof could not be uploaded. Staff can match the payment
    /// manually using the transaction id.
    #[serde(rename_all = "camelCase")]
    ProofUploadFailed {
        transaction_id: TransactionId,
        reason: String,
    },
    /// The committed cart could not be cleared from local storage.
    CartNotCleared { reason: String },
}

/// Result of a committed checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub transaction_id: TransactionId,
    pub location_id: LocationId,
    pub flow: CheckoutFlow,
    pub fulfillment: FulfillmentType,
    pub items: Vec<TransactionItem>,
    pub payments: Vec<PaymentAllocation>,
    pub total: Money,
    pub warnings: Vec<CheckoutWarning>,
    pub committed_at: DateTime<Utc>,
}

impl CheckoutReceipt {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

// =============================================================================
// Session
// =============================================================================

/// One checkout attempt over a cart.
///
/// The session borrows the cart mutably for its whole lifetime, so the cart
/// cannot change underneath a submission.
pub struct CheckoutSession<'a, S: CartStore, B: Backend + ?Sized> {
    cart: &'a mut CartService<S>,
    backend: &'a B,
    flow: CheckoutFlow,
    location_id: LocationId,
    max_proof_bytes: u64,
    state: CheckoutState,
    fulfillment: Option<FulfillmentType>,
    kiosk_method: Option<KioskPaymentMethod>,
    allocations: Vec<PaymentAllocation>,
    proof: Option<ProofAttachment>,
}

impl<'a, S: CartStore, B: Backend + ?Sized> CheckoutSession<'a, S, B> {
    /// Starts a checkout at `location_id`.
    ///
    /// Counter sessions start with takeaway selected.
    pub fn new(
        flow: CheckoutFlow,
        location_id: LocationId,
        cart: &'a mut CartService<S>,
        backend: &'a B,
    ) -> Self {
        let fulfillment = match flow {
            CheckoutFlow::Counter => Some(FulfillmentType::Takeaway),
            CheckoutFlow::Kiosk => None,
        };
        debug!(%flow, location = %location_id, lines = cart.cart().item_count(), "Checkout started");

        CheckoutSession {
            cart,
            backend,
            flow,
            location_id,
            max_proof_bytes: MAX_PROOF_BYTES,
            state: CheckoutState::Selecting,
            fulfillment,
            kiosk_method: None,
            allocations: Vec::new(),
            proof: None,
        }
    }

    /// Lowers the proof size limit. It can never exceed [`MAX_PROOF_BYTES`].
    pub fn with_max_proof_bytes(mut self, max_bytes: u64) -> Self {
        self.max_proof_bytes = max_bytes.min(MAX_PROOF_BYTES);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn flow(&self) -> CheckoutFlow {
        self.flow
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn fulfillment(&self) -> Option<FulfillmentType> {
        self.fulfillment
    }

    pub fn kiosk_method(&self) -> Option<KioskPaymentMethod> {
        self.kiosk_method
    }

    pub fn allocations(&self) -> &[PaymentAllocation] {
        &self.allocations
    }

    pub fn proof(&self) -> Option<&ProofAttachment> {
        self.proof.as_ref()
    }

    pub fn cart(&self) -> &Cart {
        self.cart.cart()
    }

    /// Cart total, recomputed.
    pub fn total(&self) -> Money {
        self.cart.total()
    }

    /// Amount still to allocate (negative when over-allocated).
    pub fn remaining(&self) -> Money {
        self.total() - allocated_total(&self.allocations)
    }

    // =========================================================================
    // Guards
    // =========================================================================

    fn ensure_open(&self, operation: &str) -> CheckoutResult<()> {
        match self.state {
            CheckoutState::Submitting | CheckoutState::Committed | CheckoutState::Aborted => {
                Err(CheckoutError::invalid_state(operation, self.state))
            }
            _ => Ok(()),
        }
    }

    fn ensure_flow(&self, flow: CheckoutFlow, field: &str) -> CheckoutResult<()> {
        if self.flow != flow {
            return Err(ValidationError::NotAllowed {
                field: field.to_string(),
                reason: format!("not available in the {} flow", self.flow),
            }
            .into());
        }
        Ok(())
    }

    fn require_fulfillment(&self) -> CheckoutResult<FulfillmentType> {
        self.fulfillment.ok_or_else(|| {
            ValidationError::Required {
                field: "fulfillment type".to_string(),
            }
            .into()
        })
    }

    fn payment_row_out_of_range(&self) -> CheckoutError {
        ValidationError::OutOfRange {
            field: "payment row".to_string(),
            min: 0,
            max: self.allocations.len() as i64 - 1,
        }
        .into()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Chooses takeaway or delivery.
    pub fn set_fulfillment(&mut self, fulfillment: FulfillmentType) -> CheckoutResult<()> {
        self.ensure_open("set the fulfillment type")?;
        self.fulfillment = Some(fulfillment);
        debug!(%fulfillment, "Fulfillment selected");
        Ok(())
    }

    /// Picks the kiosk payment method. The amount is the cart total at submit.
    pub fn choose_kiosk_method(&mut self, method: KioskPaymentMethod) -> CheckoutResult<()> {
        self.ensure_open("choose a payment method")?;
        self.ensure_flow(CheckoutFlow::Kiosk, "payment method")?;
        self.require_fulfillment()?;

        self.kiosk_method = Some(method);
        self.allocations = vec![method.allocation()];
        if self.proof.is_none() {
            self.state = CheckoutState::PaymentMethodChosen;
        }

        debug!(%method, state = %self.state, "Kiosk payment method chosen");
        Ok(())
    }

    /// Adds a payment row at the counter. Returns its index.
    pub fn add_allocation(&mut self, allocation: PaymentAllocation) -> CheckoutResult<usize> {
        self.ensure_open("add a payment")?;
        self.ensure_flow(CheckoutFlow::Counter, "split payment")?;
        self.require_fulfillment()?;
        validate_method_name(&allocation.method_name)?;
        if allocation.amount.is_negative() {
            return Err(ValidationError::MustNotBeNegative {
                field: "payment amount".to_string(),
            }
            .into());
        }

        debug!(method = %allocation.method_name, category = %allocation.category, amount = %allocation.amount, "Payment row added");
        self.allocations.push(allocation);
        self.state = CheckoutState::PaymentMethodChosen;
        Ok(self.allocations.len() - 1)
    }

    /// Sets a payment row's amount from the text typed by the cashier.
    pub fn set_allocation_amount(&mut self, index: usize, text: &str) -> CheckoutResult<Money> {
        self.ensure_open("change a payment amount")?;
        self.ensure_flow(CheckoutFlow::Counter, "split payment")?;
        let amount = validate_amount_text(text)?;

        if index >= self.allocations.len() {
            return Err(self.payment_row_out_of_range());
        }
        self.allocations[index].amount = amount;

        debug!(index, %amount, remaining = %self.remaining(), "Payment amount set");
        Ok(amount)
    }

    /// Removes a payment row.
    pub fn remove_allocation(&mut self, index: usize) -> CheckoutResult<PaymentAllocation> {
        self.ensure_open("remove a payment")?;
        self.ensure_flow(CheckoutFlow::Counter, "split payment")?;

        if index >= self.allocations.len() {
            return Err(self.payment_row_out_of_range());
        }
        let removed = self.allocations.remove(index);
        if self.allocations.is_empty() {
            self.state = CheckoutState::Selecting;
        }

        debug!(index, method = %removed.method_name, "Payment row removed");
        Ok(removed)
    }

    // =========================================================================
    // Proof
    // =========================================================================

    /// Attaches a payment proof image.
    ///
    /// Rejected outright if it is not an image or is too large.
    pub fn attach_proof(&mut self, proof: ProofAttachment) -> CheckoutResult<()> {
        self.ensure_open("attach a payment proof")?;
        self.ensure_flow(CheckoutFlow::Kiosk, "payment proof")?;

        let Some(allocation) = self.allocations.first() else {
            return Err(ValidationError::Required {
                field: "payment method".to_string(),
            }
            .into());
        };
        if allocation.category != PaymentCategory::Online {
            return Err(ValidationError::NotAllowed {
                field: "payment proof".to_string(),
                reason: format!("{} payments take no proof", allocation.category),
            }
            .into());
        }

        validate_proof(&proof.mime_type, proof.size(), self.max_proof_bytes)?;

        debug!(file = %proof.file_name, size = proof.size(), "Payment proof attached");
        self.proof = Some(proof);
        self.state = CheckoutState::ProofAttached;
        Ok(())
    }

    /// Removes the attached proof.
    pub fn detach_proof(&mut self) -> CheckoutResult<ProofAttachment> {
        self.ensure_open("detach a payment proof")?;
        let proof = self
            .proof
            .take()
            .ok_or_else(|| CheckoutError::invalid_state("detach a payment proof", self.state))?;

        self.state = CheckoutState::PaymentMethodChosen;
        debug!(file = %proof.file_name, "Payment proof detached");
        Ok(proof)
    }

    // =========================================================================
    // Terminal Transitions
    // =========================================================================

    /// Abandons the checkout. The cart is left as it is.
    pub fn abort(&mut self) -> CheckoutResult<()> {
        self.ensure_open("abort")?;
        self.state = CheckoutState::Aborted;
        debug!("Checkout aborted");
        Ok(())
    }

    /// Re-validates and commits the checkout.
    ///
    /// ## Errors
    /// - `Validation`: no fulfillment type or no payment method
    /// - `EmptyCart`
    /// - `PaymentMismatch`: counter split does not equal the total
    /// - `StockConflict`: every line the fresh stock cannot cover
    /// - `CollaboratorUnavailable` / `Rejected`: backend failures
    ///
    /// On any error nothing was committed, the cart is untouched and the
    /// session is back in its previous state.
    pub async fn submit(&mut self) -> CheckoutResult<CheckoutReceipt> {
        self.ensure_open("submit")?;
        let fulfillment = self.require_fulfillment()?;
        if self.allocations.is_empty() {
            return Err(ValidationError::Required {
                field: "payment method".to_string(),
            }
            .into());
        }
        if self.cart.cart().is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let total = self.cart.total();
        let payments = match self.flow {
            CheckoutFlow::Kiosk => self
                .allocations
                .iter()
                .take(1)
                .map(|a| a.clone().with_amount(total))
                .collect(),
            CheckoutFlow::Counter => {
                reconcile(&self.allocations, total)?;
                self.allocations.clone()
            }
        };

        let resume = self.state;
        self.state = CheckoutState::Submitting;
        debug!(flow = %self.flow, %total, "Submitting checkout");

        match self.commit(fulfillment, total, payments).await {
            Ok(receipt) => {
                self.state = CheckoutState::Committed;
                Ok(receipt)
            }
            Err(e) => {
                self.state = resume;
                debug!(error = %e, state = %self.state, "Checkout submission failed");
                Err(e)
            }
        }
    }

    async fn commit(
        &mut self,
        fulfillment: FulfillmentType,
        total: Money,
        payments: Vec<PaymentAllocation>,
    ) -> CheckoutResult<CheckoutReceipt> {
        let catalog = self.backend.fetch_catalog().await?;
        let snapshot = InventorySnapshot::for_location(catalog, self.location_id);

        if let Err(e) = snapshot.revalidate(self.cart.cart()) {
            debug!(error = %e, "Stock changed since the cart was filled");
            return Err(e.into());
        }

        let items: Vec<TransactionItem> = self
            .cart
            .cart()
            .lines()
            .iter()
            .map(TransactionItem::from_line)
            .collect();
        let request = TransactionRequest {
            location_id: self.location_id,
            items: items.clone(),
            payments: payments.clone(),
        };

        let transaction_id = self.backend.submit_transaction(request).await?;
        info!(%transaction_id, %total, flow = %self.flow, "Transaction committed");

        let mut warnings = Vec::new();

        if let Err(e) = self.cart.clear_committed() {
            warn!(%transaction_id, error = %e, "Committed cart could not be cleared from storage");
            warnings.push(CheckoutWarning::CartNotCleared {
                reason: e.to_string(),
            });
        }

        if let Some(proof) = self.proof.clone() {
            match self
                .backend
                .upload_payment_proof(transaction_id, proof)
                .await
            {
                Ok(()) => debug!(%transaction_id, "Payment proof uploaded"),
                Err(e) => {
                    warn!(%transaction_id, error = %e, "Payment proof upload failed");
                    warnings.push(CheckoutWarning::ProofUploadFailed {
                        transaction_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(CheckoutReceipt {
            transaction_id,
            location_id: self.location_id,
            flow: self.flow,
            fulfillment,
            items,
            payments,
            total,
            warnings,
            committed_at: Utc::now(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
