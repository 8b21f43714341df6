//! # Backend Port
//!
//! The remote service that owns the authoritative catalog and commits
//! transactions.
//!
//! ## Call Sequence During Checkout
//! ```text
//! ┌──────────────────┐                         ┌──────────────────┐
//! │ CheckoutSession  │                         │     Backend      │
//! └────────┬─────────┘                         └────────┬─────────┘
//!          │  fetch_catalog()                           │
//!          │───────────────────────────────────────────►│
//!          │◄─────────────────────────── Catalog ───────│
//!          │                                            │
//!          │  (re-validate every cart line locally)     │
//!          │                                            │
//!          │  submit_transaction(request)               │
//!          │───────────────────────────────────────────►│  decrements stock
//!          │◄────────────────────── TransactionId ──────│
//!          │                                            │
//!          │  upload_payment_proof(id, proof)           │  (kiosk only)
//!          │───────────────────────────────────────────►│
//!          │◄─────────────────────────────── () ────────│
//! ```
//!
//! One awaited response per call. No streaming, no retries.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use kedai_core::{
    BundleComponent, Catalog, LocationId, Money, PackageId, ProductId, ProofAttachment,
    SaleUnitRef, Transaction, TransactionId, TransactionRequest,
};

use crate::error::{BackendError, BackendResult};

/// Operations the checkout needs from the backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetches the current catalog for every outlet.
    async fn fetch_catalog(&self) -> BackendResult<Catalog>;

    /// Commits a transaction and returns its id.
    async fn submit_transaction(&self, request: TransactionRequest) -> BackendResult<TransactionId>;

    /// Stores a payment proof image against a committed transaction.
    async fn upload_payment_proof(
        &self,
        transaction_id: TransactionId,
        proof: ProofAttachment,
    ) -> BackendResult<()>;

    /// Lists committed transactions, oldest first.
    async fn transaction_history(&self) -> BackendResult<Vec<Transaction>>;
}

// =============================================================================
// In-Memory Backend
// =============================================================================

#[derive(Debug, Default)]
struct InMemoryBackendState {
    catalog: Catalog,
    transactions: Vec<Transaction>,
    proofs: HashMap<TransactionId, ProofAttachment>,
    next_id: u64,
    offline: bool,
    fail_proof_uploads: bool,
}

/// In-memory backend for tests and the demo binary.
///
/// Commits decrement product stock, expanding packages and bundles into
/// their component products, so a refetch observes the sale.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<RwLock<InMemoryBackendState>>,
}

impl InMemoryBackend {
    /// Creates a backend serving `catalog`.
    pub fn new(catalog: Catalog) -> Self {
        let backend = Self::default();
        backend.write().catalog = catalog;
        backend
    }

    fn read(&self) -> RwLockReadGuard<'_, InMemoryBackendState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, InMemoryBackendState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes every call fail with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.write().offline = offline;
    }

    /// Makes proof uploads fail while other calls keep working.
    pub fn set_fail_proof_uploads(&self, fail: bool) {
        self.write().fail_proof_uploads = fail;
    }

    /// Overwrites a product's stock, as a sale on another terminal would.
    pub fn set_product_stock(&self, product_id: ProductId, stock: u64) {
        let mut state = self.write();
        if let Some(product) = state
            .catalog
            .products
            .iter_mut()
            .find(|p| p.id == product_id)
        {
            product.stock = stock;
        }
    }

    /// Current stock of a product, if it exists.
    pub fn product_stock(&self, product_id: ProductId) -> Option<u64> {
        self.read()
            .catalog
            .products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.stock)
    }

    /// Number of committed transactions.
    pub fn transaction_count(&self) -> usize {
        self.read().transactions.len()
    }

    /// Proof stored for a transaction.
    pub fn proof_for(&self, transaction_id: TransactionId) -> Option<ProofAttachment> {
        self.read().proofs.get(&transaction_id).cloned()
    }

    fn ensure_online(state: &InMemoryBackendState) -> BackendResult<()> {
        if state.offline {
            return Err(BackendError::Unavailable("backend is offline".to_string()));
        }
        Ok(())
    }
}

/// Expands a request into the product quantities it consumes.
fn product_demand(
    catalog: &Catalog,
    location: LocationId,
    request: &TransactionRequest,
) -> BackendResult<HashMap<ProductId, u64>> {
    let mut demand: HashMap<ProductId, u64> = HashMap::new();

    let package_components = move |id: PackageId| {
        catalog
            .packages
            .iter()
            .find(|p| p.id == id && p.is_active && p.location_id == location)
            .map(|p| p.components.as_slice())
            .ok_or_else(|| BackendError::Rejected(format!("unknown package {}", id)))
    };

    for item in &request.items {
        match item.unit() {
            SaleUnitRef::Product(id) => {
                *demand.entry(id).or_default() += item.quantity;
            }
            SaleUnitRef::Package(id) => {
                for component in package_components(id)? {
                    *demand.entry(component.product_id).or_default() +=
                        component.quantity * item.quantity;
                }
            }
            SaleUnitRef::Bundle(id) => {
                let bundle = catalog
                    .bundles
                    .iter()
                    .find(|b| b.id == id && b.is_active && b.location_id == location)
                    .ok_or_else(|| BackendError::Rejected(format!("unknown bundle {}", id)))?;

                for bundle_item in &bundle.items {
                    let count = bundle_item.quantity * item.quantity;
                    match bundle_item.component {
                        BundleComponent::Product(product_id) => {
                            *demand.entry(product_id).or_default() += count;
                        }
                        BundleComponent::Package(package_id) => {
                            for component in package_components(package_id)? {
                                *demand.entry(component.product_id).or_default() +=
                                    component.quantity * count;
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(demand)
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn fetch_catalog(&self) -> BackendResult<Catalog> {
        let state = self.read();
        Self::ensure_online(&state)?;
        Ok(state.catalog.clone())
    }

    async fn submit_transaction(&self, request: TransactionRequest) -> BackendResult<TransactionId> {
        let mut state = self.write();
        Self::ensure_online(&state)?;

        if request.items.is_empty() {
            return Err(BackendError::Rejected("transaction has no items".to_string()));
        }

        let total: Money = request.items.iter().map(|i| i.line_total()).sum();
        let paid: Money = request.payments.iter().map(|p| p.amount).sum();
        if paid != total {
            return Err(BackendError::Rejected(format!(
                "payments {} do not match total {}",
                paid, total
            )));
        }

        let demand = product_demand(&state.catalog, request.location_id, &request)?;

        // Check everything before touching anything
        for (product_id, needed) in &demand {
            let product = state
                .catalog
                .products
                .iter()
                .find(|p| p.id == *product_id && !p.is_deleted)
                .ok_or_else(|| BackendError::Rejected(format!("unknown product {}", product_id)))?;
            if product.stock < *needed {
                return Err(BackendError::Rejected(format!(
                    "insufficient stock for {}: {} left, {} needed",
                    product.name, product.stock, needed
                )));
            }
        }

        for product in state.catalog.products.iter_mut() {
            if let Some(needed) = demand.get(&product.id) {
                product.stock -= needed;
            }
        }

        state.next_id += 1;
        let id = TransactionId(state.next_id);
        state.transactions.push(Transaction {
            id,
            location_id: request.location_id,
            items: request.items,
            total,
            payments: request.payments,
            created_at: Utc::now(),
        });

        debug!(transaction_id = %id, %total, "Transaction committed");
        Ok(id)
    }

    async fn upload_payment_proof(
        &self,
        transaction_id: TransactionId,
        proof: ProofAttachment,
    ) -> BackendResult<()> {
        let mut state = self.write();
        Self::ensure_online(&state)?;

        if state.fail_proof_uploads {
            return Err(BackendError::Unavailable(
                "proof storage unavailable".to_string(),
            ));
        }
        if !state.transactions.iter().any(|t| t.id == transaction_id) {
            return Err(BackendError::Rejected(format!(
                "unknown transaction {}",
                transaction_id
            )));
        }

        state.proofs.insert(transaction_id, proof);
        Ok(())
    }

    async fn transaction_history(&self) -> BackendResult<Vec<Transaction>> {
        let state = self.read();
        Self::ensure_online(&state)?;
        Ok(state.transactions.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{demo_catalog, OUTLET};
    use kedai_core::{BundleId, PaymentAllocation, TransactionItem};

    fn item(unit: SaleUnitRef, quantity: u64, price: i64) -> TransactionItem {
        TransactionItem {
            unit_id: unit.raw_id(),
            quantity,
            unit_price: Money::from_units(price),
            is_package: matches!(unit, SaleUnitRef::Package(_)),
            is_bundle: matches!(unit, SaleUnitRef::Bundle(_)),
        }
    }

    fn request(items: Vec<TransactionItem>) -> TransactionRequest {
        let total: Money = items.iter().map(|i| i.line_total()).sum();
        TransactionRequest {
            location_id: OUTLET,
            items,
            payments: vec![PaymentAllocation::cash().with_amount(total)],
        }
    }

    #[tokio::test]
    async fn test_commit_expands_composites() {
        let backend = InMemoryBackend::new(demo_catalog());

        // 1 package (2 nasi + 3 teh) and 1 bundle (2 kerupuk + 1 package)
        let id = backend
            .submit_transaction(request(vec![
                item(SaleUnitRef::Package(PackageId(1)), 1, 15_000),
                item(SaleUnitRef::Bundle(BundleId(1)), 1, 40_000),
            ]))
            .await
            .unwrap();

        assert_eq!(id, TransactionId(1));
        assert_eq!(backend.product_stock(ProductId(1)), Some(10 - 2 - 2));
        assert_eq!(backend.product_stock(ProductId(2)), Some(9 - 3 - 3));
        assert_eq!(backend.product_stock(ProductId(3)), Some(20 - 2));
        assert_eq!(backend.transaction_count(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejects_without_decrement() {
        let backend = InMemoryBackend::new(demo_catalog());

        let result = backend
            .submit_transaction(request(vec![
                item(SaleUnitRef::Product(ProductId(1)), 1, 5_000),
                item(SaleUnitRef::Product(ProductId(2)), 10, 3_000),
            ]))
            .await;

        assert!(matches!(result, Err(BackendError::Rejected(_))));
        assert_eq!(backend.product_stock(ProductId(1)), Some(10));
        assert_eq!(backend.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_payment_mismatch_rejected() {
        let backend = InMemoryBackend::new(demo_catalog());
        let mut req = request(vec![item(SaleUnitRef::Product(ProductId(1)), 1, 5_000)]);
        req.payments[0].amount = Money::from_units(4_999);

        assert!(matches!(
            backend.submit_transaction(req).await,
            Err(BackendError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_offline_backend() {
        let backend = InMemoryBackend::new(demo_catalog());
        backend.set_offline(true);

        assert!(matches!(
            backend.fetch_catalog().await,
            Err(BackendError::Unavailable(_))
        ));
        assert!(matches!(
            backend.transaction_history().await,
            Err(BackendError::Unavailable(_))
        ));

        backend.set_offline(false);
        assert_eq!(backend.fetch_catalog().await.unwrap().products.len(), 3);
    }

    #[tokio::test]
    async fn test_proof_upload() {
        let backend = InMemoryBackend::new(demo_catalog());
        let proof = ProofAttachment {
            file_name: "bukti.png".into(),
            mime_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        };

        // Unknown transaction
        assert!(matches!(
            backend
                .upload_payment_proof(TransactionId(42), proof.clone())
                .await,
            Err(BackendError::Rejected(_))
        ));

        let id = backend
            .submit_transaction(request(vec![item(SaleUnitRef::Product(ProductId(1)), 1, 5_000)]))
            .await
            .unwrap();

        backend.set_fail_proof_uploads(true);
        assert!(backend.upload_payment_proof(id, proof.clone()).await.is_err());

        backend.set_fail_proof_uploads(false);
        backend.upload_payment_proof(id, proof.clone()).await.unwrap();
        assert_eq!(backend.proof_for(id), Some(proof));

        let history = backend.transaction_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].total, Money::from_units(5_000));
    }
}
