//! # Cart Service
//!
//! Wraps the pure [`Cart`] reducer with write-through persistence.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  App start                                                              │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  CartService::open(store, key)                                          │
//! │     ├── slot empty ──────────► empty cart                               │
//! │     ├── slot corrupt ────────► warn!, empty cart                        │
//! │     └── slot valid ──────────► restored lines                           │
//! │                                                                         │
//! │  add / update / remove / clear                                          │
//! │     ├── NoOp ────────────────► nothing written                          │
//! │     ├── changed ─────────────► store.save(key, json), then swap in      │
//! │     └── save failed ─────────► Err, cart unchanged                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no global cart: each service owns its cart and its store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use kedai_core::{Cart, CartLine, CartOutcome, CartTotals, Money, SaleUnit, SaleUnitRef};

use crate::error::StoreResult;
use crate::store::CartStore;

/// Version of the persisted slot layout.
const SLOT_VERSION: u32 = 1;

/// On-disk layout of the cart slot.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedCart {
    version: u32,
    lines: Vec<CartLine>,
    saved_at: DateTime<Utc>,
}

/// A cart bound to a persistence slot.
#[derive(Debug)]
pub struct CartService<S: CartStore> {
    store: S,
    key: String,
    cart: Cart,
}

impl<S: CartStore> CartService<S> {
    /// Opens the cart saved under `key`, or an empty cart.
    ///
    /// ## Errors
    /// Only I/O failures reading the slot. Undecodable content is logged and
    /// discarded.
    pub fn open(store: S, key: impl Into<String>) -> StoreResult<Self> {
        let key = key.into();

        let cart = match store.load(&key)? {
            None => {
                debug!(key = %key, "No saved cart, starting empty");
                Cart::new()
            }
            Some(json) => match serde_json::from_str::<PersistedCart>(&json) {
                Ok(saved) if saved.version == SLOT_VERSION => {
                    let cart = Cart::from_lines(saved.lines);
                    debug!(key = %key, lines = cart.item_count(), "Cart restored");
                    cart
                }
                Ok(saved) => {
                    warn!(key = %key, version = saved.version, "Unknown cart slot version, starting empty");
                    Cart::new()
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Corrupt cart slot, starting empty");
                    Cart::new()
                }
            },
        };

        Ok(CartService { store, key, cart })
    }

    /// The current cart.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Slot key this cart is saved under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn add_to_cart(&mut self, unit: &SaleUnit) -> StoreResult<CartOutcome> {
        let outcome = self.apply(|cart| cart.add_to_cart(unit))?;
        debug!(unit = %unit.unit, available = unit.available_stock, ?outcome, "add_to_cart");
        Ok(outcome)
    }

    pub fn update_quantity(&mut self, unit: &SaleUnitRef, delta: i64) -> StoreResult<CartOutcome> {
        let outcome = self.apply(|cart| cart.update_quantity(unit, delta))?;
        debug!(unit = %unit, delta, ?outcome, "update_quantity");
        Ok(outcome)
    }

    pub fn remove_from_cart(&mut self, unit: &SaleUnitRef) -> StoreResult<CartOutcome> {
        let outcome = self.apply(|cart| cart.remove_from_cart(unit))?;
        debug!(unit = %unit, ?outcome, "remove_from_cart");
        Ok(outcome)
    }

    pub fn clear_cart(&mut self) -> StoreResult<CartOutcome> {
        let outcome = self.apply(Cart::clear)?;
        debug!(?outcome, "clear_cart");
        Ok(outcome)
    }

    /// Empties a cart whose lines were just committed as a transaction.
    ///
    /// Unlike [`clear_cart`](Self::clear_cart), the in-memory cart is emptied
    /// even when the slot cannot be written: the lines are already sold. The
    /// write error is still returned so the caller can report it.
    pub fn clear_committed(&mut self) -> StoreResult<CartOutcome> {
        let outcome = self.cart.clear();
        debug!(?outcome, "clear_committed");
        if outcome.changed() {
            self.persist(&self.cart)?;
        }
        Ok(outcome)
    }

    /// Recomputed cart total.
    pub fn total(&self) -> Money {
        self.cart.total()
    }

    /// Display summary of the cart.
    pub fn totals(&self) -> CartTotals {
        CartTotals::from(&self.cart)
    }

    /// Runs a mutation on a copy of the cart and keeps it only once the
    /// slot has been written. A failed write leaves the cart untouched.
    fn apply(&mut self, mutate: impl FnOnce(&mut Cart) -> CartOutcome) -> StoreResult<CartOutcome> {
        let mut next = self.cart.clone();
        let outcome = mutate(&mut next);
        if outcome.changed() {
            self.persist(&next)?;
            self.cart = next;
        }
        Ok(outcome)
    }

    fn persist(&self, cart: &Cart) -> StoreResult<()> {
        let slot = PersistedCart {
            version: SLOT_VERSION,
            lines: cart.lines().to_vec(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string(&slot)?;
        self.store.save(&self.key, &json)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::{FileCartStore, MemoryCartStore};
    use kedai_core::{LocationId, PackageId, ProductId, CART_STORAGE_KEY};

    fn unit(unit: SaleUnitRef, price: i64, available_stock: u64) -> SaleUnit {
        SaleUnit {
            unit,
            name: format!("Unit {}", unit),
            price: Money::from_units(price),
            available_stock,
            location_id: LocationId(1),
        }
    }

    #[test]
    fn test_cart_survives_reopen() {
        let store = MemoryCartStore::new();
        let nasi = unit(SaleUnitRef::Product(ProductId(1)), 15_000, 5);
        let paket = unit(SaleUnitRef::Package(PackageId(1)), 25_000, 2);

        let mut service = CartService::open(store.clone(), CART_STORAGE_KEY).unwrap();
        service.add_to_cart(&nasi).unwrap();
        service.add_to_cart(&nasi).unwrap();
        service.add_to_cart(&paket).unwrap();
        let before = service.cart().clone();
        drop(service);

        let reopened = CartService::open(store, CART_STORAGE_KEY).unwrap();
        assert_eq!(reopened.cart(), &before);
        assert_eq!(reopened.total(), Money::from_units(55_000));
    }

    #[test]
    fn test_noop_does_not_write() {
        let store = MemoryCartStore::new();
        let mut service = CartService::open(store.clone(), "cart").unwrap();

        let outcome = service
            .add_to_cart(&unit(SaleUnitRef::Product(ProductId(1)), 1_000, 0))
            .unwrap();

        assert!(!outcome.changed());
        assert_eq!(store.load("cart").unwrap(), None);
    }

    #[test]
    fn test_clear_is_persisted() {
        let store = MemoryCartStore::new();
        let mut service = CartService::open(store.clone(), "cart").unwrap();
        service
            .add_to_cart(&unit(SaleUnitRef::Product(ProductId(1)), 1_000, 3))
            .unwrap();
        service.clear_cart().unwrap();

        let reopened = CartService::open(store, "cart").unwrap();
        assert!(reopened.cart().is_empty());
    }

    #[test]
    fn test_corrupt_slot_starts_empty() {
        let store = MemoryCartStore::new();
        store.put_raw("cart", "{not json");

        let service = CartService::open(store.clone(), "cart").unwrap();
        assert!(service.cart().is_empty());

        store.put_raw("cart", r#"{"version":99,"lines":[],"savedAt":"2026-01-01T00:00:00Z"}"#);
        let service = CartService::open(store, "cart").unwrap();
        assert!(service.cart().is_empty());
    }

    #[test]
    fn test_update_and_remove_write_through() {
        let store = MemoryCartStore::new();
        let nasi = unit(SaleUnitRef::Product(ProductId(1)), 10_000, 4);
        let teh = unit(SaleUnitRef::Product(ProductId(2)), 3_000, 4);

        let mut service = CartService::open(store.clone(), "cart").unwrap();
        service.add_to_cart(&nasi).unwrap();
        service.add_to_cart(&teh).unwrap();
        service.update_quantity(&nasi.unit, 2).unwrap();
        service.remove_from_cart(&teh.unit).unwrap();

        let reopened = CartService::open(store, "cart").unwrap();
        assert_eq!(reopened.cart().item_count(), 1);
        assert_eq!(reopened.cart().line(&nasi.unit).unwrap().quantity, 3);
        assert_eq!(reopened.totals().total, Money::from_units(30_000));
    }

    #[test]
    fn test_file_backed_service_reopen() {
        let dir = std::env::temp_dir().join(format!("kedai-cart-{}", uuid::Uuid::new_v4()));
        let nasi = unit(SaleUnitRef::Product(ProductId(1)), 15_000, 5);

        let mut service = CartService::open(FileCartStore::new(&dir), CART_STORAGE_KEY).unwrap();
        service.add_to_cart(&nasi).unwrap();
        drop(service);

        let reopened = CartService::open(FileCartStore::new(&dir), CART_STORAGE_KEY).unwrap();
        assert_eq!(reopened.cart().line(&nasi.unit).unwrap().quantity, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    /// Store whose writes can be switched off.
    #[derive(Default)]
    struct ReadOnlyStore {
        inner: MemoryCartStore,
        refuse_writes: std::sync::atomic::AtomicBool,
    }

    impl ReadOnlyStore {
        fn refuse_writes(&self, refuse: bool) {
            self.refuse_writes
                .store(refuse, std::sync::atomic::Ordering::SeqCst);
        }
    }

    impl CartStore for ReadOnlyStore {
        fn load(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.load(key)
        }

        fn save(&self, key: &str, json: &str) -> StoreResult<()> {
            if self.refuse_writes.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(StoreError::NoDataDir);
            }
            self.inner.save(key, json)
        }

        fn remove(&self, key: &str) -> StoreResult<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_write_leaves_cart_unchanged() {
        let nasi = unit(SaleUnitRef::Product(ProductId(1)), 5_000, 5);
        let mut service = CartService::open(ReadOnlyStore::default(), "cart").unwrap();
        service.add_to_cart(&nasi).unwrap();

        service.store().refuse_writes(true);
        assert!(service.add_to_cart(&nasi).is_err());
        assert!(service.update_quantity(&nasi.unit, 2).is_err());
        assert!(service.remove_from_cart(&nasi.unit).is_err());
        assert!(service.clear_cart().is_err());

        assert_eq!(service.cart().item_count(), 1);
        assert_eq!(service.cart().line(&nasi.unit).unwrap().quantity, 1);
        assert_eq!(service.total(), Money::from_units(5_000));

        // Tapping again once storage recovers adds exactly one more
        service.store().refuse_writes(false);
        service.add_to_cart(&nasi).unwrap();
        assert_eq!(service.cart().line(&nasi.unit).unwrap().quantity, 2);
    }

    #[test]
    fn test_clear_committed_empties_even_if_write_fails() {
        let nasi = unit(SaleUnitRef::Product(ProductId(1)), 5_000, 5);
        let mut service = CartService::open(ReadOnlyStore::default(), "cart").unwrap();
        service.add_to_cart(&nasi).unwrap();

        service.store().refuse_writes(true);
        assert!(service.clear_committed().is_err());
        assert!(service.cart().is_empty());
    }
}
