//! # kedai-checkout: Checkout Reconciler
//!
//! Drives a cart from payment selection to a committed transaction.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         kedai-checkout                                  │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐   │
//! │  │    checkout      │   │     backend      │   │     config       │   │
//! │  │                  │   │                  │   │                  │   │
//! │  │ CheckoutSession  │──►│ Backend (trait)  │   │ PosConfig        │   │
//! │  │ CheckoutReceipt  │   │ InMemoryBackend  │   │ pos.toml + env   │   │
//! │  └────────┬─────────┘   └──────────────────┘   └──────────────────┘   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  kedai-store::CartService ──► kedai-core (resolver, cart, payments)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kedai_checkout::demo::{demo_catalog, OUTLET};
//! use kedai_checkout::{CheckoutFlow, CheckoutSession, InMemoryBackend, KioskPaymentMethod};
//! use kedai_core::{FulfillmentType, InventorySnapshot, ProductId, SaleUnitRef};
//! use kedai_store::{CartService, MemoryCartStore};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let backend = InMemoryBackend::new(demo_catalog());
//! let mut cart = CartService::open(MemoryCartStore::new(), "kiosk-cart-storage").unwrap();
//!
//! let snapshot = InventorySnapshot::for_location(demo_catalog(), OUTLET);
//! let nasi = snapshot.sale_unit(SaleUnitRef::Product(ProductId(1))).unwrap();
//! cart.add_to_cart(&nasi).unwrap();
//!
//! let mut session = CheckoutSession::new(CheckoutFlow::Kiosk, OUTLET, &mut cart, &backend);
//! session.set_fulfillment(FulfillmentType::Takeaway).unwrap();
//! session.choose_kiosk_method(KioskPaymentMethod::Qris).unwrap();
//! let receipt = session.submit().await.unwrap();
//! assert_eq!(receipt.total.units(), 5_000);
//! # });
//! ```

pub mod backend;
pub mod checkout;
pub mod config;
pub mod demo;
pub mod error;

pub use backend::{Backend, InMemoryBackend};
pub use checkout::{
    CheckoutFlow, CheckoutReceipt, CheckoutSession, CheckoutState, CheckoutWarning,
    KioskPaymentMethod,
};
pub use config::PosConfig;
pub use error::{BackendError, BackendResult, CheckoutError, CheckoutResult, ErrorCode, ErrorResponse};
