//! # kedai-core: Pure Business Logic for Kedai POS
//!
//! This crate is the **heart** of Kedai POS. It turns atomic per-product
//! stock counts into sellable quantities for packages and bundles, and gates
//! cart mutation and payment splits against them. Everything here is a pure
//! function with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kedai POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Kiosk / Counter frontend (out of scope)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        kedai-checkout (backend port, checkout reconciler)       │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────┐               │                        │
//! │  │  kedai-store (cart slot)    │               │                        │
//! │  └──────────────┬──────────────┘               │                        │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────────────────────▼───────────────────┐   │
//! │  │               ★ kedai-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐         │   │
//! │  │   │ snapshot │►│  stock   │►│   cart   │ │ payment  │         │   │
//! │  │   │ catalog  │ │ resolver │ │ reducer  │ │  split   │         │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (products, packages, bundles, cart lines)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`stock`] - Composite stock resolver
//! - [`snapshot`] - Point-in-time inventory view for one outlet
//! - [`cart`] - Cart reducer with stock clamping
//! - [`payment`] - Payment allocations and split reconciliation
//! - [`validation`] - Input validation (amounts, proof attachments)
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kedai_core::stock::{index_products, package_stock};
//! use kedai_core::{AtomicProduct, LocationId, Money, PackageComponent, PackageId, ProductId, ProductPackage};
//!
//! let rice = AtomicProduct::new(ProductId(1), "Nasi", Money::from_units(5_000), 10, LocationId(1));
//! let products = index_products([rice]);
//!
//! let combo = ProductPackage {
//!     id: PackageId(7),
//!     name: "Paket Hemat".to_string(),
//!     price: Money::from_units(12_000),
//!     components: vec![PackageComponent { product_id: ProductId(1), quantity: 3 }],
//!     location_id: LocationId(1),
//!     is_active: true,
//! };
//!
//! // 10 portions of rice, 3 per package: only 3 complete packages
//! assert_eq!(package_stock(&combo, &products), 3);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod payment;
pub mod snapshot;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartOutcome, CartTotals, NoOpReason};
pub use error::{CoreError, CoreResult, StockConflict, ValidationError};
pub use money::Money;
pub use payment::{PaymentAllocation, PaymentCategory, PaymentSubCategory};
pub use snapshot::{BundleWithStock, InventorySnapshot, PackageWithStock};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of distinct lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps transaction requests a reasonable size.
pub const MAX_CART_LINES: usize = 100;

/// Maximum size of a payment proof image (5 MiB).
pub const MAX_PROOF_BYTES: u64 = 5 * 1024 * 1024;

/// Storage key of the persisted kiosk cart.
pub const CART_STORAGE_KEY: &str = "kiosk-cart-storage";
