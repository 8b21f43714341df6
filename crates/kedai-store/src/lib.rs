//! # kedai-store: Local Cart Persistence
//!
//! Keeps the in-progress cart on the device so it survives an app restart.
//!
//! ## Usage
//! ```rust,no_run
//! use kedai_core::CART_STORAGE_KEY;
//! use kedai_store::{CartService, FileCartStore};
//!
//! let store = FileCartStore::in_data_dir()?;
//! let service = CartService::open(store, CART_STORAGE_KEY)?;
//! println!("{} lines restored", service.cart().item_count());
//! # Ok::<(), kedai_store::StoreError>(())
//! ```

pub mod error;
pub mod service;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use service::CartService;
pub use store::{CartStore, FileCartStore, MemoryCartStore};
