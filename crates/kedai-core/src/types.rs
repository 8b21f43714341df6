//! # Domain Types
//!
//! Core domain types used throughout Kedai POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Bill-of-Materials (BOM) Graph                        │
//! │                                                                         │
//! │  ┌─────────────┐      ┌────────────────┐      ┌─────────────────┐      │
//! │  │   Bundle    │─────►│ BundleItem     │─────►│ ProductPackage  │      │
//! │  │  items[]    │      │  Product(id) ──┼──┐   │  components[]   │      │
//! │  └─────────────┘      │  Package(id) ──┼┐ │   └────────┬────────┘      │
//! │                       └────────────────┘│ │            │               │
//! │                                         │ │            ▼               │
//! │                                         │ │   ┌─────────────────┐      │
//! │                                         │ └──►│  AtomicProduct  │      │
//! │                                         │     │  stock (stored) │      │
//! │                                         └────►└─────────────────┘      │
//! │                                                                         │
//! │  A package component can ONLY name a product, so the graph is at most  │
//! │  two levels deep by construction. No cycle check is ever needed.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Ids are assigned by the backend. Each entity gets its own newtype so a
//! package id can never be passed where a product id is expected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::payment::PaymentAllocation;

// =============================================================================
// Identifiers
// =============================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
        )]
        #[ts(export)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of an atomic product.
    ProductId,
    "prod"
);
id_type!(
    /// Identifier of a product package.
    PackageId,
    "pkg"
);
id_type!(
    /// Identifier of a bundle.
    BundleId,
    "bundle"
);
id_type!(
    /// Identifier of an outlet (store location).
    LocationId,
    "outlet"
);
id_type!(
    /// Identifier the backend assigns to a committed transaction.
    TransactionId,
    "trx"
);

// =============================================================================
// Catalog Records
// =============================================================================

/// A directly stocked, non-composite sellable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AtomicProduct {
    pub id: ProductId,

    /// Display name shown to cashier and customer.
    pub name: String,

    /// Price in smallest currency units.
    pub price: Money,

    /// Units on hand. Decremented only by the backend.
    pub stock: u64,

    /// Outlet owning this record.
    pub location_id: LocationId,

    /// Soft delete flag.
    pub is_deleted: bool,
}

impl AtomicProduct {
    /// Creates a live (not deleted) product record.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Money,
        stock: u64,
        location_id: LocationId,
    ) -> Self {
        AtomicProduct {
            id,
            name: name.into(),
            price,
            stock,
            location_id,
            is_deleted: false,
        }
    }
}

/// One product requirement inside a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PackageComponent {
    pub product_id: ProductId,

    /// Units of the product consumed per package.
    pub quantity: u64,
}

/// A fixed set of products sold as one unit (e.g. a combo meal).
///
/// Its sellable stock is derived from its components and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductPackage {
    pub id: PackageId,
    pub name: String,
    pub price: Money,
    pub components: Vec<PackageComponent>,
    pub location_id: LocationId,
    pub is_active: bool,
}

/// What a bundle item points at.
///
/// Product and package references are mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
#[ts(export)]
pub enum BundleComponent {
    Product(ProductId),
    Package(PackageId),
}

/// One requirement inside a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BundleItem {
    pub component: BundleComponent,

    /// Units of the product or package consumed per bundle.
    pub quantity: u64,
}

/// A set of products and/or packages sold as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Bundle {
    pub id: BundleId,
    pub name: String,
    pub price: Money,
    pub items: Vec<BundleItem>,
    pub location_id: LocationId,
    pub is_active: bool,
}

/// An outlet (store branch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub address: String,
    pub is_active: bool,
}

/// Everything the backend returns from one catalog fetch.
///
/// Records for every outlet, including deleted and inactive ones; the
/// [`InventorySnapshot`](crate::snapshot::InventorySnapshot) applies the
/// client-side filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Catalog {
    pub products: Vec<AtomicProduct>,
    pub packages: Vec<ProductPackage>,
    pub bundles: Vec<Bundle>,
    pub locations: Vec<Location>,
}

// =============================================================================
// Sale Units
// =============================================================================

/// Kind discriminant of a sellable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SaleUnitKind {
    Product,
    Package,
    Bundle,
}

impl fmt::Display for SaleUnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleUnitKind::Product => write!(f, "product"),
            SaleUnitKind::Package => write!(f, "package"),
            SaleUnitKind::Bundle => write!(f, "bundle"),
        }
    }
}

/// Reference to anything that can be sold. Also the cart line key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
#[ts(export)]
pub enum SaleUnitRef {
    Product(ProductId),
    Package(PackageId),
    Bundle(BundleId),
}

impl SaleUnitRef {
    /// Returns the kind discriminant.
    pub fn kind(&self) -> SaleUnitKind {
        match self {
            SaleUnitRef::Product(_) => SaleUnitKind::Product,
            SaleUnitRef::Package(_) => SaleUnitKind::Package,
            SaleUnitRef::Bundle(_) => SaleUnitKind::Bundle,
        }
    }

    /// Returns the raw backend id, without its kind.
    pub fn raw_id(&self) -> u64 {
        match self {
            SaleUnitRef::Product(id) => id.0,
            SaleUnitRef::Package(id) => id.0,
            SaleUnitRef::Bundle(id) => id.0,
        }
    }
}

impl fmt::Display for SaleUnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleUnitRef::Product(id) => write!(f, "{}", id),
            SaleUnitRef::Package(id) => write!(f, "{}", id),
            SaleUnitRef::Bundle(id) => write!(f, "{}", id),
        }
    }
}

/// A sellable unit as presented to the cart, with the stock the UI saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleUnit {
    pub unit: SaleUnitRef,
    pub name: String,
    pub price: Money,
    pub available_stock: u64,
    pub location_id: LocationId,
}

// =============================================================================
// Cart Line
// =============================================================================

/// A cart-resident copy of a sale unit.
///
/// ## Snapshot Pattern
/// Name and price are frozen when the line is created, so the cart displays
/// consistently even if the catalog changes underneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub unit: SaleUnitRef,
    pub name: String,
    pub price: Money,

    /// Always >= 1 while the line exists.
    pub quantity: u64,

    /// Available stock used by the most recent clamp.
    pub available_stock: u64,

    pub location_id: LocationId,
}

impl CartLine {
    /// Creates a fresh line holding one unit.
    pub fn from_unit(unit: &SaleUnit) -> Self {
        CartLine {
            unit: unit.unit,
            name: unit.name.clone(),
            price: unit.price,
            quantity: 1,
            available_stock: unit.available_stock,
            location_id: unit.location_id,
        }
    }

    /// Calculates the line total (unit price × quantity).
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Fulfillment
// =============================================================================

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum FulfillmentType {
    /// Picked up at the counter.
    #[serde(alias = "pickup")]
    Takeaway,
    /// Delivered to the customer.
    Delivery,
}

impl fmt::Display for FulfillmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FulfillmentType::Takeaway => write!(f, "takeaway"),
            FulfillmentType::Delivery => write!(f, "delivery"),
        }
    }
}

// =============================================================================
// Payment Proof
// =============================================================================

/// An image the customer attaches as proof of an online payment.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ProofAttachment {
    /// Size of the payload in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for ProofAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofAttachment")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size())
            .finish()
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// One line of a transaction as the backend expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionItem {
    /// Raw id of the product, package or bundle.
    pub unit_id: u64,
    pub quantity: u64,
    pub unit_price: Money,
    pub is_package: bool,
    pub is_bundle: bool,
}

impl TransactionItem {
    /// Converts a cart line into the backend's flag-based line shape.
    pub fn from_line(line: &CartLine) -> Self {
        TransactionItem {
            unit_id: line.unit.raw_id(),
            quantity: line.quantity,
            unit_price: line.price,
            is_package: line.unit.kind() == SaleUnitKind::Package,
            is_bundle: line.unit.kind() == SaleUnitKind::Bundle,
        }
    }

    /// Recovers the tagged unit reference from the flags.
    pub fn unit(&self) -> SaleUnitRef {
        if self.is_bundle {
            SaleUnitRef::Bundle(BundleId(self.unit_id))
        } else if self.is_package {
            SaleUnitRef::Package(PackageId(self.unit_id))
        } else {
            SaleUnitRef::Product(ProductId(self.unit_id))
        }
    }

    /// Line total (unit price × quantity).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Payload of a transaction submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionRequest {
    pub location_id: LocationId,
    pub items: Vec<TransactionItem>,
    pub payments: Vec<PaymentAllocation>,
}

/// A committed transaction, as returned by the history query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Transaction {
    pub id: TransactionId,
    pub location_id: LocationId,
    pub items: Vec<TransactionItem>,
    pub total: Money,
    pub payments: Vec<PaymentAllocation>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
