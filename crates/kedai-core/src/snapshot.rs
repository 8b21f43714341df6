//! # Inventory Snapshot
//!
//! An immutable, location-scoped view of the catalog with fresh derived
//! stock for every sale unit.
//!
//! ```text
//! ┌───────────────┐     for_location()     ┌──────────────────────────────┐
//! │   Catalog     │ ─────────────────────► │   InventorySnapshot          │
//! │ (all outlets) │                        │  ├── products  (!is_deleted) │
//! └───────────────┘                        │  ├── packages  (is_active)   │
//!                                          │  ├── bundles   (is_active)   │
//!                                          │  └── fetched_at              │
//!                                          └──────────────┬───────────────┘
//!                                                         │ available(unit)
//!                                                         ▼
//!                                               stock resolver (pure)
//! ```
//!
//! Stock is recomputed on every read; a snapshot never caches derived counts.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult, StockConflict};
use crate::stock::{bundle_stock, index_packages, index_products, package_stock};
use crate::stock::{PackageIndex, ProductIndex};
use crate::types::{
    AtomicProduct, Bundle, BundleId, Catalog, LocationId, ProductPackage, SaleUnit, SaleUnitRef,
};

/// A package listed with its derived stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PackageWithStock {
    pub package: ProductPackage,
    pub available_stock: u64,
}

/// A bundle listed with its derived stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BundleWithStock {
    pub bundle: Bundle,
    pub available_stock: u64,
}

/// Catalog view used for stock checks.
#[derive(Debug, Clone)]
pub struct InventorySnapshot {
    location: Option<LocationId>,
    products: ProductIndex,
    packages: PackageIndex,
    bundles: HashMap<BundleId, Bundle>,
    fetched_at: DateTime<Utc>,
}

impl InventorySnapshot {
    /// Builds a snapshot of the sellable catalog at one outlet.
    ///
    /// Soft-deleted products and inactive packages/bundles are left out, so
    /// a composite referencing them resolves to zero.
    pub fn for_location(catalog: Catalog, location: LocationId) -> Self {
        Self::build(catalog, Some(location))
    }

    /// Builds a snapshot across every outlet.
    pub fn unfiltered(catalog: Catalog) -> Self {
        Self::build(catalog, None)
    }

    fn build(catalog: Catalog, location: Option<LocationId>) -> Self {
        let at_location = |id: LocationId| location.map_or(true, |loc| loc == id);

        let products = index_products(
            catalog
                .products
                .into_iter()
                .filter(|p| at_location(p.location_id) && !p.is_deleted),
        );
        let packages = index_packages(
            catalog
                .packages
                .into_iter()
                .filter(|p| at_location(p.location_id) && p.is_active),
        );
        let bundles = catalog
            .bundles
            .into_iter()
            .filter(|b| at_location(b.location_id) && b.is_active)
            .map(|b| (b.id, b))
            .collect();

        InventorySnapshot {
            location,
            products,
            packages,
            bundles,
            fetched_at: Utc::now(),
        }
    }

    /// Outlet this snapshot is scoped to, if any.
    pub fn location(&self) -> Option<LocationId> {
        self.location
    }

    /// When the catalog behind this snapshot was fetched.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Fresh sellable stock for any sale unit. Unknown units have none.
    pub fn available(&self, unit: SaleUnitRef) -> u64 {
        match unit {
            SaleUnitRef::Product(id) => self.products.get(&id).map_or(0, |p| p.stock),
            SaleUnitRef::Package(id) => self
                .packages
                .get(&id)
                .map_or(0, |pkg| package_stock(pkg, &self.products)),
            SaleUnitRef::Bundle(id) => self
                .bundles
                .get(&id)
                .map_or(0, |b| bundle_stock(b, &self.products, &self.packages)),
        }
    }

    /// Builds the cart input for a unit, carrying fresh stock.
    pub fn sale_unit(&self, unit: SaleUnitRef) -> Option<SaleUnit> {
        let (name, price, location_id) = match unit {
            SaleUnitRef::Product(id) => {
                let p = self.products.get(&id)?;
                (p.name.clone(), p.price, p.location_id)
            }
            SaleUnitRef::Package(id) => {
                let p = self.packages.get(&id)?;
                (p.name.clone(), p.price, p.location_id)
            }
            SaleUnitRef::Bundle(id) => {
                let b = self.bundles.get(&id)?;
                (b.name.clone(), b.price, b.location_id)
            }
        };

        Some(SaleUnit {
            unit,
            name,
            price,
            available_stock: self.available(unit),
            location_id,
        })
    }

    /// Lists every cart line whose quantity exceeds this snapshot's stock.
    ///
    /// Stock is resolved here, never taken from the line's cached value.
    pub fn stock_conflicts(&self, cart: &Cart) -> Vec<StockConflict> {
        cart.lines()
            .iter()
            .filter_map(|line| {
                let available = self.available(line.unit);
                (line.quantity > available).then(|| StockConflict {
                    unit: line.unit,
                    name: line.name.clone(),
                    requested: line.quantity,
                    available,
                })
            })
            .collect()
    }

    /// Re-checks a whole cart before it is committed.
    ///
    /// ## Errors
    /// [`CoreError::StockConflict`] naming every offending line.
    pub fn revalidate(&self, cart: &Cart) -> CoreResult<()> {
        let conflicts = self.stock_conflicts(cart);
        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(CoreError::StockConflict(conflicts))
        }
    }

    /// Products in the snapshot, ordered by id.
    pub fn products(&self) -> Vec<&AtomicProduct> {
        let mut products: Vec<_> = self.products.values().collect();
        products.sort_by_key(|p| p.id);
        products
    }

    /// Packages with their derived stock, ordered by id.
    pub fn packages_with_stock(&self) -> Vec<PackageWithStock> {
        let mut listed: Vec<_> = self
            .packages
            .values()
            .map(|pkg| PackageWithStock {
                available_stock: package_stock(pkg, &self.products),
                package: pkg.clone(),
            })
            .collect();
        listed.sort_by_key(|p| p.package.id);
        listed
    }

    /// Bundles with their derived stock, ordered by id.
    pub fn bundles_with_stock(&self) -> Vec<BundleWithStock> {
        let mut listed: Vec<_> = self
            .bundles
            .values()
            .map(|bundle| BundleWithStock {
                available_stock: bundle_stock(bundle, &self.products, &self.packages),
                bundle: bundle.clone(),
            })
            .collect();
        listed.sort_by_key(|b| b.bundle.id);
        listed
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{
        BundleComponent, BundleItem, CartLine, PackageComponent, PackageId, ProductId,
    };

    const OUTLET: LocationId = LocationId(1);
    const OTHER: LocationId = LocationId(2);

    fn catalog() -> Catalog {
        let mut deleted = AtomicProduct::new(ProductId(3), "Es Jeruk", Money::from_units(4_000), 50, OUTLET);
        deleted.is_deleted = true;

        Catalog {
            products: vec![
                AtomicProduct::new(ProductId(1), "Nasi", Money::from_units(5_000), 10, OUTLET),
                AtomicProduct::new(ProductId(2), "Teh", Money::from_units(3_000), 9, OUTLET),
                deleted,
                AtomicProduct::new(ProductId(4), "Kopi", Money::from_units(6_000), 40, OTHER),
            ],
            packages: vec![
                ProductPackage {
                    id: PackageId(1),
                    name: "Paket Hemat".into(),
                    price: Money::from_units(15_000),
                    components: vec![
                        PackageComponent { product_id: ProductId(1), quantity: 2 },
                        PackageComponent { product_id: ProductId(2), quantity: 3 },
                    ],
                    location_id: OUTLET,
                    is_active: true,
                },
                ProductPackage {
                    id: PackageId(2),
                    name: "Paket Segar".into(),
                    price: Money::from_units(8_000),
                    components: vec![PackageComponent { product_id: ProductId(3), quantity: 1 }],
                    location_id: OUTLET,
                    is_active: true,
                },
            ],
            bundles: vec![Bundle {
                id: BundleId(1),
                name: "Family Bundle".into(),
                price: Money::from_units(40_000),
                items: vec![
                    BundleItem { component: BundleComponent::Package(PackageId(1)), quantity: 1 },
                    BundleItem { component: BundleComponent::Product(ProductId(2)), quantity: 2 },
                ],
                location_id: OUTLET,
                is_active: true,
            }],
            locations: vec![],
        }
    }

    #[test]
    fn test_available_per_kind() {
        let snapshot = InventorySnapshot::for_location(catalog(), OUTLET);

        assert_eq!(snapshot.available(SaleUnitRef::Product(ProductId(1))), 10);
        assert_eq!(snapshot.available(SaleUnitRef::Package(PackageId(1))), 3);
        assert_eq!(snapshot.available(SaleUnitRef::Bundle(BundleId(1))), 3);
        assert_eq!(snapshot.available(SaleUnitRef::Bundle(BundleId(99))), 0);
    }

    #[test]
    fn test_deleted_product_is_filtered_and_zeroes_package() {
        let snapshot = InventorySnapshot::for_location(catalog(), OUTLET);

        assert_eq!(snapshot.available(SaleUnitRef::Product(ProductId(3))), 0);
        assert!(snapshot.sale_unit(SaleUnitRef::Product(ProductId(3))).is_none());
        assert_eq!(snapshot.available(SaleUnitRef::Package(PackageId(2))), 0);
    }

    #[test]
    fn test_location_filter() {
        let scoped = InventorySnapshot::for_location(catalog(), OUTLET);
        assert_eq!(scoped.available(SaleUnitRef::Product(ProductId(4))), 0);
        assert_eq!(scoped.location(), Some(OUTLET));

        let all = InventorySnapshot::unfiltered(catalog());
        assert_eq!(all.available(SaleUnitRef::Product(ProductId(4))), 40);
        assert_eq!(all.products().len(), 3);
    }

    #[test]
    fn test_sale_unit_carries_fresh_stock() {
        let snapshot = InventorySnapshot::for_location(catalog(), OUTLET);
        let unit = snapshot.sale_unit(SaleUnitRef::Package(PackageId(1))).unwrap();

        assert_eq!(unit.name, "Paket Hemat");
        assert_eq!(unit.price, Money::from_units(15_000));
        assert_eq!(unit.available_stock, 3);
        assert_eq!(unit.location_id, OUTLET);
    }

    #[test]
    fn test_listings_with_stock() {
        let snapshot = InventorySnapshot::for_location(catalog(), OUTLET);

        let packages = snapshot.packages_with_stock();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].available_stock, 3);
        assert_eq!(packages[1].available_stock, 0);

        let bundles = snapshot.bundles_with_stock();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].available_stock, 3);
    }

    #[test]
    fn test_inactive_bundle_is_hidden() {
        let mut catalog = catalog();
        catalog.bundles[0].is_active = false;
        let snapshot = InventorySnapshot::for_location(catalog, OUTLET);

        assert!(snapshot.bundles_with_stock().is_empty());
        assert_eq!(snapshot.available(SaleUnitRef::Bundle(BundleId(1))), 0);
    }

    #[test]
    fn test_revalidate_reports_every_short_line() {
        let snapshot = InventorySnapshot::for_location(catalog(), OUTLET);
        let line = |unit: SaleUnitRef, quantity: u64| {
            let mut line = CartLine::from_unit(&snapshot.sale_unit(unit).unwrap());
            line.quantity = quantity;
            line
        };

        let fits = Cart::from_lines([
            line(SaleUnitRef::Product(ProductId(1)), 10),
            line(SaleUnitRef::Package(PackageId(1)), 3),
        ]);
        assert!(snapshot.revalidate(&fits).is_ok());

        let mut stale = line(SaleUnitRef::Package(PackageId(1)), 4);
        stale.available_stock = 10;
        let short = Cart::from_lines([
            line(SaleUnitRef::Product(ProductId(1)), 11),
            line(SaleUnitRef::Product(ProductId(2)), 1),
            stale,
        ]);

        match snapshot.revalidate(&short) {
            Err(CoreError::StockConflict(conflicts)) => {
                assert_eq!(conflicts.len(), 2);
                assert_eq!(conflicts[0].unit, SaleUnitRef::Product(ProductId(1)));
                assert_eq!((conflicts[0].requested, conflicts[0].available), (11, 10));
                assert_eq!(conflicts[1].unit, SaleUnitRef::Package(PackageId(1)));
                assert_eq!((conflicts[1].requested, conflicts[1].available), (4, 3));
            }
            other => panic!("expected stock conflict, got {:?}", other),
        }
    }
}
