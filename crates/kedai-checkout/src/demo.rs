//! Sample catalog for the demo binary and tests.
//!
//! ```text
//! Outlet 1 "Kedai Pusat"
//!   prod-1 Nasi     Rp 5.000   stock 10
//!   prod-2 Teh      Rp 3.000   stock  9
//!   prod-3 Kerupuk  Rp 2.000   stock 20
//!   pkg-1  Paket Hemat     = 2 × Nasi + 3 × Teh              → 3
//!   bundle-1 Family Bundle = 2 × Kerupuk + 1 × Paket Hemat   → 3
//!
//! Outlet 2 "Kedai Cabang"
//!   prod-4 Kopi     Rp 6.000   stock 40
//! ```

use kedai_core::{
    AtomicProduct, Bundle, BundleComponent, BundleId, BundleItem, Catalog, Location, LocationId,
    Money, PackageComponent, PackageId, ProductId, ProductPackage,
};

/// The main outlet of the sample catalog.
pub const OUTLET: LocationId = LocationId(1);

/// A second outlet whose products must never reach outlet 1 carts.
pub const BRANCH: LocationId = LocationId(2);

/// Builds the sample catalog.
pub fn demo_catalog() -> Catalog {
    Catalog {
        products: vec![
            AtomicProduct::new(ProductId(1), "Nasi", Money::from_units(5_000), 10, OUTLET),
            AtomicProduct::new(ProductId(2), "Teh", Money::from_units(3_000), 9, OUTLET),
            AtomicProduct::new(ProductId(3), "Kerupuk", Money::from_units(2_000), 20, OUTLET),
            AtomicProduct::new(ProductId(4), "Kopi", Money::from_units(6_000), 40, BRANCH),
        ],
        packages: vec![ProductPackage {
            id: PackageId(1),
            name: "Paket Hemat".to_string(),
            price: Money::from_units(15_000),
            components: vec![
                PackageComponent {
                    product_id: ProductId(1),
                    quantity: 2,
                },
                PackageComponent {
                    product_id: ProductId(2),
                    quantity: 3,
                },
            ],
            location_id: OUTLET,
            is_active: true,
        }],
        bundles: vec![Bundle {
            id: BundleId(1),
            name: "Family Bundle".to_string(),
            price: Money::from_units(40_000),
            items: vec![
                BundleItem {
                    component: BundleComponent::Product(ProductId(3)),
                    quantity: 2,
                },
                BundleItem {
                    component: BundleComponent::Package(PackageId(1)),
                    quantity: 1,
                },
            ],
            location_id: OUTLET,
            is_active: true,
        }],
        locations: vec![
            Location {
                id: OUTLET,
                name: "Kedai Pusat".to_string(),
                address: "Jl. Merdeka 1".to_string(),
                is_active: true,
            },
            Location {
                id: BRANCH,
                name: "Kedai Cabang".to_string(),
                address: "Jl. Sudirman 12".to_string(),
                is_active: true,
            },
        ],
    }
}
