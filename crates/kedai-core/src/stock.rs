//! # Composite Stock Resolver
//!
//! Computes how many packages and bundles can be sold right now from the
//! atomic product stock counts.
//!
//! ## Bottleneck Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Paket Hemat = 2 × Nasi + 3 × Teh                                       │
//! │                                                                         │
//! │    Nasi: stock 10 / 2 = 5 packages                                      │
//! │    Teh:  stock  9 / 3 = 3 packages   ◄── bottleneck                     │
//! │                                                                         │
//! │    package_stock = min(5, 3) = 3                                        │
//! │                                                                         │
//! │  Family Bundle = 2 × Kerupuk + 1 × Paket Hemat                          │
//! │                                                                         │
//! │    Kerupuk:     stock 20 / 2 = 10                                       │
//! │    Paket Hemat: derived 3 / 1 = 3    ◄── bottleneck                     │
//! │                                                                         │
//! │    bundle_stock = min(10, 3) = 3                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Division is integer floor division: you cannot sell 1.5 packages.
//!
//! ## Broken References
//! A single missing, soft-deleted or inactive reference zeroes the whole
//! composite unit; it does not just drop out of the minimum. The same goes
//! for a component quantity of zero and for an empty definition.
//!
//! All functions are pure. Callers may recompute on every read.

use std::collections::HashMap;

use crate::types::{
    AtomicProduct, Bundle, BundleComponent, BundleId, PackageId, ProductId, ProductPackage,
};

/// Lookup from product id to product record.
pub type ProductIndex = HashMap<ProductId, AtomicProduct>;

/// Lookup from package id to package definition.
pub type PackageIndex = HashMap<PackageId, ProductPackage>;

/// Builds a [`ProductIndex`] from product records.
pub fn index_products(products: impl IntoIterator<Item = AtomicProduct>) -> ProductIndex {
    products.into_iter().map(|p| (p.id, p)).collect()
}

/// Builds a [`PackageIndex`] from package definitions.
pub fn index_packages(packages: impl IntoIterator<Item = ProductPackage>) -> PackageIndex {
    packages.into_iter().map(|p| (p.id, p)).collect()
}

/// Units of a composite that `available` supports when each needs `per_unit`.
///
/// `None` for a zero requirement, which is an invalid definition.
#[inline]
fn ratio(available: u64, per_unit: u64) -> Option<u64> {
    available.checked_div(per_unit)
}

/// Calculates the sellable stock of a package.
///
/// ## Rules
/// - Any component product missing or soft-deleted → 0 (short-circuit)
/// - Otherwise min over components of `stock / quantity` (floor)
/// - Empty component list → 0
///
/// ## Example
/// ```rust
/// use kedai_core::stock::{index_products, package_stock};
/// use kedai_core::{AtomicProduct, LocationId, Money, PackageComponent, PackageId, ProductId, ProductPackage};
///
/// let outlet = LocationId(1);
/// let products = index_products([
///     AtomicProduct::new(ProductId(1), "Nasi", Money::from_units(5_000), 10, outlet),
///     AtomicProduct::new(ProductId(2), "Teh", Money::from_units(3_000), 9, outlet),
/// ]);
/// let pkg = ProductPackage {
///     id: PackageId(1),
///     name: "Paket Hemat".into(),
///     price: Money::from_units(15_000),
///     components: vec![
///         PackageComponent { product_id: ProductId(1), quantity: 2 },
///         PackageComponent { product_id: ProductId(2), quantity: 3 },
///     ],
///     location_id: outlet,
///     is_active: true,
/// };
/// assert_eq!(package_stock(&pkg, &products), 3);
/// ```
pub fn package_stock(pkg: &ProductPackage, products: &ProductIndex) -> u64 {
    let mut bottleneck: Option<u64> = None;

    for component in &pkg.components {
        let product = match products.get(&component.product_id) {
            Some(product) if !product.is_deleted => product,
            _ => return 0,
        };

        let Some(possible) = ratio(product.stock, component.quantity) else {
            return 0;
        };

        bottleneck = Some(bottleneck.map_or(possible, |min| min.min(possible)));
    }

    bottleneck.unwrap_or(0)
}

/// Calculates the sellable stock of a bundle.
///
/// ## Rules
/// - Package item: package missing or inactive → 0, else its
///   [`package_stock`] is the available quantity
/// - Product item: product missing or soft-deleted → 0, else raw stock
/// - Min over items of `available / quantity` (floor)
/// - Empty item list → 0
pub fn bundle_stock(bundle: &Bundle, products: &ProductIndex, packages: &PackageIndex) -> u64 {
    let mut bottleneck: Option<u64> = None;

    for item in &bundle.items {
        let available = match item.component {
            BundleComponent::Package(package_id) => match packages.get(&package_id) {
                Some(pkg) if pkg.is_active => package_stock(pkg, products),
                _ => return 0,
            },
            BundleComponent::Product(product_id) => match products.get(&product_id) {
                Some(product) if !product.is_deleted => product.stock,
                _ => return 0,
            },
        };

        let Some(possible) = ratio(available, item.quantity) else {
            return 0;
        };

        bottleneck = Some(bottleneck.map_or(possible, |min| min.min(possible)));
    }

    bottleneck.unwrap_or(0)
}

/// Calculates stock for multiple packages at once.
pub fn packages_stock<'a>(
    packages: impl IntoIterator<Item = &'a ProductPackage>,
    products: &ProductIndex,
) -> HashMap<PackageId, u64> {
    packages
        .into_iter()
        .map(|pkg| (pkg.id, package_stock(pkg, products)))
        .collect()
}

/// Calculates stock for multiple bundles at once.
pub fn bundles_stock<'a>(
    bundles: impl IntoIterator<Item = &'a Bundle>,
    products: &ProductIndex,
    packages: &PackageIndex,
) -> HashMap<BundleId, u64> {
    bundles
        .into_iter()
        .map(|bundle| (bundle.id, bundle_stock(bundle, products, packages)))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{BundleItem, LocationId, PackageComponent};

    const OUTLET: LocationId = LocationId(1);

    fn product(id: u64, stock: u64) -> AtomicProduct {
        AtomicProduct::new(ProductId(id), format!("Product {}", id), Money::from_units(1_000), stock, OUTLET)
    }

    fn deleted(id: u64, stock: u64) -> AtomicProduct {
        AtomicProduct {
            is_deleted: true,
            ..product(id, stock)
        }
    }

    fn package(id: u64, components: &[(u64, u64)]) -> ProductPackage {
        ProductPackage {
            id: PackageId(id),
            name: format!("Package {}", id),
            price: Money::from_units(10_000),
            components: components
                .iter()
                .map(|&(product_id, quantity)| PackageComponent {
                    product_id: ProductId(product_id),
                    quantity,
                })
                .collect(),
            location_id: OUTLET,
            is_active: true,
        }
    }

    fn bundle(id: u64, items: Vec<BundleItem>) -> Bundle {
        Bundle {
            id: BundleId(id),
            name: format!("Bundle {}", id),
            price: Money::from_units(50_000),
            items,
            location_id: OUTLET,
            is_active: true,
        }
    }

    fn product_item(id: u64, quantity: u64) -> BundleItem {
        BundleItem {
            component: BundleComponent::Product(ProductId(id)),
            quantity,
        }
    }

    fn package_item(id: u64, quantity: u64) -> BundleItem {
        BundleItem {
            component: BundleComponent::Package(PackageId(id)),
            quantity,
        }
    }

    #[test]
    fn test_single_component_floors() {
        for (stock, qty, expected) in [(10, 3, 3), (9, 3, 3), (2, 3, 0)] {
            let products = index_products([product(1, stock)]);
            let pkg = package(1, &[(1, qty)]);
            assert_eq!(package_stock(&pkg, &products), expected, "stock {stock}, qty {qty}");
        }
    }

    #[test]
    fn test_bottleneck_component_wins() {
        let products = index_products([product(1, 10), product(2, 9)]);
        let pkg = package(1, &[(1, 2), (2, 3)]);
        assert_eq!(package_stock(&pkg, &products), 3);
    }

    #[test]
    fn test_broken_component_zeroes_package() {
        let plenty = product(1, 1_000);

        let missing = index_products([plenty.clone()]);
        assert_eq!(package_stock(&package(1, &[(1, 1), (2, 1)]), &missing), 0);

        let with_deleted = index_products([plenty, deleted(2, 1_000)]);
        assert_eq!(package_stock(&package(1, &[(1, 1), (2, 1)]), &with_deleted), 0);
    }

    #[test]
    fn test_empty_and_zero_quantity_packages() {
        let products = index_products([product(1, 10)]);
        assert_eq!(package_stock(&package(1, &[]), &products), 0);
        assert_eq!(package_stock(&package(1, &[(1, 0)]), &products), 0);
    }

    #[test]
    fn test_bundle_mixes_product_and_package() {
        // Product 1: 20 / 2 = 10. Package 5 = 3 (product 2: 3 / 1), taken once.
        let products = index_products([product(1, 20), product(2, 3)]);
        let packages = index_packages([package(5, &[(2, 1)])]);
        let b = bundle(1, vec![product_item(1, 2), package_item(5, 1)]);

        assert_eq!(bundle_stock(&b, &products, &packages), 3);
    }

    #[test]
    fn test_bundle_package_quantity_divides_derived_stock() {
        let products = index_products([product(1, 100), product(2, 14)]);
        let packages = index_packages([package(5, &[(2, 2)])]); // 7 packages
        let b = bundle(1, vec![product_item(1, 1), package_item(5, 2)]);

        assert_eq!(bundle_stock(&b, &products, &packages), 3);
    }

    #[test]
    fn test_bundle_broken_references_zero_it() {
        let products = index_products([product(1, 50), deleted(2, 50)]);
        let mut inactive = package(6, &[(1, 1)]);
        inactive.is_active = false;
        let packages = index_packages([package(5, &[(1, 1)]), inactive]);

        let cases = [
            vec![product_item(1, 1), product_item(2, 1)], // deleted product
            vec![product_item(1, 1), product_item(3, 1)], // missing product
            vec![product_item(1, 1), package_item(6, 1)], // inactive package
            vec![product_item(1, 1), package_item(9, 1)], // missing package
            vec![],                                       // empty bundle
            vec![product_item(1, 0)],                     // zero requirement
        ];
        for items in cases {
            let b = bundle(1, items.clone());
            assert_eq!(bundle_stock(&b, &products, &packages), 0, "items {:?}", items);
        }
    }

    #[test]
    fn test_bundle_through_package_with_deleted_component() {
        let products = index_products([product(1, 50), deleted(2, 50)]);
        let packages = index_packages([package(5, &[(1, 1), (2, 1)])]);
        let b = bundle(1, vec![product_item(1, 1), package_item(5, 1)]);

        assert_eq!(bundle_stock(&b, &products, &packages), 0);
    }

    #[test]
    fn test_batch_variants_match_single_calls() {
        let products = index_products([product(1, 10), product(2, 9)]);
        let pkgs = vec![package(1, &[(1, 2)]), package(2, &[(2, 3)]), package(3, &[(4, 1)])];
        let packages = index_packages(pkgs.clone());

        let stock = packages_stock(&pkgs, &products);
        assert_eq!(stock[&PackageId(1)], 5);
        assert_eq!(stock[&PackageId(2)], 3);
        assert_eq!(stock[&PackageId(3)], 0);

        let bundles = vec![
            bundle(1, vec![package_item(1, 1), package_item(2, 1)]),
            bundle(2, vec![product_item(1, 5)]),
        ];
        let forward = bundles_stock(&bundles, &products, &packages);
        let backward = bundles_stock(bundles.iter().rev(), &products, &packages);
        assert_eq!(forward, backward);
        assert_eq!(forward[&BundleId(1)], 3);
        assert_eq!(forward[&BundleId(2)], 2);
    }

    #[test]
    fn test_unrelated_bundle_mutation_does_not_leak() {
        let products = index_products([product(1, 12), product(2, 8)]);
        let packages = PackageIndex::new();
        let watched = bundle(1, vec![product_item(1, 4)]);
        let mut other = bundle(2, vec![product_item(2, 1)]);

        let before = bundle_stock(&watched, &products, &packages);
        other.items.push(product_item(1, 12));
        other.is_active = false;
        let _ = bundle_stock(&other, &products, &packages);
        let after = bundle_stock(&watched, &products, &packages);

        assert_eq!(before, 3);
        assert_eq!(before, after);
    }
}
