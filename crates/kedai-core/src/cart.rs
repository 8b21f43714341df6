//! # Cart
//!
//! The cart reducer: an ordered list of [`CartLine`]s, clamped against the
//! stock the UI last saw for each unit.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Frontend Action          Cart method              Outcome              │
//! │  ───────────────          ───────────              ───────              │
//! │                                                                         │
//! │  Tap product ───────────► add_to_cart() ─────────► Applied / NoOp      │
//! │                                                                         │
//! │  + / − buttons ─────────► update_quantity() ─────► Applied / Removed   │
//! │                                                    / NoOp               │
//! │                                                                         │
//! │  Trash icon ────────────► remove_from_cart() ────► Removed / NoOp      │
//! │                                                                         │
//! │  After checkout ────────► clear() ───────────────► Removed / NoOp      │
//! │                                                                         │
//! │  Exhausted stock is an expected condition: it yields NoOp, never Err.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per [`SaleUnitRef`]
//! - Every line has `1 <= quantity <= available_stock` (as of its last clamp)
//! - The total is recomputed from the lines on every call, never cached

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CartLine, SaleUnit, SaleUnitRef};
use crate::MAX_CART_LINES;

// =============================================================================
// Outcomes
// =============================================================================

/// Why a cart operation left the cart unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", tag = "reason")]
#[ts(export)]
pub enum NoOpReason {
    /// The unit has no sellable stock.
    OutOfStock,
    /// The requested quantity is above the available stock.
    ExceedsAvailable { requested: u64, available: u64 },
    /// No line exists for the unit.
    NotInCart,
    /// The cart already holds the maximum number of distinct lines.
    CartFull { max: usize },
    /// A zero delta was requested.
    NothingToChange,
}

/// Result of a cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", tag = "outcome")]
#[ts(export)]
pub enum CartOutcome {
    /// The line now holds `quantity` units.
    Applied { quantity: u64 },
    /// The line (or every line, for `clear`) was removed.
    Removed,
    /// Nothing changed.
    NoOp(NoOpReason),
}

impl CartOutcome {
    /// Returns true if the cart changed.
    pub fn changed(&self) -> bool {
        !matches!(self, CartOutcome::NoOp(_))
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Rebuilds a cart from previously persisted lines.
    ///
    /// Lines violating the invariants (zero quantity, duplicate key) are
    /// dropped; the first line for a key wins.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Cart::new();
        for line in lines {
            if line.quantity == 0 || cart.position(&line.unit).is_some() {
                continue;
            }
            cart.lines.push(line);
        }
        cart
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Finds the line for a unit.
    pub fn line(&self, unit: &SaleUnitRef) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.unit == *unit)
    }

    fn position(&self, unit: &SaleUnitRef) -> Option<usize> {
        self.lines.iter().position(|l| l.unit == *unit)
    }

    /// Adds one unit to the cart.
    ///
    /// ## Behavior
    /// - Line exists: +1 if the new quantity fits `unit.available_stock`;
    ///   the line's last-known stock is refreshed to that value
    /// - No line: created with quantity 1 if `available_stock > 0`
    /// - Anything else is a no-op
    pub fn add_to_cart(&mut self, unit: &SaleUnit) -> CartOutcome {
        if let Some(line) = self.lines.iter_mut().find(|l| l.unit == unit.unit) {
            let requested = line.quantity + 1;
            if requested > unit.available_stock {
                return CartOutcome::NoOp(NoOpReason::ExceedsAvailable {
                    requested,
                    available: unit.available_stock,
                });
            }
            line.quantity = requested;
            line.available_stock = unit.available_stock;
            return CartOutcome::Applied {
                quantity: requested,
            };
        }

        if unit.available_stock == 0 {
            return CartOutcome::NoOp(NoOpReason::OutOfStock);
        }

        if self.lines.len() >= MAX_CART_LINES {
            return CartOutcome::NoOp(NoOpReason::CartFull {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_unit(unit));
        CartOutcome::Applied { quantity: 1 }
    }

    /// Changes a line's quantity by `delta`.
    ///
    /// ## Behavior
    /// - New quantity above the line's available stock: no-op
    /// - New quantity <= 0: the line is removed
    /// - Otherwise the quantity is set
    pub fn update_quantity(&mut self, unit: &SaleUnitRef, delta: i64) -> CartOutcome {
        let Some(index) = self.position(unit) else {
            return CartOutcome::NoOp(NoOpReason::NotInCart);
        };
        if delta == 0 {
            return CartOutcome::NoOp(NoOpReason::NothingToChange);
        }

        let line = &mut self.lines[index];
        let requested = line.quantity as i128 + delta as i128;

        let outcome = if requested <= 0 {
            line.quantity = 0;
            CartOutcome::Removed
        } else if requested > line.available_stock as i128 {
            return CartOutcome::NoOp(NoOpReason::ExceedsAvailable {
                requested: u64::try_from(requested).unwrap_or(u64::MAX),
                available: line.available_stock,
            });
        } else {
            line.quantity = requested as u64;
            CartOutcome::Applied {
                quantity: line.quantity,
            }
        };

        self.lines.retain(|l| l.quantity > 0);
        outcome
    }

    /// Deletes the line for a unit.
    pub fn remove_from_cart(&mut self, unit: &SaleUnitRef) -> CartOutcome {
        match self.position(unit) {
            Some(index) => {
                self.lines.remove(index);
                CartOutcome::Removed
            }
            None => CartOutcome::NoOp(NoOpReason::NotInCart),
        }
    }

    /// Empties the cart.
    pub fn clear(&mut self) -> CartOutcome {
        if self.lines.is_empty() {
            return CartOutcome::NoOp(NoOpReason::NothingToChange);
        }
        self.lines.clear();
        CartOutcome::Removed
    }

    /// Returns the number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns the total quantity across lines.
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Σ(price × quantity), recomputed on every call.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart totals summary for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: u64,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
