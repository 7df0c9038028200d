//! # Inventory Planning
//!
//! Computes the per-product stock changes a sale operation implies, before
//! anything touches the database.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation   │ Delta per product                                        │
//! ├──────────────┼──────────────────────────────────────────────────────────┤
//! │  Create      │ -Σ new qty                                               │
//! │  Replace     │ Σ old qty - Σ new qty   (removed: +old, added: -new)     │
//! │  Delete      │ +Σ old qty                                               │
//! └──────────────┴──────────────────────────────────────────────────────────┘
//!
//!   Old: [{P1, 3}]              New: [{P1, 5}, {P2, 1}]
//!         │                            │
//!         └────────── diff ────────────┘
//!                      │
//!                      ▼
//!          StockPlan { P1: -2, P2: -1 }
//! ```
//!
//! Lines for the same product are summed first, so a sale with two lines
//! of one product moves stock exactly once per product. Zero deltas are
//! dropped. Movements are yielded in product-id order.

use std::collections::BTreeMap;

use crate::types::{SaleItem, SaleLine};

// =============================================================================
// Stock Policy
// =============================================================================

/// Whether a decrement may take stock below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockPolicy {
    /// Decrements fail with `InsufficientStock` when stock would go negative.
    #[default]
    Enforce,
    /// Decrements always apply; stock may go negative.
    AllowNegative,
}

// =============================================================================
// Stock Plan
// =============================================================================

/// One product's net stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockMovement {
    pub product_id: i64,
    /// Positive restores stock, negative consumes it.
    pub delta: i64,
}

impl StockMovement {
    pub const fn is_decrement(&self) -> bool {
        self.delta < 0
    }
}

/// Net stock changes keyed by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockPlan {
    deltas: BTreeMap<i64, i64>,
}

impl StockPlan {
    /// Stock consumed by a new sale.
    pub fn for_create(lines: &[SaleLine]) -> Self {
        let mut plan = StockPlan::default();
        for line in lines {
            plan.add(line.product_id, -line.quantity);
        }
        plan.prune();
        plan
    }

    /// Stock change when a sale's items are replaced wholesale.
    pub fn for_replace(old_items: &[SaleItem], new_lines: &[SaleLine]) -> Self {
        let mut plan = StockPlan::default();
        for item in old_items {
            plan.add(item.product_id, item.quantity);
        }
        for line in new_lines {
            plan.add(line.product_id, -line.quantity);
        }
        plan.prune();
        plan
    }

    /// Stock returned when a sale is deleted.
    pub fn for_delete(old_items: &[SaleItem]) -> Self {
        let mut plan = StockPlan::default();
        for item in old_items {
            plan.add(item.product_id, item.quantity);
        }
        plan.prune();
        plan
    }

    fn add(&mut self, product_id: i64, delta: i64) {
        *self.deltas.entry(product_id).or_insert(0) += delta;
    }

    fn prune(&mut self) {
        self.deltas.retain(|_, delta| *delta != 0);
    }

    /// Net change for one product (0 if untouched).
    pub fn delta_for(&self, product_id: i64) -> i64 {
        self.deltas.get(&product_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Movements in product-id order.
    pub fn movements(&self) -> impl Iterator<Item = StockMovement> + '_ {
        self.deltas
            .iter()
            .map(|(&product_id, &delta)| StockMovement { product_id, delta })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
