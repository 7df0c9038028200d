//! # vastra-core: Pure Business Logic for Vastra POS
//!
//! Domain types and rules for the shop's point of sale, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vastra POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend                                 │   │
//! │  │    Inventory ──► New Sale (scan) ──► Bill/Estimate ──► Report   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP/JSON                              │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vastra-server (axum)                         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vastra-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ numbering │  │ inventory │  │   │
//! │  │   │  Product  │  │   Money   │  │ BILL-0001 │  │ StockPlan │  │   │
//! │  │   │   Sale    │  │  (paise)  │  │ EST-0001  │  │  deltas   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vastra-db (Database Layer)                   │   │
//! │  │          SQLite queries, migrations, sale ledger, import        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, filters)
//! - [`money`] - Money type with integer paise arithmetic
//! - [`numbering`] - Bill/estimate document numbers
//! - [`inventory`] - Per-product stock delta planning for sale operations
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use vastra_core::money::Money;
//! use vastra_core::numbering::DocumentNumber;
//! use vastra_core::types::SaleType;
//!
//! let price = Money::from_rupees(2000);
//! assert_eq!((price * 2).paise(), 400_000);
//!
//! let first = DocumentNumber::first(SaleType::Bill);
//! assert_eq!(first.to_string(), "BILL-0001");
//! assert_eq!(first.next().to_string(), "BILL-0002");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod money;
pub mod numbering;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use inventory::{StockMovement, StockPlan, StockPolicy};
pub use money::Money;
pub use numbering::DocumentNumber;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Customer name stored when a sale is created without one.
pub const WALK_IN_CUSTOMER: &str = "Walk In Customer";

/// Maximum number of lines on a single bill or estimate.
///
/// ## Business Reason
/// Prevents runaway requests; a counter sale never comes close.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity on a single sale line.
///
/// ## Business Reason
/// Catches typos (1000 instead of 10) at the API boundary.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price or total accepted, in whole rupees (₹10 crore).
///
/// Keeps `price × MAX_ITEM_QUANTITY × MAX_SALE_LINES` well inside i64 paise.
pub const MAX_PRICE_RUPEES: i64 = 100_000_000;
