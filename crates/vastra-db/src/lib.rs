//! # vastra-db: Database Layer for Vastra POS
//!
//! SQLite storage for the shop: catalog, stock, sales and the transactions
//! that keep them consistent.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vastra POS Data Flow                             │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    vastra-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  SaleLedger   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ ProductImporter   │  (embedded)  │  │   │
//! │  │   │               │    │       │       │    │              │  │   │
//! │  │   │ SqlitePool    │    │       ▼       │    │ 001_initial  │  │   │
//! │  │   │ WAL, FKs      │◄───│ Repositories  │    │   _schema    │  │   │
//! │  │   │               │    │ catalog/      │    │              │  │   │
//! │  │   │               │    │ product/sale  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   data/kalan_vastralya.db                                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog, product and sale queries
//! - [`ledger`] - Sale create/replace/delete transactions
//! - [`import`] - Spreadsheet upsert by barcode
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vastra_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("data/kalan_vastralya.db")).await?;
//!
//! let sale = db.ledger().create(&new_sale).await?;
//! let today = db.sales().list(&SaleFilter { date: Some(today), ..Default::default() }).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod import;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use import::ProductImporter;
pub use ledger::{SaleLedger, ShopClock};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::catalog::{CatalogEntry, CatalogKind, CatalogRepository};
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
