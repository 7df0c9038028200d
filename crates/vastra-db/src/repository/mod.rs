//! # Repository Module
//!
//! SQL for each table group, kept out of the ledger and the handlers.
//!
//! ## Two Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pool methods (&self)                 Executor functions (no self)      │
//! │  ────────────────────                 ───────────────────────────       │
//! │  db.products().list()                 ProductRepository::insert(&mut *tx, ..)
//! │  db.sales().detail(id)                SaleRepository::last_number(&mut *tx, ..)
//! │  db.catalog().create(kind, name)      CatalogRepository::get_or_create(conn, ..)
//! │       │                                        │                        │
//! │       ▼                                        ▼                        │
//! │  one statement, own connection        caller's transaction              │
//! │  (handlers, reports)                  (SaleLedger, ProductImporter)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Categories and manufacturers
//! - [`ProductRepository`](product::ProductRepository) - Products and stock movements
//! - [`SaleRepository`](sale::SaleRepository) - Sale headers, items and report queries

pub mod catalog;
pub mod product;
pub mod sale;
