//! # Domain Types
//!
//! Core domain types used throughout Vastra POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  sale_id (FK)   │       │
//! │  │  barcode (uniq) │   │  type           │   │  product_id     │       │
//! │  │  quantity       │   │  number (uniq)  │   │  category_name  │       │
//! │  │  cost/sale      │   │  customer_*     │   │  sale_price     │       │
//! │  │  category_id    │   │  date           │   │  quantity       │       │
//! │  │  manufacturer_id│   │  totals         │   │  item_final_... │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │    SaleType     │   │  PaymentMode    │       │
//! │  │  Manufacturer   │   │  Bill           │   │  Cash           │       │
//! │  │  id + name      │   │  Estimate       │   │  Upi            │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `SaleItem` copies `category_name` and `sale_price` at the time the line
//! was written. Later product edits never change an issued bill. The barcode
//! is the exception: it is joined in at read time and is absent when the
//! product row is gone.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Catalog
// =============================================================================

/// A product category ("Sarees", "Kurtis", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A manufacturer or supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Manufacturer {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Product
// =============================================================================

/// A stocked product, identified at the counter by its barcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Unique business identifier printed on the tag.
    pub barcode: String,

    pub category_id: i64,

    pub manufacturer_id: i64,

    /// Units in stock. Only goes negative under the permissive stock policy.
    pub quantity: i64,

    /// Purchase price in rupees.
    #[ts(type = "number")]
    pub cost_price: Money,

    /// Shelf price in rupees.
    #[ts(type = "number")]
    pub sale_price: Money,
}

/// Product joined with its category and manufacturer names.
///
/// This is what the inventory screen lists and what a barcode scan returns.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductView {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub product: Product,

    /// Category name.
    pub category: String,

    /// Manufacturer name.
    pub manufacturer: String,
}

/// Everything about a product except its barcode.
///
/// Admin edits and import re-runs overwrite all of these at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductChanges {
    pub category_id: i64,
    pub manufacturer_id: i64,
    pub quantity: i64,
    pub cost_price: Money,
    pub sale_price: Money,
}

/// A product to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub barcode: String,
    pub fields: ProductChanges,
}

// =============================================================================
// Sale Type
// =============================================================================

/// Kind of sale document. Each kind has its own number sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleType {
    /// Tax invoice handed to the customer.
    Bill,
    /// Quotation; still moves stock like a bill.
    Estimate,
}

impl SaleType {
    pub const ALL: [SaleType; 2] = [SaleType::Bill, SaleType::Estimate];

    /// Number prefix (`BILL`, `EST`).
    pub const fn prefix(&self) -> &'static str {
        match self {
            SaleType::Bill => "BILL",
            SaleType::Estimate => "EST",
        }
    }

    /// Value stored in `sales.type`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleType::Bill => "bill",
            SaleType::Estimate => "estimate",
        }
    }
}

impl fmt::Display for SaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bill" => Ok(SaleType::Bill),
            "estimate" => Ok(SaleType::Estimate),
            _ => Err(ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: SaleType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Upi,
}

impl PaymentMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
        }
    }
}

impl FromStr for PaymentMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "upi" => Ok(PaymentMode::Upi),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_mode".to_string(),
                allowed: vec!["cash".to_string(), "upi".to_string()],
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// Sale timestamps travel as `YYYY-MM-DD HH:MM:SS` shop-local wall-clock text.
pub mod sale_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Sale header: one bill or estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,

    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub sale_type: SaleType,

    /// `BILL-0001`, `EST-0042`, ...
    pub number: String,

    pub customer_name: String,
    pub mobile: Option<String>,
    pub customer_address: Option<String>,
    pub customer_gstin: Option<String>,
    pub payment_mode: Option<PaymentMode>,
    pub remarks: Option<String>,

    /// Set once on create, never changed by edits.
    #[serde(with = "sale_timestamp")]
    #[ts(as = "String")]
    pub date: NaiveDateTime,

    #[ts(type = "number")]
    pub total_amount: Money,
    #[ts(type = "number")]
    pub total_discount: Money,
    /// Stored as given; the counter may round it.
    #[ts(type = "number")]
    pub final_amount: Money,
}

/// A persisted line of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    /// Category name at time of sale (frozen).
    pub category_name: String,
    /// Unit price at time of sale (frozen).
    #[ts(type = "number")]
    pub sale_price: Money,
    pub quantity: i64,
    /// `sale_price × quantity` when the row was written.
    #[ts(type = "number")]
    pub item_final_price: Money,
    /// Current barcode of the product, if it still exists.
    pub barcode: Option<String>,
}

/// Sale header plus its items, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Sale header with its line count, one row of the sales export.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleSummary {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub sale: Sale,
    pub item_count: i64,
}

// =============================================================================
// Sale Input
// =============================================================================

/// One requested line of a new or revised sale.
///
/// The same product may appear on several lines (e.g. different discounts
/// agreed at the counter); stock is planned on the aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLine {
    pub product_id: i64,
    pub category_name: String,
    pub sale_price: Money,
    pub quantity: i64,
}

impl SaleLine {
    /// `sale_price × quantity`, always computed here, never taken from the client.
    #[inline]
    pub fn item_final_price(&self) -> Money {
        self.sale_price.multiply_quantity(self.quantity)
    }
}

/// Customer block of a new sale. All optional; blank name becomes walk-in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub gstin: Option<String>,
}

impl CustomerDetails {
    /// Name to store, falling back to [`crate::WALK_IN_CUSTOMER`].
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => crate::WALK_IN_CUSTOMER.to_string(),
        }
    }
}

/// Header totals as supplied by the client. Missing values get defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaleTotals {
    pub total_amount: Option<Money>,
    pub total_discount: Option<Money>,
    pub final_amount: Option<Money>,
}

/// Totals as they will be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTotals {
    pub total_amount: Money,
    pub total_discount: Money,
    pub final_amount: Money,
}

impl SaleTotals {
    /// Fills in missing totals.
    ///
    /// ```text
    /// total_amount   = given  or Σ item_final_price
    /// total_discount = given  or 0
    /// final_amount   = given  or total_amount - total_discount
    /// ```
    ///
    /// Given values are kept as-is, even when they do not add up.
    pub fn resolve(&self, lines: &[SaleLine]) -> ResolvedTotals {
        let total_amount = self
            .total_amount
            .unwrap_or_else(|| lines.iter().map(SaleLine::item_final_price).sum());
        let total_discount = self.total_discount.unwrap_or_default();
        let final_amount = self
            .final_amount
            .unwrap_or(total_amount - total_discount);

        ResolvedTotals {
            total_amount,
            total_discount,
            final_amount,
        }
    }
}

/// A validated request to create a sale.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub sale_type: SaleType,
    pub customer: CustomerDetails,
    pub payment_mode: Option<PaymentMode>,
    pub remarks: Option<String>,
    pub totals: SaleTotals,
    pub lines: Vec<SaleLine>,
}

/// A validated full replacement of a sale's totals and lines.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRevision {
    pub totals: SaleTotals,
    pub lines: Vec<SaleLine>,
}

// =============================================================================
// Sale Query
// =============================================================================

/// Filters for listing sales. All optional and composable.
///
/// `date` matches one calendar day and wins over `start_date`/`end_date`.
/// The range is inclusive and may be open on either side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilter {
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sale_type: Option<SaleType>,
    /// Case-insensitive substring of customer name or mobile.
    pub search: Option<String>,
}

// =============================================================================
// Import
// =============================================================================

/// Raw text of one spreadsheet data row, keyed by the required columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportCells {
    pub barcode: String,
    pub category: String,
    pub manufacturer: String,
    pub quantity: String,
    pub cost_price: String,
    pub sale_price: String,
}

/// Column headers an import sheet must carry.
pub const IMPORT_COLUMNS: [&str; 6] = [
    "barcode",
    "category",
    "manufacturer",
    "quantity",
    "cost_price",
    "sale_price",
];

/// A parsed import row, ready to upsert by barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUpsert {
    pub barcode: String,
    pub category: String,
    pub manufacturer: String,
    pub quantity: i64,
    pub cost_price: Money,
    pub sale_price: Money,
}

/// Outcome of one import row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// A failed import row. `row` is the 1-based data row (header excluded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ImportRowError {
    pub row: usize,
    pub error: String,
}

/// Summary of an import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ImportReport {
    pub inserted: usize,
    pub updated: usize,
    pub errors: Vec<ImportRowError>,
}

impl ImportReport {
    /// Rows that made it into the database.
    pub fn imported(&self) -> usize {
        self.inserted + self.updated
    }

    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
