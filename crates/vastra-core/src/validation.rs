//! # Validation Module
//!
//! Input validation utilities for Vastra POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (vastra-server)                                 │
//! │  ├── JSON shape, required fields present                               │
//! │  └── Calls THIS MODULE before opening any transaction                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Barcode / names non-empty and bounded                             │
//! │  ├── Quantities and prices in range                                    │
//! │  └── Sale has 1..=MAX_SALE_LINES lines                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE constraints                                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vastra_core::validation::{validate_barcode, validate_quantity};
//!
//! let barcode = validate_barcode("  SAR-0042 ").unwrap();
//! assert_eq!(barcode, "SAR-0042");
//!
//! assert!(validate_quantity(3).is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{ImportCells, ProductUpsert, SaleLine};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_RUPEES, MAX_SALE_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_BARCODE_LEN: usize = 64;
const MAX_NAME_LEN: usize = 100;
const MAX_SEARCH_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product barcode and returns it trimmed.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
pub fn validate_barcode(barcode: &str) -> ValidationResult<String> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::required("barcode"));
    }

    if barcode.chars().count() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    Ok(barcode.to_string())
}

/// Validates a category or manufacturer name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use vastra_core::validation::validate_catalog_name;
///
/// assert_eq!(validate_catalog_name("category", " Sarees ").unwrap(), "Sarees");
/// assert!(validate_catalog_name("manufacturer", "").is_err());
/// ```
pub fn validate_catalog_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Normalizes a sales search term. Blank means "no filter".
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok((!query.is_empty()).then(|| query.to_string()))
}

/// Parses a `YYYY-MM-DD` report date.
///
/// ```rust
/// use vastra_core::validation::parse_report_date;
///
/// assert!(parse_report_date("date", "2024-01-01").is_ok());
/// assert!(parse_report_date("date", "01/01/2024").is_err());
/// ```
pub fn parse_report_date(field: &str, text: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::invalid_format(field, "expected YYYY-MM-DD"))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the quantity of one sale line.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  New Sale: scan barcode, set quantity 3                                 │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(3) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0?  → "quantity must be positive"                      │
/// │       ├── qty > 999? → "quantity must be between 1 and 999"            │
/// │       └── OK → line accepted                                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level set by an admin or an import. Zero is allowed.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a price. Zero is allowed (free items, samples).
///
/// The upper bound keeps line and sale totals from overflowing.
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() || price > Money::from_rupees(MAX_PRICE_RUPEES) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_RUPEES,
        });
    }

    Ok(())
}

// =============================================================================
// Sale Validators
// =============================================================================

/// Validates the lines of a new or revised sale.
///
/// ## Rules
/// - At least one line, at most MAX_SALE_LINES (100)
/// - Each line names a product, a category and a non-negative price
/// - Each quantity within 1..=MAX_ITEM_QUANTITY
pub fn validate_sale_lines(lines: &[SaleLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptySale);
    }

    if lines.len() > MAX_SALE_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_SALE_LINES,
        });
    }

    for line in lines {
        if line.product_id <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "product_id".to_string(),
            }
            .into());
        }
        if line.category_name.trim().is_empty() {
            return Err(ValidationError::required("category_name").into());
        }
        validate_price("sale_price", line.sale_price)?;
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Import Validators
// =============================================================================

/// Parses a whole-number cell. Spreadsheets often store `12` as `12.0`.
fn parse_whole_number(field: &str, text: &str) -> ValidationResult<i64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationError::required(field));
    }
    if let Ok(n) = text.parse::<i64>() {
        return Ok(n);
    }
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Ok(n as i64),
        _ => Err(ValidationError::invalid_format(field, "must be a whole number")),
    }
}

fn parse_price_cell(field: &str, text: &str) -> ValidationResult<Money> {
    if text.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    let price = Money::parse_rupees(text)
        .ok_or_else(|| ValidationError::invalid_format(field, "must be a number"))?;
    validate_price(field, price)?;
    Ok(price)
}

/// Turns the raw cells of an import row into an upsert.
///
/// ## Example
/// ```rust
/// use vastra_core::types::ImportCells;
/// use vastra_core::validation::parse_import_row;
///
/// let cells = ImportCells {
///     barcode: "SAR-0001".into(),
///     category: "Sarees".into(),
///     manufacturer: "Kanchi Weavers".into(),
///     quantity: "12".into(),
///     cost_price: "1400".into(),
///     sale_price: "1999.5".into(),
/// };
/// let row = parse_import_row(&cells).unwrap();
/// assert_eq!(row.quantity, 12);
/// assert_eq!(row.sale_price.paise(), 199_950);
/// ```
pub fn parse_import_row(cells: &ImportCells) -> ValidationResult<ProductUpsert> {
    let barcode = validate_barcode(&cells.barcode)?;
    let category = validate_catalog_name("category", &cells.category)?;
    let manufacturer = validate_catalog_name("manufacturer", &cells.manufacturer)?;

    let quantity = parse_whole_number("quantity", &cells.quantity)?;
    validate_stock_quantity(quantity)?;

    let cost_price = parse_price_cell("cost_price", &cells.cost_price)?;
    let sale_price = parse_price_cell("sale_price", &cells.sale_price)?;

    Ok(ProductUpsert {
        barcode,
        category,
        manufacturer,
        quantity,
        cost_price,
        sale_price,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
