//! # Spreadsheet Codec
//!
//! Reads uploaded import sheets and writes the product and sales exports.
//!
//! ```text
//! upload (.xlsx/.xls/.ods) ── calamine ──► first sheet
//!                                           │ row 1: headers, any order
//!                                           │ rows 2..: cells as text
//!                                           ▼
//!                                   Vec<ImportCells>  ──► ProductImporter
//!
//! products / sales ── rust_xlsxwriter ──► .xlsx bytes ──► attachment
//! ```
//!
//! Cells are read as their display text (`12`, `1999.5`, `SAR-0001`) and
//! parsed by the importer's row validation, so a number typed as text and
//! a numeric cell import the same way.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use vastra_core::types::sale_timestamp;
use vastra_core::{ImportCells, ProductView, SaleSummary, IMPORT_COLUMNS};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Sales export header row.
pub const SALES_EXPORT_COLUMNS: [&str; 12] = [
    "date",
    "number",
    "type",
    "customer_name",
    "mobile",
    "customer_address",
    "customer gstin",
    "items",
    "total_amount",
    "total_discount",
    "final_amount",
    "payment_mode",
];

pub const NO_SALES_MESSAGE: &str = "No sales found to export";

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Excel file is empty")]
    Empty,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Could not read spreadsheet: {0}")]
    Unreadable(String),

    #[error("Could not write spreadsheet: {0}")]
    Write(String),
}

impl From<XlsxError> for SheetError {
    fn from(err: XlsxError) -> Self {
        SheetError::Write(err.to_string())
    }
}

// =============================================================================
// Import
// =============================================================================

/// Reads the first sheet of an uploaded workbook into import rows.
///
/// ## Errors
/// - `Empty` when the sheet has no header or no data rows
/// - `MissingColumns` listing every required header that is absent
pub fn read_import_sheet(bytes: &[u8]) -> Result<Vec<ImportCells>, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| SheetError::Unreadable(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SheetError::Empty)?
        .map_err(|e| SheetError::Unreadable(e.to_string()))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or(SheetError::Empty)?
        .iter()
        .map(|cell| cell_text(cell))
        .collect();

    let mut positions = [0usize; IMPORT_COLUMNS.len()];
    let mut missing = Vec::new();
    for (slot, column) in positions.iter_mut().zip(IMPORT_COLUMNS) {
        match header.iter().position(|h| h == column) {
            Some(index) => *slot = index,
            None => missing.push(column.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(SheetError::MissingColumns(missing));
    }

    let cells: Vec<ImportCells> = rows
        .filter(|row| row.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|row| {
            let at = |column: usize| row.get(positions[column]).map(cell_text).unwrap_or_default();
            ImportCells {
                barcode: at(0),
                category: at(1),
                manufacturer: at(2),
                quantity: at(3),
                cost_price: at(4),
                sale_price: at(5),
            }
        })
        .collect();

    if cells.is_empty() {
        return Err(SheetError::Empty);
    }

    Ok(cells)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        other => other.to_string(),
    }
}

// =============================================================================
// Export
// =============================================================================

/// Product export: the same columns an import expects, so an export can be
/// edited and uploaded back.
pub fn write_products(products: &[ProductView]) -> Result<Vec<u8>, SheetError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Products")?;
    write_header(sheet, &IMPORT_COLUMNS)?;

    for (index, view) in products.iter().enumerate() {
        let row = row_number(index)?;
        let product = &view.product;

        sheet.write_string(row, 0, &product.barcode)?;
        sheet.write_string(row, 1, &view.category)?;
        sheet.write_string(row, 2, &view.manufacturer)?;
        sheet.write_number(row, 3, product.quantity as f64)?;
        sheet.write_number(row, 4, product.cost_price.as_decimal_rupees())?;
        sheet.write_number(row, 5, product.sale_price.as_decimal_rupees())?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Sales export. An empty result still produces a sheet, with a single
/// message row under the header.
pub fn write_sales(sales: &[SaleSummary]) -> Result<Vec<u8>, SheetError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sales")?;
    write_header(sheet, &SALES_EXPORT_COLUMNS)?;

    if sales.is_empty() {
        sheet.write_string(1, 0, NO_SALES_MESSAGE)?;
        return Ok(workbook.save_to_buffer()?);
    }

    for (index, summary) in sales.iter().enumerate() {
        let row = row_number(index)?;
        let sale = &summary.sale;

        sheet.write_string(row, 0, sale.date.format(sale_timestamp::FORMAT).to_string())?;
        sheet.write_string(row, 1, &sale.number)?;
        sheet.write_string(row, 2, sale.sale_type.as_str())?;
        sheet.write_string(row, 3, &sale.customer_name)?;
        write_optional(sheet, row, 4, sale.mobile.as_deref())?;
        write_optional(sheet, row, 5, sale.customer_address.as_deref())?;
        write_optional(sheet, row, 6, sale.customer_gstin.as_deref())?;
        sheet.write_number(row, 7, summary.item_count as f64)?;
        sheet.write_number(row, 8, sale.total_amount.as_decimal_rupees())?;
        sheet.write_number(row, 9, sale.total_discount.as_decimal_rupees())?;
        sheet.write_number(row, 10, sale.final_amount.as_decimal_rupees())?;
        write_optional(sheet, row, 11, sale.payment_mode.map(|mode| mode.as_str()))?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_header(sheet: &mut Worksheet, columns: &[&str]) -> Result<(), SheetError> {
    for (col, name) in columns.iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| SheetError::Write("too many columns".into()))?;
        sheet.write_string(0, col, *name)?;
    }
    Ok(())
}

fn write_optional(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&str>,
) -> Result<(), SheetError> {
    if let Some(value) = value {
        sheet.write_string(row, col, value)?;
    }
    Ok(())
}

/// Data row for the 0-based record `index` (row 0 is the header).
fn row_number(index: usize) -> Result<u32, SheetError> {
    u32::try_from(index + 1).map_err(|_| SheetError::Write("too many rows".into()))
}

// =============================================================================
// Unit Tests
// =============================================================================
