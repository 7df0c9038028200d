//! Spreadsheet import and export handlers.

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, info, warn};
use vastra_core::ImportRowError;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::extract::ApiQuery;
use crate::routes::sales::SalesQuery;
use crate::spreadsheet::{self, SheetError, XLSX_CONTENT_TYPE};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: String,
    pub inserted: usize,
    pub updated: usize,
    pub errors: Vec<ImportRowError>,
}

impl From<SheetError> for ApiError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::Write(e) => {
                error!("Spreadsheet export failed: {}", e);
                ApiError::internal("Failed to build spreadsheet")
            }
            other => ApiError::validation(other.to_string()),
        }
    }
}

/// `POST /api/import/products` with the workbook in the `file` field.
pub async fn import_products(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportResponse>> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        // Some clients name the part after the file itself
        if field.name() == Some("file") || field.file_name().is_some() {
            let filename = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?;
            upload = Some((filename, bytes));
            break;
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| ApiError::validation("No file uploaded"))?;
    if bytes.is_empty() {
        return Err(ApiError::validation("No file uploaded"));
    }

    let rows = spreadsheet::read_import_sheet(&bytes)?;
    info!(filename = ?filename, rows = rows.len(), "Import sheet received");

    let report = state.db.importer().import(&rows).await?;
    if !report.errors.is_empty() {
        warn!(failed = report.errors.len(), "Import finished with row errors");
    }

    Ok(Json(ImportResponse {
        message: format!("Successfully imported {} products", report.imported()),
        inserted: report.inserted,
        updated: report.updated,
        errors: report.errors,
    }))
}

/// `GET /api/export/products`
pub async fn export_products(State(state): State<AppState>) -> ApiResult<Response> {
    let products = state.db.products().list().await?;
    if products.is_empty() {
        return Err(ApiError::new(ErrorCode::NotFound, "No products found to export"));
    }

    let bytes = spreadsheet::write_products(&products)?;
    info!(products = products.len(), "Products exported");
    Ok(xlsx_attachment("products.xlsx", bytes))
}

/// `GET /api/export/sales` with the same filters as the sales list.
pub async fn export_sales(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SalesQuery>,
) -> ApiResult<Response> {
    let filter = query.into_filter()?;
    let sales = state.db.sales().list_for_export(&filter).await?;

    let bytes = spreadsheet::write_sales(&sales)?;
    info!(sales = sales.len(), "Sales exported");
    Ok(xlsx_attachment("sales.xlsx", bytes))
}

fn xlsx_attachment(filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        bytes,
    )
        .into_response()
}
