//! # Product Handlers
//!
//! Inventory screen and barcode lookups.
//!
//! ## Scan Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Scanner types "SAR-KAN-003" + Enter                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  GET /api/products/barcode/SAR-KAN-003                                 │
//! │       │                                                                 │
//! │       ├── found ──► ProductView {id, barcode, category, sale_price, ..} │
//! │       │              → new sale line (category_name, sale_price copied) │
//! │       └── missing ─► 404 NOT_FOUND                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use vastra_core::validation::{validate_barcode, validate_price, validate_stock_quantity};
use vastra_core::{Money, ProductChanges, ProductDraft, ProductView};
use vastra_db::DbError;

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

const ALL_FIELDS_REQUIRED: &str = "All fields are required";

/// Body of `POST /api/products` and `PATCH /api/products/{id}`.
///
/// Every field is optional here so that a missing one is a 400 with a
/// readable message rather than a deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct ProductRequest {
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub manufacturer_id: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub cost_price: Option<Money>,
    #[serde(default)]
    pub sale_price: Option<Money>,
}

impl ProductRequest {
    fn changes(&self) -> ApiResult<ProductChanges> {
        let (Some(category_id), Some(manufacturer_id), Some(quantity), Some(cost_price), Some(sale_price)) = (
            self.category_id,
            self.manufacturer_id,
            self.quantity,
            self.cost_price,
            self.sale_price,
        ) else {
            return Err(ApiError::validation(ALL_FIELDS_REQUIRED));
        };

        validate_stock_quantity(quantity)?;
        validate_price("cost_price", cost_price)?;
        validate_price("sale_price", sale_price)?;

        Ok(ProductChanges {
            category_id,
            manufacturer_id,
            quantity,
            cost_price,
            sale_price,
        })
    }

    fn draft(&self) -> ApiResult<ProductDraft> {
        let barcode = self
            .barcode
            .as_deref()
            .ok_or_else(|| ApiError::validation(ALL_FIELDS_REQUIRED))?;
        let fields = self.changes()?;

        Ok(ProductDraft {
            barcode: validate_barcode(barcode)?,
            fields,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct QuantityResponse {
    pub id: i64,
    pub quantity: i64,
}

/// `GET /api/products`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductView>>> {
    Ok(Json(state.db.products().list().await?))
}

/// `GET /api/products/{id}`
pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<ProductView>> {
    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// `GET /api/products/barcode/{barcode}`
pub async fn get_by_barcode(
    State(state): State<AppState>,
    ApiPath(barcode): ApiPath<String>,
) -> ApiResult<Json<ProductView>> {
    state
        .db
        .products()
        .get_by_barcode(barcode.trim())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &barcode))
}

/// `POST /api/products`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductView>)> {
    let draft = request.draft()?;

    let product = state
        .db
        .products()
        .create(&draft)
        .await
        .map_err(|err| match err {
            DbError::UniqueViolation { .. } => ApiError::conflict("Barcode already exists"),
            other => other.into(),
        })?;

    info!(id = product.product.id, barcode = %product.product.barcode, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PATCH /api/products/{id}`: overwrites everything but the barcode.
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<ProductRequest>,
) -> ApiResult<Json<ProductView>> {
    let changes = request.changes()?;
    let product = state.db.products().update(id, &changes).await?;

    info!(id, quantity = changes.quantity, "Product updated");
    Ok(Json(product))
}

/// `PATCH /api/products/{id}/quantity`
pub async fn set_quantity(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<QuantityRequest>,
) -> ApiResult<Json<QuantityResponse>> {
    let quantity = request
        .quantity
        .ok_or_else(|| ApiError::validation("quantity is required"))?;
    validate_stock_quantity(quantity)?;

    state.db.products().set_quantity(id, quantity).await?;

    info!(id, quantity, "Stock level set");
    Ok(Json(QuantityResponse { id, quantity }))
}
