//! # Vastra Server
//!
//! HTTP/JSON API over the shop database.
//!
//! ## Routes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  /api/health                           GET                              │
//! │  /api/categories                       GET  POST                        │
//! │  /api/manufacturers                    GET  POST                        │
//! │  /api/products                         GET  POST                        │
//! │  /api/products/barcode/{barcode}       GET                              │
//! │  /api/products/{id}                    GET  PATCH                       │
//! │  /api/products/{id}/quantity           PATCH                            │
//! │  /api/sales                            GET  POST      ─► SaleLedger     │
//! │  /api/sales/{id}                       GET  PUT  DELETE ─► SaleLedger   │
//! │  /api/import/products                  POST (multipart) ─► Importer     │
//! │  /api/export/products                  GET  (xlsx)                      │
//! │  /api/export/sales                     GET  (xlsx, list filters)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Layers, outermost first: trace, CORS, body limit.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod spreadsheet;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health))
        // Catalog
        .route(
            "/api/categories",
            get(routes::catalog::list_categories).post(routes::catalog::create_category),
        )
        .route(
            "/api/manufacturers",
            get(routes::catalog::list_manufacturers).post(routes::catalog::create_manufacturer),
        )
        // Products
        .route(
            "/api/products",
            get(routes::products::list).post(routes::products::create),
        )
        .route(
            "/api/products/barcode/{barcode}",
            get(routes::products::get_by_barcode),
        )
        .route(
            "/api/products/{id}",
            get(routes::products::get).patch(routes::products::update),
        )
        .route(
            "/api/products/{id}/quantity",
            patch(routes::products::set_quantity),
        )
        // Sales
        .route(
            "/api/sales",
            get(routes::sales::list).post(routes::sales::create),
        )
        .route(
            "/api/sales/{id}",
            get(routes::sales::get)
                .put(routes::sales::replace)
                .delete(routes::sales::delete),
        )
        // Spreadsheets
        .route("/api/import/products", post(routes::transfer::import_products))
        .route("/api/export/products", get(routes::transfer::export_products))
        .route("/api/export/sales", get(routes::transfer::export_sales))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
