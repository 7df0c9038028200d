//! Category and manufacturer handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use vastra_core::validation::validate_catalog_name;
use vastra_core::{Category, Manufacturer};
use vastra_db::{CatalogEntry, CatalogKind, DbError};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    #[serde(default)]
    pub name: Option<String>,
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.catalog().categories().await?))
}

pub async fn list_manufacturers(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Manufacturer>>> {
    Ok(Json(state.db.catalog().manufacturers().await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NameRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let entry = create(&state, CatalogKind::Category, request).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

pub async fn create_manufacturer(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NameRequest>,
) -> ApiResult<(StatusCode, Json<Manufacturer>)> {
    let entry = create(&state, CatalogKind::Manufacturer, request).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

async fn create(state: &AppState, kind: CatalogKind, request: NameRequest) -> ApiResult<CatalogEntry> {
    let name = validate_catalog_name(kind.label(), request.name.as_deref().unwrap_or_default())?;

    let entry = state
        .db
        .catalog()
        .create(kind, &name)
        .await
        .map_err(|err| match err {
            DbError::UniqueViolation { .. } => {
                ApiError::conflict(format!("{} '{}' already exists", kind.label(), name))
            }
            other => other.into(),
        })?;

    info!(kind = kind.label(), id = entry.id, name = %entry.name, "Catalog entry added");
    Ok(entry)
}
