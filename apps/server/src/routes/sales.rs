//! # Sale Handlers
//!
//! Thin HTTP layer over [`vastra_db::SaleLedger`] and the sale report
//! queries. Request bodies are checked here and turned into the validated
//! domain inputs (`NewSale`, `SaleRevision`, `SaleFilter`).
//!
//! ## Request → Domain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/sales                                                       │
//! │  {"type":"bill","items":[{product_id, category_name, sale_price,       │
//! │    quantity, item_final_price (ignored)}], "total_discount": 100, ..}  │
//! │       │                                                                 │
//! │       ▼  SaleRequest::into_new_sale                                    │
//! │  NewSale { sale_type, customer, payment_mode, totals, lines }          │
//! │       │                                                                 │
//! │       ▼  db.ledger().create                                            │
//! │  201 SaleDetail { id, number: "BILL-0007", date, ..., items: [..] }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use vastra_core::validation::{parse_report_date, validate_price, validate_search_query};
use vastra_core::{
    CustomerDetails, Money, NewSale, PaymentMode, Sale, SaleDetail, SaleFilter, SaleLine,
    SaleRevision, SaleTotals, SaleType,
};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

// =============================================================================
// Query Parameters
// =============================================================================

/// `?date=` | `?startDate=&endDate=` | `?type=` | `?search=`
///
/// Shared by the sales list and the sales export.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesQuery {
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub sale_type: Option<String>,
    pub search: Option<String>,
}

impl SalesQuery {
    /// Parses the query into a filter. Blank parameters count as absent.
    pub fn into_filter(self) -> ApiResult<SaleFilter> {
        let mut filter = SaleFilter::default();

        if let Some(date) = non_blank(self.date) {
            filter.date = Some(parse_report_date("date", &date)?);
        } else {
            if let Some(start) = non_blank(self.start_date) {
                filter.start_date = Some(parse_report_date("startDate", &start)?);
            }
            if let Some(end) = non_blank(self.end_date) {
                filter.end_date = Some(parse_report_date("endDate", &end)?);
            }
        }

        if let Some(sale_type) = non_blank(self.sale_type) {
            filter.sale_type = Some(sale_type.parse::<SaleType>()?);
        }

        if let Some(search) = self.search {
            filter.search = validate_search_query(&search)?;
        }

        Ok(filter)
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SaleItemRequest {
    pub product_id: i64,
    #[serde(default)]
    pub category_name: String,
    pub sale_price: Money,
    pub quantity: i64,
}

impl From<SaleItemRequest> for SaleLine {
    fn from(item: SaleItemRequest) -> Self {
        SaleLine {
            product_id: item.product_id,
            category_name: item.category_name.trim().to_string(),
            sale_price: item.sale_price,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleRequest {
    #[serde(rename = "type", default)]
    pub sale_type: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub payment_mode: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub customer_address: Option<String>,
    #[serde(default)]
    pub customer_gstin: Option<String>,
    #[serde(default)]
    pub total_amount: Option<Money>,
    #[serde(default)]
    pub total_discount: Option<Money>,
    #[serde(default)]
    pub final_amount: Option<Money>,
    #[serde(default)]
    pub items: Option<Vec<SaleItemRequest>>,
}

impl SaleRequest {
    pub fn into_new_sale(self) -> ApiResult<NewSale> {
        let (Some(sale_type), Some(items)) = (non_blank(self.sale_type), self.items) else {
            return Err(ApiError::validation("Type and items are required"));
        };
        if items.is_empty() {
            return Err(ApiError::validation("Type and items are required"));
        }

        let sale_type = sale_type.parse::<SaleType>()?;
        let payment_mode = non_blank(self.payment_mode)
            .map(|mode| mode.parse::<PaymentMode>())
            .transpose()?;
        let totals = totals(self.total_amount, self.total_discount, self.final_amount)?;

        Ok(NewSale {
            sale_type,
            customer: CustomerDetails {
                name: non_blank(self.customer_name),
                mobile: non_blank(self.mobile),
                address: non_blank(self.customer_address),
                gstin: non_blank(self.customer_gstin),
            },
            payment_mode,
            remarks: non_blank(self.remarks),
            totals,
            lines: items.into_iter().map(SaleLine::from).collect(),
        })
    }
}

/// Body of `PUT /api/sales/{id}`: totals and the full new item list.
#[derive(Debug, Default, Deserialize)]
pub struct SaleRevisionRequest {
    #[serde(default)]
    pub total_amount: Option<Money>,
    #[serde(default)]
    pub total_discount: Option<Money>,
    #[serde(default)]
    pub final_amount: Option<Money>,
    #[serde(default)]
    pub items: Option<Vec<SaleItemRequest>>,
}

impl SaleRevisionRequest {
    pub fn into_revision(self) -> ApiResult<SaleRevision> {
        let items = self
            .items
            .ok_or_else(|| ApiError::validation("items are required"))?;

        Ok(SaleRevision {
            totals: totals(self.total_amount, self.total_discount, self.final_amount)?,
            lines: items.into_iter().map(SaleLine::from).collect(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub message: &'static str,
}

fn totals(
    total_amount: Option<Money>,
    total_discount: Option<Money>,
    final_amount: Option<Money>,
) -> ApiResult<SaleTotals> {
    for (field, value) in [
        ("total_amount", total_amount),
        ("total_discount", total_discount),
        ("final_amount", final_amount),
    ] {
        if let Some(value) = value {
            validate_price(field, value)?;
        }
    }

    Ok(SaleTotals {
        total_amount,
        total_discount,
        final_amount,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/sales`: headers only, newest first.
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SalesQuery>,
) -> ApiResult<Json<Vec<Sale>>> {
    let filter = query.into_filter()?;
    Ok(Json(state.db.sales().list(&filter).await?))
}

/// `GET /api/sales/{id}`: header plus items.
pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<SaleDetail>> {
    state
        .db
        .sales()
        .detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sale", id))
}

/// `POST /api/sales`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SaleRequest>,
) -> ApiResult<(StatusCode, Json<SaleDetail>)> {
    let sale = request.into_new_sale()?;
    let detail = state.db.ledger().create(&sale).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// `PUT /api/sales/{id}`
pub async fn replace(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<SaleRevisionRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let revision = request.into_revision()?;
    state.db.ledger().replace(id, &revision).await?;

    Ok(Json(MessageResponse {
        id: Some(id),
        message: "Sale updated successfully",
    }))
}

/// `DELETE /api/sales/{id}`: puts the stock back first.
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.ledger().delete(id).await?;

    Ok(Json(MessageResponse {
        id: None,
        message: "Sale deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::NaiveDate;

    fn query(pairs: &[(&str, &str)]) -> SalesQuery {
        let mut q = SalesQuery::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "date" => q.date = value,
                "startDate" => q.start_date = value,
                "endDate" => q.end_date = value,
                "type" => q.sale_type = value,
                "search" => q.search = value,
                _ => unreachable!(),
            }
        }
        q
    }

    fn item() -> SaleItemRequest {
        SaleItemRequest {
            product_id: 1,
            category_name: " Sarees ".into(),
            sale_price: Money::from_rupees(2000),
            quantity: 2,
        }
    }

    #[test]
    fn test_date_wins_over_range() {
        let filter = query(&[("date", "2024-01-01"), ("startDate", "garbage")])
            .into_filter()
            .unwrap();
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filter.start_date, None);
    }

    #[test]
    fn test_blank_params_are_absent() {
        let filter = query(&[("type", ""), ("search", "  "), ("date", "")])
            .into_filter()
            .unwrap();
        assert_eq!(filter, SaleFilter::default());
    }

    #[test]
    fn test_bad_params_rejected() {
        let err = query(&[("type", "invoice")]).into_filter().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(query(&[("endDate", "31/01/2024")]).into_filter().is_err());
    }

    #[test]
    fn test_half_open_range() {
        let filter = query(&[("startDate", "2024-01-01")]).into_filter().unwrap();
        assert!(filter.start_date.is_some());
        assert!(filter.end_date.is_none());
    }

    #[test]
    fn test_new_sale_requires_type_and_items() {
        let err = SaleRequest {
            items: Some(vec![item()]),
            ..Default::default()
        }
        .into_new_sale()
        .unwrap_err();
        assert_eq!(err.message, "Type and items are required");

        let err = SaleRequest {
            sale_type: Some("bill".into()),
            items: Some(vec![]),
            ..Default::default()
        }
        .into_new_sale()
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_new_sale_normalizes_blanks() {
        let sale = SaleRequest {
            sale_type: Some("estimate".into()),
            customer_name: Some("".into()),
            mobile: Some(" 9876543210 ".into()),
            payment_mode: Some("".into()),
            items: Some(vec![item()]),
            ..Default::default()
        }
        .into_new_sale()
        .unwrap();

        assert_eq!(sale.sale_type, SaleType::Estimate);
        assert_eq!(sale.customer.name, None);
        assert_eq!(sale.customer.mobile.as_deref(), Some("9876543210"));
        assert_eq!(sale.payment_mode, None);
        assert_eq!(sale.lines[0].category_name, "Sarees");
    }

    #[test]
    fn test_negative_totals_rejected() {
        let err = SaleRevisionRequest {
            total_discount: Some(Money::from_rupees(-5)),
            items: Some(vec![item()]),
            ..Default::default()
        }
        .into_revision()
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
