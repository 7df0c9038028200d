//! Shared helpers for the HTTP tests.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rust_xlsxwriter::Workbook;
use serde_json::{json, Value};
use tower::ServiceExt;
use vastra_db::{Database, DbConfig};
use vastra_server::{build_router, AppState};

pub const BOUNDARY: &str = "vastra-test-boundary";

/// Router over a fresh in-memory database.
pub async fn setup_test_app() -> Router {
    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database");
    build_router(AppState::new(db, 10 * 1024 * 1024))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    (status, parse(&body))
}

pub async fn send_json(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, parse(&body))
}

pub async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, parse(&body))
}

fn parse(body: &[u8]) -> Value {
    if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(body).unwrap()
    }
}

/// Creates a category, a manufacturer and one product. Returns the product id.
pub async fn seed_product(app: &Router, barcode: &str, quantity: i64) -> i64 {
    let (_, category) = send_json(app, "POST", "/api/categories", json!({"name": "Sarees"})).await;
    let category_id = match category["id"].as_i64() {
        Some(id) => id,
        None => first_id(app, "/api/categories").await,
    };

    let (_, manufacturer) =
        send_json(app, "POST", "/api/manufacturers", json!({"name": "Kanchi Looms"})).await;
    let manufacturer_id = match manufacturer["id"].as_i64() {
        Some(id) => id,
        None => first_id(app, "/api/manufacturers").await,
    };

    let (status, product) = send_json(
        app,
        "POST",
        "/api/products",
        json!({
            "barcode": barcode,
            "category_id": category_id,
            "manufacturer_id": manufacturer_id,
            "quantity": quantity,
            "cost_price": 1200,
            "sale_price": 2000
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{product}");
    product["id"].as_i64().unwrap()
}

async fn first_id(app: &Router, uri: &str) -> i64 {
    let (_, list) = get_json(app, uri).await;
    list[0]["id"].as_i64().unwrap()
}

pub fn bill(product_id: i64, quantity: i64) -> Value {
    json!({
        "type": "bill",
        "customer_name": "Meera Joshi",
        "mobile": "9876543210",
        "payment_mode": "upi",
        "total_amount": 2000 * quantity,
        "total_discount": 0,
        "final_amount": 2000 * quantity,
        "items": [{
            "product_id": product_id,
            "category_name": "Sarees",
            "sale_price": 2000,
            "quantity": quantity
        }]
    })
}

/// A workbook with the import header and the given rows.
pub fn import_workbook(rows: &[[&str; 6]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in vastra_core::IMPORT_COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name).unwrap();
    }
    for (row, cells) in rows.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            sheet.write_string(row as u32 + 1, col as u16, *cell).unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}

/// `multipart/form-data` request carrying `bytes` in the `file` field.
pub fn upload(uri: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"products.xlsx\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
