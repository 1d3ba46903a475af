//! Checkout summary, order placement and confirmation.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::str::FromStr;

use axum::http::StatusCode;
use dropcart_integration_tests::{MockCatalog, TestApp};
use rust_decimal::Decimal;
use serde_json::{Value, json};

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().unwrap()).unwrap()
}

fn shipping() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "phone": "555-0100",
        "address": "1 Analytical Way",
        "city": "London",
        "state": "Greater London",
        "zipCode": "N1 9GU",
        "country": "GB"
    })
}

#[tokio::test]
async fn test_summary_adds_tax_and_free_shipping() {
    let app = TestApp::spawn(MockCatalog::failing(StatusCode::INTERNAL_SERVER_ERROR).await).await;
    app.post("/api/cart/items", &json!({"productId": "1"})).await;

    let (status, summary) = app.get("/api/checkout/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["itemCount"], 1);
    assert_eq!(decimal(&summary["subtotal"]), Decimal::new(2999, 2));
    assert_eq!(decimal(&summary["shipping"]), Decimal::ZERO);
    assert_eq!(decimal(&summary["tax"]), Decimal::new(240, 2));
    assert_eq!(decimal(&summary["total"]), Decimal::new(3239, 2));
    assert_eq!(summary["freeShipping"], true);
    assert_eq!(summary["lines"][1]["amount"], "Free");
    assert_eq!(summary["lines"][3]["amount"], "$32.39");
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let app = TestApp::spawn(MockCatalog::healthy().await).await;

    let (status, body) = app.post("/api/checkout", &shipping()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Your cart is empty");
}

#[tokio::test]
async fn test_invalid_shipping_lists_every_field() {
    let app = TestApp::spawn(MockCatalog::healthy().await).await;
    app.post("/api/cart/items", &json!({"productId": "100"})).await;

    let mut details = shipping();
    details["email"] = json!("not-an-email");
    details["city"] = json!("  ");
    details["country"] = json!("ZZ");

    let (status, body) = app.post("/api/checkout", &details).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["city", "email", "country"]);

    // The cart is untouched
    let (_, cart) = app.get("/api/cart").await;
    assert_eq!(cart["itemCount"], 1);
}

#[tokio::test]
async fn test_place_order_clears_cart_and_remembers_order() {
    let app = TestApp::spawn(MockCatalog::healthy().await).await;
    app.post("/api/cart/items", &json!({"productId": "100", "quantity": 2}))
        .await;

    let (status, order) = app.post("/api/checkout", &shipping()).await;
    assert_eq!(status, StatusCode::CREATED);

    let number = order["orderNumber"].as_str().unwrap().to_string();
    assert!(number.starts_with("CJ"));
    assert_eq!(order["status"], "pending");
    assert_eq!(decimal(&order["total"]), Decimal::new(9998, 2));
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(order["shipping"]["city"], "London");

    let (_, cart) = app.get("/api/cart").await;
    assert_eq!(cart["items"], json!([]));

    let (status, confirmed) = app.get("/api/checkout/confirmation").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed, order);

    let (status, confirmed) = app
        .get(&format!("/api/checkout/confirmation?order={number}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["orderNumber"], number.as_str());

    let (status, _) = app.get("/api/checkout/confirmation?order=CJ0").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_confirmation_without_order_is_not_found() {
    let app = TestApp::spawn(MockCatalog::healthy().await).await;

    let (status, body) = app.get("/api/checkout/confirmation").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Order not found");
}
