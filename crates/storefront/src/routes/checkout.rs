//! Checkout route handlers.
//!
//! Orders are not sent anywhere: placing one freezes the cart into an
//! [`Order`], remembers it in the session for the confirmation page, and
//! empties the cart.

use axum::{
    Json,
    extract::Query,
    http::StatusCode,
};
use chrono::Utc;
use dropcart_core::cart::CartCommand;
use dropcart_core::order::{Order, ShippingDetails};
use dropcart_core::pricing::OrderSummary;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::cart::CartSession;
use crate::error::{AppError, Result, add_breadcrumb};

/// One formatted row of the checkout summary.
#[derive(Debug, Serialize)]
pub struct SummaryLine {
    pub label: &'static str,
    pub amount: String,
}

/// Checkout totals for the current cart.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    pub item_count: u64,
    #[serde(flatten)]
    pub totals: OrderSummary,
    pub free_shipping: bool,
    pub lines: Vec<SummaryLine>,
}

/// Confirmation lookup parameters.
#[derive(Debug, Deserialize)]
pub struct ConfirmationParams {
    /// When given, the stored order must carry this number.
    pub order: Option<String>,
}

/// Subtotal, shipping, tax and total for the current cart.
#[instrument(skip(cart))]
pub async fn summary(cart: CartSession) -> Json<CheckoutSummary> {
    let state = cart.rehydrate().await;
    let totals = OrderSummary::for_cart(&state);

    Json(CheckoutSummary {
        item_count: state.item_count,
        totals,
        free_shipping: totals.free_shipping(),
        lines: totals
            .display_lines()
            .into_iter()
            .map(|(label, amount)| SummaryLine { label, amount })
            .collect(),
    })
}

/// Place an order for the current cart.
#[instrument(skip(cart, shipping))]
pub async fn place_order(
    cart: CartSession,
    Json(shipping): Json<ShippingDetails>,
) -> Result<(StatusCode, Json<Order>)> {
    let state = cart.rehydrate().await;
    let order = Order::place(&state, shipping, Utc::now())?;

    cart.set_last_order(&order).await?;
    cart.persist(&state.apply(CartCommand::Clear)).await?;

    add_breadcrumb(
        "checkout",
        "Placed order",
        Some(&[("order_number", order.order_number.as_str())]),
    );
    info!(order_number = %order.order_number, total = %order.total, "Order placed");

    Ok((StatusCode::CREATED, Json(order)))
}

/// The last order placed in this session.
#[instrument(skip(cart))]
pub async fn confirmation(
    cart: CartSession,
    Query(params): Query<ConfirmationParams>,
) -> Result<Json<Order>> {
    cart.last_order()
        .await
        .filter(|order| {
            params
                .order
                .as_deref()
                .is_none_or(|number| order.order_number.as_str() == number)
        })
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}
