//! Cart route handlers.
//!
//! Each mutating handler rehydrates the cart from the session, applies one
//! command, persists the result, and answers with the new state.

use axum::{
    Json,
    extract::{Path, State},
};
use dropcart_core::cart::{CartCommand, CartState, NewLineItem};
use dropcart_core::types::LineItemId;
use serde::Deserialize;
use tracing::instrument;

use crate::cart::CartSession;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::routes::products::find_product;
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: Option<u32>,
}

/// Set-quantity request body.
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

/// Rehydrate, apply `command`, persist.
async fn mutate(cart: &CartSession, command: CartCommand) -> Result<CartState> {
    let state = cart.rehydrate().await.apply(command);
    cart.persist(&state).await?;
    Ok(state)
}

/// Current cart.
#[instrument(skip(cart))]
pub async fn show(cart: CartSession) -> Json<CartState> {
    Json(cart.rehydrate().await)
}

/// Add a product (and optional variant) to the cart.
///
/// The product is resolved server-side so prices never come from the client.
#[instrument(skip(state, cart))]
pub async fn add(
    State(state): State<AppState>,
    cart: CartSession,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartState>> {
    let product = find_product(&state, &request.product_id)
        .await
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let item = NewLineItem::from_product(&product, request.variant_id.as_deref())?;
    let quantity = request.quantity.unwrap_or(1);

    let quantity_label = quantity.to_string();
    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[
            ("product_id", request.product_id.as_str()),
            ("quantity", quantity_label.as_str()),
        ]),
    );

    mutate(&cart, CartCommand::AddItem { item, quantity })
        .await
        .map(Json)
}

/// Set a line's quantity; zero or less removes the line.
#[instrument(skip(cart))]
pub async fn set_quantity(
    cart: CartSession,
    Path(id): Path<String>,
    Json(request): Json<SetQuantityRequest>,
) -> Result<Json<CartState>> {
    mutate(
        &cart,
        CartCommand::SetQuantity {
            id: LineItemId::new(id),
            quantity: request.quantity,
        },
    )
    .await
    .map(Json)
}

/// Remove a line. Unknown IDs leave the cart unchanged.
#[instrument(skip(cart))]
pub async fn remove(cart: CartSession, Path(id): Path<String>) -> Result<Json<CartState>> {
    mutate(
        &cart,
        CartCommand::RemoveItem {
            id: LineItemId::new(id),
        },
    )
    .await
    .map(Json)
}

/// Empty the cart.
#[instrument(skip(cart))]
pub async fn clear(cart: CartSession) -> Result<Json<CartState>> {
    mutate(&cart, CartCommand::Clear).await.map(Json)
}
