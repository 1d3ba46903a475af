//! Session-backed cart persistence.
//!
//! The cart lives in the visitor's session as a JSON snapshot string under
//! [`keys::CART`]. Handlers rehydrate it once per request, apply a single
//! [`CartCommand`](dropcart_core::cart::CartCommand), and persist the result
//! explicitly. Concurrent requests from one visitor are last-write-wins.

use axum::{extract::FromRequestParts, http::request::Parts};
use dropcart_core::cart::CartState;
use dropcart_core::order::Order;
use tower_sessions::Session;
use tracing::{error, warn};

use crate::error::AppError;

/// Session keys owned by the storefront.
pub mod keys {
    /// Serialized [`CartState`](dropcart_core::cart::CartState) snapshot.
    pub const CART: &str = "cart";

    /// The most recently placed order, for the confirmation page.
    pub const LAST_ORDER: &str = "last_order";
}

/// The visitor's cart storage slot.
///
/// Extracted from the session installed by `SessionManagerLayer`.
///
/// ```rust,ignore
/// async fn handler(cart: CartSession) -> Result<Json<CartState>> {
///     let state = cart.rehydrate().await.apply(CartCommand::Clear);
///     cart.persist(&state).await?;
///     Ok(Json(state))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CartSession(Session);

impl CartSession {
    /// Wrap an existing session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self(session)
    }

    /// Load the stored cart.
    ///
    /// A missing slot yields the empty cart. A malformed snapshot, or a
    /// session store that cannot be read, also yields the empty cart and is
    /// logged; the visitor is never blocked by a broken cart.
    pub async fn rehydrate(&self) -> CartState {
        let snapshot = match self.0.get::<String>(keys::CART).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return CartState::empty(),
            Err(e) => {
                error!(error = %e, "Failed to read cart from session");
                return CartState::empty();
            }
        };

        CartState::from_snapshot(&snapshot).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding malformed cart snapshot");
            CartState::empty()
        })
    }

    /// Overwrite the stored cart with `cart`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded or the session
    /// store rejects the write.
    pub async fn persist(&self, cart: &CartState) -> Result<(), AppError> {
        let snapshot = cart
            .to_snapshot()
            .map_err(|e| AppError::Internal(format!("failed to encode cart: {e}")))?;
        self.0.insert(keys::CART, snapshot).await?;
        Ok(())
    }

    /// The last order placed in this session, if any.
    pub async fn last_order(&self) -> Option<Order> {
        self.0
            .get::<Order>(keys::LAST_ORDER)
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to read last order from session"))
            .ok()
            .flatten()
    }

    /// Remember `order` as the last placed order.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn set_last_order(&self, order: &Order) -> Result<(), AppError> {
        self.0.insert(keys::LAST_ORDER, order).await?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use dropcart_core::cart::NewLineItem;
    use dropcart_core::order::ShippingDetails;
    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> CartSession {
        CartSession::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    fn cart() -> CartState {
        CartState::empty().add_item(
            NewLineItem::new("1", "Headphones", "/h.jpg", Decimal::new(2999, 2)),
            2,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_missing_cart_is_empty() {
        assert_eq!(session().rehydrate().await, CartState::empty());
    }

    #[tokio::test]
    async fn test_persist_then_rehydrate() {
        let session = session();
        let cart = cart();

        session.persist(&cart).await.unwrap();
        assert_eq!(session.rehydrate().await, cart);
    }

    #[tokio::test]
    async fn test_persist_overwrites() {
        let session = session();
        session.persist(&cart()).await.unwrap();
        session.persist(&CartState::empty()).await.unwrap();

        assert!(session.rehydrate().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_empty() {
        let session = session();
        session.0.insert(keys::CART, "{not json").await.unwrap();

        assert_eq!(session.rehydrate().await, CartState::empty());
    }

    #[tokio::test]
    async fn test_wrongly_typed_slot_is_empty() {
        let session = session();
        session.0.insert(keys::CART, 42).await.unwrap();

        assert_eq!(session.rehydrate().await, CartState::empty());
    }

    #[tokio::test]
    async fn test_last_order_round_trip() {
        let session = session();
        assert!(session.last_order().await.is_none());

        let shipping = ShippingDetails {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: "1 Analytical Way".to_string(),
            city: "London".to_string(),
            state: "Greater London".to_string(),
            zip_code: "N1 9GU".to_string(),
            country: "GB".to_string(),
        };
        let order = Order::place(&cart(), shipping, Utc::now()).unwrap();

        session.set_last_order(&order).await.unwrap();
        assert_eq!(session.last_order().await, Some(order));
    }
}
