//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (session database)
//!
//! # Catalog
//! GET  /api/products                    - Upstream listing proxy (500 on failure)
//! GET  /api/catalog                     - Listing with fallback products
//! GET  /api/products/{pid}              - Product detail
//! GET  /api/products/{pid}/related      - Up to four same-category products
//! GET  /api/categories                  - Category envelope
//!
//! # Cart
//! GET    /api/cart                      - Current cart
//! DELETE /api/cart                      - Empty the cart
//! POST   /api/cart/items                - Add {productId, variantId?, quantity?}
//! POST   /api/cart/items/{id}/quantity  - Set quantity {quantity}
//! DELETE /api/cart/items/{id}           - Remove a line
//!
//! # Checkout
//! GET  /api/checkout/summary            - Subtotal, shipping, tax, total
//! POST /api/checkout                    - Place order from shipping details
//! GET  /api/checkout/confirmation       - Last placed order (?order=number)
//! ```

pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list))
        .route("/products/{pid}", get(products::show))
        .route("/products/{pid}/related", get(products::related))
        .route("/catalog", get(products::catalog))
        .route("/categories", get(products::categories))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{id}", delete(cart::remove))
        .route("/items/{id}/quantity", post(cart::set_quantity))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::place_order))
        .route("/summary", get(checkout::summary))
        .route("/confirmation", get(checkout::confirmation))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest(
            "/api",
            product_routes()
                .nest("/cart", cart_routes())
                .nest("/checkout", checkout_routes()),
        )
}

/// Assemble the application: routes, sessions, request IDs and tracing.
///
/// Sentry layers are added by the binary on top of this.
pub fn app<Store>(state: AppState, session_layer: SessionManagerLayer<Store>) -> Router
where
    Store: SessionStore + Clone,
{
    routes()
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies session database connectivity when sessions are stored in
/// `PostgreSQL`. Returns 503 Service Unavailable if it is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Session database is not reachable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
