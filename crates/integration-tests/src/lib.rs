//! End-to-end test harness for the dropcart storefront.
//!
//! Every test gets its own pair of servers on ephemeral ports:
//!
//! - a mock upstream catalog ([`MockCatalog`]) speaking the upstream
//!   `{result, message, data}` protocol
//! - the storefront itself ([`TestApp`]) with in-memory sessions, pointed at
//!   that mock
//!
//! Requests go through a cookie-keeping `reqwest` client so that the session
//! (and therefore the cart) survives across calls, like a browser.
//!
//! ```rust,ignore
//! let app = TestApp::spawn(MockCatalog::healthy().await).await;
//! let (status, cart) = app.get("/api/cart").await;
//! ```

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use dropcart_storefront::config::{CatalogConfig, StorefrontConfig};
use dropcart_storefront::middleware::create_session_layer;
use dropcart_storefront::routes;
use dropcart_storefront::state::AppState;
use serde::Serialize;
use serde_json::{Value, json};
use tower_sessions::MemoryStore;

/// Bind an ephemeral port and serve `router` on it in the background.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}

// =============================================================================
// Mock upstream catalog
// =============================================================================

/// Products served by [`MockCatalog::healthy`].
///
/// | pid | name             | price  | category | variants          |
/// |-----|------------------|--------|----------|-------------------|
/// | 100 | Studio Headphones| 49.99  | 5        | -                 |
/// | 101 | Trail Watch      | 99.50  | 5        | v-red 101.00, v-blue 99.50 |
/// | 102 | Braided Cable    | 9.99   | 5        | -                 |
/// | 103 | Desk Lamp        | 25.00  | 6        | -                 |
#[must_use]
pub fn mock_products() -> Vec<Value> {
    vec![
        json!({
            "pid": "100", "productName": "Studio Headphones", "productNameEn": "Studio Headphones",
            "productImage": "/img/100.jpg", "sellPrice": 49.99, "listPrice": 79.99,
            "categoryId": 5, "categoryName": "Audio"
        }),
        json!({
            "pid": "101", "productName": "Trail Watch", "productNameEn": "Trail Watch",
            "productImage": "https://img.test/101.jpg", "sellPrice": 99.50, "listPrice": 129.00,
            "categoryId": 5, "categoryName": "Audio",
            "variants": [
                {"vid": "v-red", "productSku": "TW-RED", "variantKey": "Color",
                 "variantValue": "Red", "variantSellPrice": 101.00, "variantStock": 4},
                {"vid": "v-blue", "productSku": "TW-BLU", "variantKey": "Color",
                 "variantValue": "Blue", "variantSellPrice": 99.50, "variantStock": 9}
            ]
        }),
        json!({
            "pid": "102", "productName": "Braided Cable", "productNameEn": "Braided Cable",
            "productImage": "/img/102.jpg", "sellPrice": 9.99, "listPrice": 14.99,
            "categoryId": "5", "categoryName": "Audio"
        }),
        json!({
            "pid": "103", "productName": "Desk Lamp", "productNameEn": "Desk Lamp",
            "productImage": "", "sellPrice": 25, "listPrice": 40,
            "categoryId": 6, "categoryName": "Home"
        }),
    ]
}

#[derive(Serialize)]
struct Upstream<T: Serialize> {
    result: bool,
    message: &'static str,
    data: Option<T>,
}

fn upstream_ok<T: Serialize>(data: T) -> Response {
    Json(Upstream {
        result: true,
        message: "Success",
        data: Some(data),
    })
    .into_response()
}

fn upstream_error(message: &'static str) -> Response {
    Json(Upstream::<()> {
        result: false,
        message,
        data: None,
    })
    .into_response()
}

fn category_of(product: &Value) -> String {
    match &product["categoryId"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn list_products(Query(params): Query<HashMap<String, String>>) -> Response {
    let keywords = params.get("keywords").map(|k| k.to_lowercase());
    let list: Vec<Value> = mock_products()
        .into_iter()
        .filter(|p| {
            params
                .get("categoryId")
                .is_none_or(|category| &category_of(p) == category)
        })
        .filter(|p| {
            keywords.as_ref().is_none_or(|k| {
                p["productName"]
                    .as_str()
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains(k)
            })
        })
        .collect();

    let page_num: u32 = params
        .get("pageNum")
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    let page_size: u32 = params
        .get("pageSize")
        .and_then(|v| v.parse().ok())
        .unwrap_or(20);

    let total = list.len();
    upstream_ok(json!({
        "list": list,
        "total": total,
        "pageNum": page_num,
        "pageSize": page_size,
    }))
}

async fn query_product(Query(params): Query<HashMap<String, String>>) -> Response {
    let pid = params.get("pid").cloned().unwrap_or_default();
    mock_products()
        .into_iter()
        .find(|p| p["pid"] == pid.as_str())
        .map_or_else(|| upstream_error("Product not found"), upstream_ok)
}

async fn categories() -> Response {
    upstream_ok(json!([
        {"categoryFirstId": "5", "categoryFirstName": "Audio"},
        {"categoryFirstId": "6", "categoryFirstName": "Home"}
    ]))
}

/// A mock upstream catalog server.
#[derive(Debug, Clone)]
pub struct MockCatalog {
    /// Base URL including the `/api2.0` prefix.
    pub base_url: String,
}

impl MockCatalog {
    async fn start(router: Router) -> Self {
        let addr = serve(router).await;
        Self {
            base_url: format!("http://{addr}/api2.0"),
        }
    }

    /// An upstream serving [`mock_products`].
    pub async fn healthy() -> Self {
        Self::start(
            Router::new()
                .route("/api2.0/product/list", get(list_products))
                .route("/api2.0/product/query", get(query_product))
                .route("/api2.0/product/getCategory", get(categories)),
        )
        .await
    }

    /// An upstream answering every request with `status`.
    pub async fn failing(status: StatusCode) -> Self {
        Self::start(Router::new().fallback(move || async move { (status, "upstream down") }))
            .await
    }
}

// =============================================================================
// Storefront under test
// =============================================================================

/// A running storefront plus a cookie-keeping client.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
}

/// Storefront configuration pointing at `catalog`, with in-memory sessions.
///
/// # Panics
///
/// Panics if the mock catalog URL is not a valid base URL.
#[must_use]
pub fn test_config(catalog: &MockCatalog) -> StorefrontConfig {
    StorefrontConfig {
        database_url: None,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        catalog: CatalogConfig::new(&catalog.base_url).expect("Invalid mock catalog URL"),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

impl TestApp {
    /// Start a storefront backed by `catalog`.
    ///
    /// # Panics
    ///
    /// Panics if the application state or HTTP client cannot be built.
    pub async fn spawn(catalog: MockCatalog) -> Self {
        let config = test_config(&catalog);
        let session_layer = create_session_layer(MemoryStore::default(), &config);
        let state = AppState::new(config, None).expect("Failed to build app state");
        let addr = serve(routes::app(state, session_layer)).await;

        Self {
            base_url: format!("http://{addr}"),
            client: Self::new_client(),
        }
    }

    /// A fresh client with an empty cookie jar (a new visitor).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn new_client() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET `path`, returning the status and JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed");
        Self::read(response).await
    }

    /// POST `body` as JSON to `path`, returning the status and JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST failed");
        Self::read(response).await
    }

    /// DELETE `path`, returning the status and JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE failed");
        Self::read(response).await
    }

    async fn read(response: reqwest::Response) -> (StatusCode, Value) {
        let status = StatusCode::from_u16(response.status().as_u16())
            .expect("Response status out of range");
        let body = response.json().await.expect("Response body is not JSON");
        (status, body)
    }
}
