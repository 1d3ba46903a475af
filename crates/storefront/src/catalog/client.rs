//! Catalog API client implementation.
//!
//! Every request is a GET with query parameters; the access token travels in
//! the `CJ-Access-Token` header. Responses use the upstream
//! `{result, message?, data}` wrapper.

use std::sync::Arc;

use dropcart_core::catalog::{Product, ProductPage, ProductQuery};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{CatalogError, Envelope, UPSTREAM_FAILURE_MESSAGE};
use crate::config::CatalogConfig;

/// Header carrying the static access token.
pub const ACCESS_TOKEN_HEADER: &str = "CJ-Access-Token";

/// Upstream response wrapper.
///
/// `data` stays untyped until `result` has been checked, so a failure
/// payload with an unexpected shape still reports the upstream message.
#[derive(Debug, Deserialize)]
struct UpstreamResponse {
    #[serde(default)]
    result: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the upstream product catalog.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    access_token: Option<SecretString>,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed (e.g. the
    /// TLS backend fails to initialize).
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.clone(),
                access_token: config.api_key.clone(),
            }),
        })
    }

    /// Build the URL for `endpoint` with `params` as its query string.
    fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url, CatalogError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{endpoint}"))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Execute a GET request and unwrap the upstream response wrapper.
    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<(T, Option<String>), CatalogError> {
        let url = self.endpoint_url(endpoint, params)?;

        let mut request = self
            .inner
            .client
            .get(url)
            .header("Content-Type", "application/json");
        if let Some(token) = &self.inner.access_token {
            request = request.header(ACCESS_TOKEN_HEADER, token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            tracing::warn!(status = %status, endpoint, "Catalog API returned non-success status");
            return Err(CatalogError::Status(status.as_u16()));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        let envelope: UpstreamResponse = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })?;

        if !envelope.result {
            debug!(message = ?envelope.message, "Catalog API reported failure");
            return Err(CatalogError::Upstream(
                envelope
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| UPSTREAM_FAILURE_MESSAGE.to_string()),
            ));
        }

        let data = serde_json::from_value(envelope.data.unwrap_or(serde_json::Value::Null))?;
        Ok((data, envelope.message))
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List products matching `query`.
    #[instrument(skip(self), fields(page = query.page, page_size = query.page_size))]
    pub async fn list_products(&self, query: &ProductQuery) -> Envelope<ProductPage> {
        self.execute("/product/list", &query.to_query_pairs())
            .await
            .into()
    }

    /// Fetch a single product with its variants.
    #[instrument(skip(self))]
    pub async fn get_product(&self, pid: &str) -> Envelope<Product> {
        self.execute("/product/query", &[("pid", pid.to_string())])
            .await
            .into()
    }

    /// Fetch the upstream category tree (passed through untyped).
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Envelope<Vec<serde_json::Value>> {
        self.execute("/product/getCategory", &[]).await.into()
    }

    /// Free-text search; shorthand for [`list_products`](Self::list_products)
    /// with `keywords` set.
    pub async fn search_products(&self, keyword: &str, query: &ProductQuery) -> Envelope<ProductPage> {
        let query = ProductQuery {
            keywords: Some(keyword.to_string()),
            ..query.clone()
        };
        self.list_products(&query).await
    }
}
