//! Catalog inspection commands.
//!
//! Each command prints the gateway envelope as pretty JSON, so the output is
//! exactly what the storefront sees. A failure envelope is printed too, and
//! the process then exits non-zero.
//!
//! # Environment Variables
//!
//! - `CJ_API_KEY` - Catalog API access token
//! - `CJ_API_BASE_URL` - Catalog API base URL
//! - `CJ_API_TIMEOUT_SECS` - Request timeout in seconds

use dropcart_core::catalog::{ProductQuery, SortOrder, UnknownSortOrder};
use dropcart_storefront::catalog::{CatalogClient, CatalogError, Envelope};
use dropcart_storefront::config::{CatalogConfig, ConfigError};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogCommandError {
    /// Catalog settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("Client error: {0}")]
    Client(#[from] CatalogError),

    /// The sort argument is not a known order.
    #[error(transparent)]
    Sort(#[from] UnknownSortOrder),

    /// The upstream answered with a failure envelope.
    #[error("Catalog request failed: {0}")]
    Upstream(String),

    /// The envelope could not be rendered.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Build a listing query from command-line arguments.
///
/// # Errors
///
/// Returns an error if `sort` is not a known sort order.
pub fn build_query(
    keywords: Option<String>,
    category_id: Option<String>,
    sort: Option<&str>,
    page: u32,
    page_size: u32,
) -> Result<ProductQuery, CatalogCommandError> {
    Ok(ProductQuery {
        page,
        page_size,
        keywords,
        category_id,
        sort: sort.map(str::parse::<SortOrder>).transpose()?,
    })
}

fn client() -> Result<CatalogClient, CatalogCommandError> {
    dotenvy::dotenv().ok();
    let config = CatalogConfig::from_env()?;
    tracing::debug!(?config, "Catalog configuration loaded");
    Ok(CatalogClient::new(&config)?)
}

fn print<T: Serialize>(envelope: &Envelope<T>) -> Result<(), CatalogCommandError> {
    let json = serde_json::to_string_pretty(envelope)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }

    match envelope.error() {
        Some(error) => Err(CatalogCommandError::Upstream(error.to_string())),
        None => Ok(()),
    }
}

/// List products matching `query`.
///
/// # Errors
///
/// Returns an error if the client cannot be configured or the upstream
/// request fails.
pub async fn list(query: &ProductQuery) -> Result<(), CatalogCommandError> {
    print(&client()?.list_products(query).await)
}

/// Show a single product.
///
/// # Errors
///
/// Returns an error if the client cannot be configured or the upstream
/// request fails.
pub async fn show(pid: &str) -> Result<(), CatalogCommandError> {
    print(&client()?.get_product(pid).await)
}

/// Show the category tree.
///
/// # Errors
///
/// Returns an error if the client cannot be configured or the upstream
/// request fails.
pub async fn categories() -> Result<(), CatalogCommandError> {
    print(&client()?.list_categories().await)
}
