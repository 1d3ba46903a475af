//! Product and category route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use dropcart_core::catalog::{Product, ProductPage, ProductQuery, SortOrder};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::catalog::{CatalogListing, Envelope, fallback_product, related_products};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Page size used when looking up same-category products.
const RELATED_PAGE_SIZE: u32 = 8;

/// Listing query parameters, in upstream naming.
///
/// Every value is taken as a string so that malformed numbers fall back to
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page_num: Option<String>,
    pub page_size: Option<String>,
    pub keywords: Option<String>,
    pub category_id: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<String>,
}

impl ListParams {
    /// Build the upstream query, ignoring unparseable values.
    #[must_use]
    pub fn to_query(&self) -> ProductQuery {
        let defaults = ProductQuery::default();
        ProductQuery {
            page: parse_or(self.page_num.as_deref(), defaults.page),
            page_size: parse_or(self.page_size.as_deref(), defaults.page_size),
            keywords: non_empty(self.keywords.as_deref()),
            category_id: non_empty(self.category_id.as_deref()),
            sort: non_empty(self.sort.as_deref()).and_then(|s| {
                s.parse::<SortOrder>()
                    .inspect_err(|e| debug!(error = %e, "Ignoring sort parameter"))
                    .ok()
            }),
        }
    }

    /// Maximum number of products to return, if requested.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit.as_deref().and_then(|l| l.trim().parse().ok())
    }
}

/// Parse a positive number, falling back to `default` for zero or garbage.
fn parse_or(value: Option<&str>, default: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse().ok())
        .filter(|&n| n > 0)
        .unwrap_or(default)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

/// Query parameters for related products.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedParams {
    pub category_id: Option<String>,
}

/// Proxy a listing request to the upstream catalog.
///
/// Upstream failures are reported as `500 {"error": ...}`; no fallback.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductPage>> {
    match state.catalog().list_products(&params.to_query()).await {
        Envelope::Success { data, .. } => Ok(Json(data)),
        Envelope::Failure { error } => Err(AppError::Catalog(error)),
    }
}

/// Listing for storefront pages, degrading to the fixed catalog.
#[instrument(skip(state))]
pub async fn catalog(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<CatalogListing> {
    let query = params.to_query();
    let limit = params.limit();
    let query = match limit.and_then(|l| u32::try_from(l).ok()) {
        Some(limit) if limit > 0 => ProductQuery {
            page_size: limit,
            ..query
        },
        _ => query,
    };

    let envelope = state.catalog().list_products(&query).await;
    Json(CatalogListing::resolve(envelope, &query, limit))
}

/// Look up a product, falling back to the fixed catalog.
pub(crate) async fn find_product(state: &AppState, pid: &str) -> Option<Product> {
    match state.catalog().get_product(pid).await {
        Envelope::Success { data, .. } => Some(data),
        Envelope::Failure { .. } => fallback_product(pid),
    }
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(pid): Path<String>) -> Result<Json<Product>> {
    find_product(&state, &pid)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Up to four other products from the same category.
///
/// The category comes from `categoryId` when given, otherwise from the
/// product itself.
#[instrument(skip(state))]
pub async fn related(
    State(state): State<AppState>,
    Path(pid): Path<String>,
    Query(params): Query<RelatedParams>,
) -> Json<Vec<Product>> {
    let category_id = match non_empty(params.category_id.as_deref()) {
        Some(id) => Some(id),
        None => find_product(&state, &pid)
            .await
            .and_then(|product| product.category_id),
    };

    let Some(category_id) = category_id else {
        return Json(Vec::new());
    };

    let query = ProductQuery {
        page: 1,
        page_size: RELATED_PAGE_SIZE,
        category_id: Some(category_id),
        ..ProductQuery::default()
    };
    let envelope = state.catalog().list_products(&query).await;
    Json(related_products(envelope, &pid))
}

/// Upstream category tree, as an envelope.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Json<Envelope<Vec<serde_json::Value>>> {
    Json(state.catalog().list_categories().await)
}
