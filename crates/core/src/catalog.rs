//! Catalog model for the upstream dropshipping product API.
//!
//! These types mirror the upstream JSON (camelCase field names) and carry the
//! listing conventions that callers apply locally: sort orders, keyword
//! filtering and image URL normalization.

use core::fmt;
use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{ProductId, VariantId};

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Image shown when a product has no image of its own.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder-product.jpg";

/// Origin used to absolutize relative upstream image paths.
pub const IMAGE_ORIGIN: &str = "https://cjdropshipping.com";

// =============================================================================
// Products
// =============================================================================

/// A product as returned by the upstream catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    #[serde(deserialize_with = "null_default")]
    pub pid: ProductId,
    #[serde(deserialize_with = "null_default")]
    pub product_name: String,
    #[serde(deserialize_with = "null_default")]
    pub product_name_en: String,
    #[serde(deserialize_with = "null_default")]
    pub product_image: String,
    #[serde(deserialize_with = "null_default")]
    pub product_images: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub sell_price: Decimal,
    #[serde(deserialize_with = "null_default")]
    pub list_price: Decimal,
    #[serde(deserialize_with = "null_default")]
    pub product_weight: Decimal,
    #[serde(deserialize_with = "string_or_number")]
    pub category_id: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub category_name: String,
    #[serde(deserialize_with = "null_default")]
    pub product_description: String,
    #[serde(deserialize_with = "null_default")]
    pub product_description_en: String,
    #[serde(deserialize_with = "null_default")]
    pub pack_weight: Decimal,
    #[serde(deserialize_with = "null_default")]
    pub pack_length: Decimal,
    #[serde(deserialize_with = "null_default")]
    pub pack_width: Decimal,
    #[serde(deserialize_with = "null_default")]
    pub pack_height: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<Variant>>,
}

impl Product {
    /// Name shown to shoppers: the English name when present.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.product_name_en.is_empty() {
            &self.product_name
        } else {
            &self.product_name_en
        }
    }

    /// Variants offered for this product (empty when it has none).
    #[must_use]
    pub fn variants(&self) -> &[Variant] {
        self.variants.as_deref().unwrap_or_default()
    }

    /// Whether a variant must be chosen before this product can be bought.
    #[must_use]
    pub fn has_variants(&self) -> bool {
        !self.variants().is_empty()
    }

    /// Find a variant by its upstream ID.
    #[must_use]
    pub fn variant(&self, vid: &str) -> Option<&Variant> {
        self.variants().iter().find(|v| v.vid.as_str() == vid)
    }

    /// Main image, normalized with [`image_url`].
    #[must_use]
    pub fn image_url(&self) -> String {
        image_url(&self.product_image)
    }
}

/// A purchasable configuration of a product (e.g. colour or size).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Variant {
    #[serde(deserialize_with = "null_default")]
    pub vid: VariantId,
    #[serde(deserialize_with = "null_default")]
    pub product_sku: String,
    #[serde(deserialize_with = "null_default")]
    pub variant_key: String,
    #[serde(deserialize_with = "null_default")]
    pub variant_value: String,
    #[serde(deserialize_with = "null_default")]
    pub variant_image: String,
    #[serde(deserialize_with = "null_default")]
    pub variant_sell_price: Decimal,
    #[serde(deserialize_with = "null_default")]
    pub variant_list_price: Decimal,
    #[serde(deserialize_with = "null_default")]
    pub variant_stock: i64,
}

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPage {
    #[serde(deserialize_with = "null_default")]
    pub list: Vec<Product>,
    #[serde(deserialize_with = "null_default")]
    pub total: u64,
    #[serde(alias = "pageNum", deserialize_with = "null_default")]
    pub page: u32,
    #[serde(deserialize_with = "null_default")]
    pub page_size: u32,
}

/// Treat an explicit JSON `null` like a missing field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Accept category IDs sent either as JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// =============================================================================
// Queries
// =============================================================================

/// Filter for a product listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
    pub keywords: Option<String>,
    pub category_id: Option<String>,
    pub sort: Option<SortOrder>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            keywords: None,
            category_id: None,
            sort: None,
        }
    }
}

impl ProductQuery {
    /// Page size sent upstream; zero means the default.
    #[must_use]
    pub const fn effective_page_size(&self) -> u32 {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        }
    }

    /// Query parameters in upstream naming, omitting absent values.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("pageNum", self.page.max(1).to_string()),
            ("pageSize", self.effective_page_size().to_string()),
        ];
        if let Some(category_id) = &self.category_id {
            pairs.push(("categoryId", category_id.clone()));
        }
        if let Some(keywords) = &self.keywords {
            pairs.push(("keywords", keywords.clone()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.to_string()));
        }
        pairs
    }
}

// =============================================================================
// Sorting & Filtering
// =============================================================================

/// Listing sort orders understood by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::PriceAsc => a.sell_price.cmp(&b.sell_price),
            Self::PriceDesc => b.sell_price.cmp(&a.sell_price),
            Self::NameAsc => a.product_name.cmp(&b.product_name),
            Self::NameDesc => b.product_name.cmp(&a.product_name),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
        })
    }
}

/// Error parsing a [`SortOrder`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort order: {0}")]
pub struct UnknownSortOrder(pub String);

impl FromStr for SortOrder {
    type Err = UnknownSortOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "name_asc" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            other => Err(UnknownSortOrder(other.to_string())),
        }
    }
}

/// Sort products in place. The sort is stable, so ties keep upstream order.
pub fn sort_products(products: &mut [Product], order: SortOrder) {
    products.sort_by(|a, b| order.compare(a, b));
}

/// Keep products whose name contains `keyword`, ignoring case.
#[must_use]
pub fn filter_by_keyword(products: Vec<Product>, keyword: &str) -> Vec<Product> {
    let needle = keyword.to_lowercase();
    products
        .into_iter()
        .filter(|p| p.product_name.to_lowercase().contains(&needle))
        .collect()
}

/// Normalize an upstream image path into a URL the browser can load.
#[must_use]
pub fn image_url(path: &str) -> String {
    if path.is_empty() {
        return PLACEHOLDER_IMAGE.to_string();
    }
    if path.starts_with("http") {
        return path.to_string();
    }
    if path.starts_with('/') {
        return format!("{IMAGE_ORIGIN}{path}");
    }
    path.to_string()
}
