//! Fixed catalog shown while the upstream is unavailable.
//!
//! The gateway never falls back on its own; route handlers call
//! [`CatalogListing::resolve`] and [`related_products`] with the envelope they
//! received.

use dropcart_core::catalog::{Product, ProductPage, ProductQuery, filter_by_keyword, sort_products};
use dropcart_core::types::ProductId;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use super::Envelope;

/// Maximum number of related products shown on a product page.
pub const RELATED_LIMIT: usize = 4;

const FALLBACK_CATEGORY_ID: &str = "1";
const FALLBACK_CATEGORY_NAME: &str = "Electronics";

struct FixedProduct {
    pid: &'static str,
    name: &'static str,
    description: &'static str,
    images: &'static [&'static str],
    sell_cents: i64,
    list_cents: i64,
    /// Tenths of a kilogram.
    weight: i64,
    pack_weight: i64,
    /// Centimetres: length, width, height.
    pack: [i64; 3],
}

const FIXED_PRODUCTS: [FixedProduct; 3] = [
    FixedProduct {
        pid: "1",
        name: "Wireless Bluetooth Headphones",
        description: "High-quality wireless Bluetooth headphones with noise cancellation.",
        images: &[
            "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=400&h=400&fit=crop",
            "https://images.unsplash.com/photo-1484704849700-f032a568e944?w=400&h=400&fit=crop",
        ],
        sell_cents: 2999,
        list_cents: 5999,
        weight: 3,
        pack_weight: 5,
        pack: [20, 15, 8],
    },
    FixedProduct {
        pid: "2",
        name: "Smart Fitness Watch",
        description: "Track your fitness goals with this advanced smart watch.",
        images: &[
            "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=400&h=400&fit=crop",
            "https://images.unsplash.com/photo-1434494878577-86c23bcb06b9?w=400&h=400&fit=crop",
        ],
        sell_cents: 7999,
        list_cents: 14999,
        weight: 1,
        pack_weight: 2,
        pack: [15, 10, 5],
    },
    FixedProduct {
        pid: "3",
        name: "Portable Phone Charger",
        description: "Compact portable charger for your mobile devices.",
        images: &[
            "https://images.unsplash.com/photo-1609091839311-d5365f9ff1c5?w=400&h=400&fit=crop",
        ],
        sell_cents: 1999,
        list_cents: 3999,
        weight: 2,
        pack_weight: 3,
        pack: [12, 8, 3],
    },
];

impl FixedProduct {
    fn to_product(&self) -> Product {
        let [length, width, height] = self.pack;
        Product {
            pid: ProductId::new(self.pid),
            product_name: self.name.to_string(),
            product_name_en: self.name.to_string(),
            product_image: self.images.first().copied().unwrap_or_default().to_string(),
            product_images: self.images.iter().map(ToString::to_string).collect(),
            sell_price: Decimal::new(self.sell_cents, 2),
            list_price: Decimal::new(self.list_cents, 2),
            product_weight: Decimal::new(self.weight, 1),
            category_id: Some(FALLBACK_CATEGORY_ID.to_string()),
            category_name: FALLBACK_CATEGORY_NAME.to_string(),
            product_description: self.description.to_string(),
            product_description_en: self.description.to_string(),
            pack_weight: Decimal::new(self.pack_weight, 1),
            pack_length: Decimal::from(length),
            pack_width: Decimal::from(width),
            pack_height: Decimal::from(height),
            variants: None,
        }
    }
}

/// The three fixed products, in catalog order.
#[must_use]
pub fn fallback_products() -> Vec<Product> {
    FIXED_PRODUCTS.iter().map(FixedProduct::to_product).collect()
}

/// Look up a fixed product by ID.
#[must_use]
pub fn fallback_product(pid: &str) -> Option<Product> {
    FIXED_PRODUCTS
        .iter()
        .find(|p| p.pid == pid)
        .map(FixedProduct::to_product)
}

// =============================================================================
// Listing
// =============================================================================

/// Products to show for a listing request, and where they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogListing {
    pub products: Vec<Product>,
    /// True when the upstream failed and the fixed catalog is shown instead.
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CatalogListing {
    /// Resolve a listing from the gateway's answer to `query`.
    ///
    /// Upstream results are sorted locally when `query.sort` is set; the
    /// upstream has already applied keyword and category filters. On failure
    /// the fixed catalog is filtered by keyword, sorted, and cut to `limit`.
    #[must_use]
    pub fn resolve(envelope: Envelope<ProductPage>, query: &ProductQuery, limit: Option<usize>) -> Self {
        match envelope {
            Envelope::Success { data, .. } => {
                let mut products = data.list;
                if let Some(order) = query.sort {
                    sort_products(&mut products, order);
                }
                if let Some(limit) = limit {
                    products.truncate(limit);
                }
                Self {
                    products,
                    fallback: false,
                    error: None,
                }
            }
            Envelope::Failure { error } => {
                warn!(error = %error, "Catalog unavailable, using fallback products");

                let mut products = fallback_products();
                if let Some(keywords) = query.keywords.as_deref().filter(|k| !k.is_empty()) {
                    products = filter_by_keyword(products, keywords);
                }
                if let Some(order) = query.sort {
                    sort_products(&mut products, order);
                }
                if let Some(limit) = limit {
                    products.truncate(limit);
                }
                Self {
                    products,
                    fallback: true,
                    error: Some(error),
                }
            }
        }
    }
}

/// Other products from the same category as `current_pid`, at most
/// [`RELATED_LIMIT`]. A failed lookup yields no related products.
#[must_use]
pub fn related_products(envelope: Envelope<ProductPage>, current_pid: &str) -> Vec<Product> {
    match envelope {
        Envelope::Success { data, .. } => data
            .list
            .into_iter()
            .filter(|p| p.pid.as_str() != current_pid)
            .take(RELATED_LIMIT)
            .collect(),
        Envelope::Failure { .. } => Vec::new(),
    }
}
