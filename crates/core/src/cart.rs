//! Shopping cart engine.
//!
//! [`CartState`] is the aggregate root. It only changes through
//! [`CartCommand`]s applied with [`CartState::apply`], each a pure
//! `(state, command) -> state` transition. Derived totals are recomputed from
//! the full item list after every mutation and never edited on their own.
//!
//! Persistence is not part of the engine: callers serialize the resulting
//! state with [`CartState::to_snapshot`] after each mutation and rehydrate it
//! with [`CartState::from_snapshot`].
//!
//! # Example
//!
//! ```rust
//! use dropcart_core::cart::{CartCommand, CartState, NewLineItem};
//! use rust_decimal::Decimal;
//!
//! let item = NewLineItem::new("A", "Widget", "/a.jpg", Decimal::TEN);
//! let cart = CartState::default()
//!     .apply(CartCommand::AddItem { item: item.clone(), quantity: 2 })
//!     .apply(CartCommand::AddItem { item, quantity: 3 });
//!
//! assert_eq!(cart.items.len(), 1);
//! assert_eq!(cart.item_count, 5);
//! assert_eq!(cart.total, Decimal::from(50));
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;
use crate::types::{LineItemId, ProductId, VariantId};

/// Stand-in variant key for lines without a variant.
pub const NO_VARIANT: &str = "default";

// =============================================================================
// Line Items
// =============================================================================

/// The variant a line item was added with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineVariant {
    pub variant_id: VariantId,
    pub sku: String,
    pub key: String,
    pub value: String,
}

/// One row of the cart.
///
/// Display fields and the unit price are copied when the line is created and
/// are not kept in sync with the catalog afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<LineVariant>,
}

impl LineItem {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        &self.product_id == product_id
            && self.variant.as_ref().map(|v| &v.variant_id) == variant_id
    }
}

/// A candidate line: everything except the generated ID and the quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub unit_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<LineVariant>,
}

/// Errors building a [`NewLineItem`] from a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineItemError {
    /// The product has variants but none was chosen.
    #[error("product {0} requires a variant to be selected")]
    VariantRequired(ProductId),

    /// The chosen variant does not belong to the product.
    #[error("product {product_id} has no variant {variant_id}")]
    UnknownVariant {
        product_id: ProductId,
        variant_id: String,
    },
}

impl NewLineItem {
    /// Create a candidate line for a product without a variant.
    #[must_use]
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        image: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            image: image.into(),
            unit_price,
            variant: None,
        }
    }

    /// Attach a variant to the candidate.
    #[must_use]
    pub fn with_variant(mut self, variant: LineVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Capture a catalog product (and optionally one of its variants).
    ///
    /// The unit price is the variant's sell price when a variant is chosen,
    /// the product's sell price otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`LineItemError::VariantRequired`] when the product has
    /// variants and `variant_id` is `None`, and
    /// [`LineItemError::UnknownVariant`] when `variant_id` does not name one
    /// of the product's variants.
    pub fn from_product(product: &Product, variant_id: Option<&str>) -> Result<Self, LineItemError> {
        let base = Self::new(
            product.pid.clone(),
            product.display_name(),
            product.product_image.clone(),
            product.sell_price,
        );

        match variant_id {
            None if product.has_variants() => {
                Err(LineItemError::VariantRequired(product.pid.clone()))
            }
            None => Ok(base),
            Some(vid) => {
                let variant =
                    product
                        .variant(vid)
                        .ok_or_else(|| LineItemError::UnknownVariant {
                            product_id: product.pid.clone(),
                            variant_id: vid.to_string(),
                        })?;
                Ok(Self {
                    unit_price: variant.variant_sell_price,
                    ..base.with_variant(LineVariant {
                        variant_id: variant.vid.clone(),
                        sku: variant.product_sku.clone(),
                        key: variant.variant_key.clone(),
                        value: variant.variant_value.clone(),
                    })
                })
            }
        }
    }

    fn variant_id(&self) -> Option<&VariantId> {
        self.variant.as_ref().map(|v| &v.variant_id)
    }

    /// Line ID derived from product, variant and insertion time.
    ///
    /// IDs are unique among the lines in `taken`; a clash gets a `_2`, `_3`...
    /// suffix. An ID freed by removing a line can come back when the same
    /// product is added again within the same millisecond, and then names
    /// only the new line.
    fn line_id(&self, at: DateTime<Utc>, taken: &[LineItem]) -> LineItemId {
        let variant = self.variant_id().map_or(NO_VARIANT, VariantId::as_str);
        let base = format!("{}_{}_{}", self.product_id, variant, at.timestamp_millis());

        let in_use = |candidate: &str| taken.iter().any(|line| line.id.as_str() == candidate);
        let mut id = base.clone();
        let mut n = 2_u32;
        while in_use(&id) {
            id = format!("{base}_{n}");
            n = n.saturating_add(1);
        }
        LineItemId::new(id)
    }

    fn into_line(self, id: LineItemId, quantity: u32) -> LineItem {
        LineItem {
            id,
            product_id: self.product_id,
            name: self.name,
            image: self.image,
            unit_price: self.unit_price,
            quantity,
            variant: self.variant,
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// A single cart transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartCommand {
    /// Add `quantity` of an item, merging with an existing line for the same
    /// product and variant.
    AddItem { item: NewLineItem, quantity: u32 },
    /// Remove a line. Unknown IDs are ignored.
    RemoveItem { id: LineItemId },
    /// Set a line's quantity exactly; zero or less removes the line.
    SetQuantity { id: LineItemId, quantity: i64 },
    /// Empty the cart.
    Clear,
    /// Replace the whole state with a stored snapshot, verbatim.
    Load(CartState),
}

// =============================================================================
// Cart State
// =============================================================================

/// The shopping cart aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    pub items: Vec<LineItem>,
    pub total: Decimal,
    pub item_count: u64,
}

/// Errors reading a persisted cart snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot is not valid JSON or does not have the cart's shape.
    #[error("malformed cart snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl CartState {
    /// The canonical empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a cart from items, deriving `total` and `item_count`.
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        let total = items
            .iter()
            .fold(Decimal::ZERO, |sum, item| sum.saturating_add(item.line_total()));
        let item_count = items.iter().map(|item| u64::from(item.quantity)).sum();

        Self {
            items,
            total,
            item_count,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn line(&self, id: &LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Apply a command using the current time for new line IDs.
    #[must_use]
    pub fn apply(self, command: CartCommand) -> Self {
        self.apply_at(command, Utc::now())
    }

    /// Apply a command; `now` is only used to generate new line IDs.
    #[must_use]
    pub fn apply_at(self, command: CartCommand, now: DateTime<Utc>) -> Self {
        match command {
            CartCommand::AddItem { item, quantity } => self.add_item(item, quantity, now),
            CartCommand::RemoveItem { id } => self.remove_item(&id),
            CartCommand::SetQuantity { id, quantity } => self.set_quantity(&id, quantity),
            CartCommand::Clear => Self::empty(),
            CartCommand::Load(snapshot) => snapshot,
        }
    }

    /// Add `quantity` of `item`.
    ///
    /// An existing line with the same product and variant has its quantity
    /// increased (saturating, no upper bound otherwise); a new line is
    /// appended otherwise. A new line is never created with quantity zero.
    #[must_use]
    pub fn add_item(self, item: NewLineItem, quantity: u32, now: DateTime<Utc>) -> Self {
        let mut items = self.items;

        let existing = items
            .iter_mut()
            .find(|line| line.matches(&item.product_id, item.variant_id()));

        match existing {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None if quantity == 0 => {}
            None => {
                let id = item.line_id(now, &items);
                items.push(item.into_line(id, quantity));
            }
        }

        Self::from_items(items)
    }

    /// Remove the line with `id`. Unknown IDs leave the state untouched.
    #[must_use]
    pub fn remove_item(self, id: &LineItemId) -> Self {
        if self.line(id).is_none() {
            return self;
        }

        let items = self.items.into_iter().filter(|item| &item.id != id).collect();
        Self::from_items(items)
    }

    /// Set the quantity of the line with `id`.
    ///
    /// `quantity <= 0` behaves exactly like [`remove_item`](Self::remove_item).
    /// Unknown IDs leave the state untouched.
    #[must_use]
    pub fn set_quantity(self, id: &LineItemId, quantity: i64) -> Self {
        if quantity <= 0 {
            return self.remove_item(id);
        }
        if self.line(id).is_none() {
            return self;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let mut items = self.items;
        for item in items.iter_mut().filter(|item| &item.id == id) {
            item.quantity = quantity;
        }
        Self::from_items(items)
    }

    /// Serialize the whole cart for persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, which only happens for
    /// values `serde_json` cannot represent.
    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a persisted snapshot. The result is trusted as-is: totals are
    /// not recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Malformed`] if `raw` is not a cart snapshot.
    pub fn from_snapshot(raw: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::catalog::Variant;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn widget(pid: &str, price: i64) -> NewLineItem {
        NewLineItem::new(pid, format!("Product {pid}"), format!("/{pid}.jpg"), Decimal::from(price))
    }

    fn variant(vid: &str) -> LineVariant {
        LineVariant {
            variant_id: VariantId::new(vid),
            sku: format!("SKU-{vid}"),
            key: "Color".to_string(),
            value: vid.to_string(),
        }
    }

    fn add(cart: CartState, item: &NewLineItem, quantity: u32, millis: i64) -> CartState {
        cart.apply_at(
            CartCommand::AddItem {
                item: item.clone(),
                quantity,
            },
            at(millis),
        )
    }

    fn assert_derived(cart: &CartState) {
        let total: Decimal = cart.items.iter().map(LineItem::line_total).sum();
        let count: u64 = cart.items.iter().map(|i| u64::from(i.quantity)).sum();
        assert_eq!(cart.total, total);
        assert_eq!(cart.item_count, count);
    }

    fn populated() -> CartState {
        let cart = add(CartState::empty(), &widget("A", 10), 2, 1);
        let cart = add(cart, &widget("B", 3).with_variant(variant("red")), 1, 2);
        add(cart, &widget("B", 4).with_variant(variant("blue")), 4, 3)
    }

    #[test]
    fn test_scenario_add_merge_update_remove() {
        let item = widget("A", 10);

        let cart = add(CartState::empty(), &item, 2, 1_000);
        assert_eq!(cart.total, Decimal::from(20));
        assert_eq!(cart.item_count, 2);

        let cart = add(cart, &item, 3, 2_000);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.total, Decimal::from(50));
        assert_eq!(cart.item_count, 5);

        let line_id = cart.items[0].id.clone();
        let cart = cart.apply(CartCommand::SetQuantity {
            id: line_id.clone(),
            quantity: 1,
        });
        assert_eq!(cart.total, Decimal::from(10));
        assert_eq!(cart.item_count, 1);

        let cart = cart.apply(CartCommand::RemoveItem { id: line_id });
        assert_eq!(cart, CartState::empty());
    }

    #[test]
    fn test_repeated_adds_merge_into_one_line() {
        let sequences: [&[u32]; 4] = [&[1], &[1, 1, 1], &[2, 5, 3], &[7, 1, 9, 4, 2]];
        for quantities in sequences {
            let item = widget("P", 3);
            let mut cart = CartState::empty();
            for (i, &qty) in quantities.iter().enumerate() {
                cart = add(cart, &item, qty, i64::try_from(i).unwrap());
                assert_derived(&cart);
            }
            let expected: u32 = quantities.iter().sum();
            assert_eq!(cart.items.len(), 1);
            assert_eq!(cart.items[0].quantity, expected);
        }
    }

    #[test]
    fn test_variants_of_same_product_are_separate_lines() {
        let cart = populated();
        assert_eq!(cart.items.len(), 3);
        assert_eq!(cart.item_count, 7);
        assert_eq!(cart.total, Decimal::from(20 + 3 + 16));

        // Same variant again merges into the existing red line
        let cart = add(cart, &widget("B", 3).with_variant(variant("red")), 2, 4);
        assert_eq!(cart.items.len(), 3);
        assert_eq!(cart.items[1].quantity, 3);
    }

    #[test]
    fn test_merge_keeps_insertion_order_and_original_id() {
        let cart = populated();
        let ids: Vec<_> = cart.items.iter().map(|i| i.id.clone()).collect();

        let cart = add(cart, &widget("A", 10), 1, 99);
        let after: Vec<_> = cart.items.iter().map(|i| i.id.clone()).collect();
        assert_eq!(ids, after);
    }

    #[test]
    fn test_merge_keeps_captured_price() {
        let cart = add(CartState::empty(), &widget("A", 10), 1, 1);
        let cart = add(cart, &widget("A", 12), 1, 2);
        assert_eq!(cart.items[0].unit_price, Decimal::from(10));
        assert_eq!(cart.total, Decimal::from(20));
    }

    #[test]
    fn test_line_id_format() {
        let cart = add(CartState::empty(), &widget("A", 1), 1, 1_700_000_000_000);
        let cart = add(cart, &widget("A", 1).with_variant(variant("v9")), 1, 1_700_000_000_001);
        assert_eq!(cart.items[0].id.as_str(), "A_default_1700000000000");
        assert_eq!(cart.items[1].id.as_str(), "A_v9_1700000000001");
    }

    #[test]
    fn test_line_ids_stay_unique_when_formats_clash() {
        // "A" with variant "x_default" renders like "A_x" without a variant
        let cart = add(CartState::empty(), &widget("A_x", 1), 1, 5);
        let cart = add(cart, &widget("A", 2).with_variant(variant("x_default")), 1, 5);

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].id.as_str(), "A_x_default_5");
        assert_eq!(cart.items[1].id.as_str(), "A_x_default_5_2");

        let cart = cart.remove_item(&LineItemId::new("A_x_default_5_2"));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].product_id.as_str(), "A_x");
    }

    #[test]
    fn test_readded_line_starts_fresh() {
        let item = widget("A", 10);
        let cart = add(CartState::empty(), &item, 3, 5);
        let first = cart.items[0].id.clone();

        let cart = add(cart.remove_item(&first), &item, 1, 5);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 1);
        assert_eq!(cart.item_count, 1);
        assert_derived(&cart);
    }

    #[test]
    fn test_add_zero_quantity_never_creates_a_line() {
        let cart = add(CartState::empty(), &widget("A", 1), 0, 1);
        assert_eq!(cart, CartState::empty());
    }

    #[test]
    fn test_add_has_no_upper_bound_but_saturates() {
        let cart = add(CartState::empty(), &widget("A", 1), u32::MAX - 1, 1);
        let cart = add(cart, &widget("A", 1), 5, 2);
        assert_eq!(cart.items[0].quantity, u32::MAX);
        assert_derived(&cart);
    }

    #[test]
    fn test_set_quantity_zero_equals_remove() {
        for index in 0..3 {
            let cart = populated();
            let id = cart.items[index].id.clone();

            let removed = cart.clone().remove_item(&id);
            for quantity in [0, -1, -42] {
                let zeroed = cart.clone().set_quantity(&id, quantity);
                assert_eq!(zeroed, removed);
            }
            assert_derived(&removed);
        }
    }

    #[test]
    fn test_set_quantity_is_exact_not_additive() {
        let cart = populated();
        let id = cart.items[2].id.clone();
        let cart = cart.set_quantity(&id, 10);
        assert_eq!(cart.items[2].quantity, 10);
        assert_eq!(cart.item_count, 2 + 1 + 10);
        assert_derived(&cart);
    }

    #[test]
    fn test_set_quantity_clamps_large_values() {
        let cart = populated();
        let id = cart.items[0].id.clone();
        let cart = cart.set_quantity(&id, i64::MAX);
        assert_eq!(cart.items[0].quantity, u32::MAX);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let unknown = LineItemId::new("missing");
        for cart in [CartState::empty(), populated()] {
            assert_eq!(cart.clone().remove_item(&unknown), cart);
            assert_eq!(cart.clone().set_quantity(&unknown, 3), cart);
            assert_eq!(cart.clone().set_quantity(&unknown, 0), cart);
        }
    }

    #[test]
    fn test_unknown_id_noop_preserves_untrusted_totals() {
        // A loaded snapshot is trusted verbatim; a no-op must not "fix" it.
        let mut loaded = populated();
        loaded.total = Decimal::from(999);
        let cart = CartState::empty().apply(CartCommand::Load(loaded.clone()));
        let cart = cart.remove_item(&LineItemId::new("missing"));
        assert_eq!(cart, loaded);
    }

    #[test]
    fn test_clear_is_canonical_empty() {
        for cart in [CartState::empty(), populated()] {
            let cleared = cart.apply(CartCommand::Clear);
            assert!(cleared.items.is_empty());
            assert_eq!(cleared.total, Decimal::ZERO);
            assert_eq!(cleared.item_count, 0);
        }
    }

    #[test]
    fn test_every_command_keeps_totals_derived() {
        let cart = populated();
        let first = cart.items[0].id.clone();
        let second = cart.items[1].id.clone();

        let commands = vec![
            CartCommand::AddItem {
                item: widget("C", 7),
                quantity: 2,
            },
            CartCommand::SetQuantity {
                id: first.clone(),
                quantity: 9,
            },
            CartCommand::RemoveItem { id: second },
            CartCommand::SetQuantity {
                id: first,
                quantity: 0,
            },
            CartCommand::Clear,
        ];

        let mut cart = cart;
        for command in commands {
            cart = cart.apply_at(command, at(50));
            assert_derived(&cart);
        }
    }

    #[test]
    fn test_decimal_prices() {
        let item = NewLineItem::new("A", "A", "", Decimal::new(2999, 2));
        let cart = add(CartState::empty(), &item, 3, 1);
        assert_eq!(cart.total, Decimal::new(8997, 2));
    }

    #[test]
    fn test_snapshot_round_trip_is_exact() {
        let cart = populated();
        let snapshot = cart.to_snapshot().unwrap();

        let loaded = CartState::from_snapshot(&snapshot).unwrap();
        let reloaded = CartState::empty().apply(CartCommand::Load(loaded));
        assert_eq!(reloaded.to_snapshot().unwrap(), snapshot);
        assert_eq!(reloaded, cart);
    }

    #[test]
    fn test_snapshot_wire_format() {
        let cart = add(CartState::empty(), &widget("A", 10), 2, 1);
        let json: serde_json::Value = serde_json::from_str(&cart.to_snapshot().unwrap()).unwrap();

        assert_eq!(json["itemCount"], 2);
        assert_eq!(json["total"], "20");
        assert_eq!(json["items"][0]["productId"], "A");
        assert_eq!(json["items"][0]["unitPrice"], "10");
        assert!(json["items"][0].get("variant").is_none());
    }

    #[test]
    fn test_malformed_snapshots_are_rejected() {
        for raw in ["", "not json", "[]", r#"{"items": 3}"#, r#"{"items": [{"id": 1}]}"#] {
            assert!(
                matches!(CartState::from_snapshot(raw), Err(SnapshotError::Malformed(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn test_from_product_base_price() {
        let product = Product {
            pid: ProductId::new("1"),
            product_name: "Charger".to_string(),
            product_name_en: "Portable Charger".to_string(),
            product_image: "/c.jpg".to_string(),
            sell_price: Decimal::new(1999, 2),
            ..Product::default()
        };

        let item = NewLineItem::from_product(&product, None).unwrap();
        assert_eq!(item.name, "Portable Charger");
        assert_eq!(item.unit_price, Decimal::new(1999, 2));
        assert!(item.variant.is_none());
    }

    #[test]
    fn test_from_product_variant_price() {
        let product = Product {
            pid: ProductId::new("1"),
            product_name: "Shirt".to_string(),
            sell_price: Decimal::from(10),
            variants: Some(vec![Variant {
                vid: VariantId::new("v1"),
                product_sku: "SHIRT-L".to_string(),
                variant_key: "Size".to_string(),
                variant_value: "L".to_string(),
                variant_sell_price: Decimal::from(12),
                ..Variant::default()
            }]),
            ..Product::default()
        };

        let item = NewLineItem::from_product(&product, Some("v1")).unwrap();
        assert_eq!(item.unit_price, Decimal::from(12));
        assert_eq!(item.variant.unwrap().sku, "SHIRT-L");

        assert_eq!(
            NewLineItem::from_product(&product, None),
            Err(LineItemError::VariantRequired(ProductId::new("1")))
        );
        assert!(matches!(
            NewLineItem::from_product(&product, Some("v2")),
            Err(LineItemError::UnknownVariant { .. })
        ));
    }
}
