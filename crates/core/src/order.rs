//! Orders placed from a cart.
//!
//! There is no payment or fulfilment integration: an order is a frozen copy
//! of the cart plus shipping details, kept only for the confirmation page.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{CartState, LineItem};
use crate::types::{Email, OrderNumber, OrderStatus};

/// Countries the store ships to (ISO 3166-1 alpha-2).
pub const SHIPPING_COUNTRIES: &[&str] = &["US", "CA", "GB", "AU", "DE", "FR", "IT", "ES", "JP", "KR"];

/// Shipping and contact details collected at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// A single invalid checkout field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every problem found in a [`ShippingDetails`] form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid shipping details: {}", format_fields(.0))]
pub struct ShippingError(pub Vec<FieldError>);

fn format_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} ({})", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ShippingDetails {
    /// Check every field, collecting all problems rather than stopping at
    /// the first.
    ///
    /// # Errors
    ///
    /// Returns [`ShippingError`] listing each blank field, an invalid email,
    /// or an unsupported country.
    pub fn validate(&self) -> Result<(), ShippingError> {
        let required = [
            ("firstName", &self.first_name, "First name is required"),
            ("lastName", &self.last_name, "Last name is required"),
            ("email", &self.email, "Email is required"),
            ("phone", &self.phone, "Phone number is required"),
            ("address", &self.address, "Address is required"),
            ("city", &self.city, "City is required"),
            ("state", &self.state, "State is required"),
            ("zipCode", &self.zip_code, "ZIP code is required"),
            ("country", &self.country, "Country is required"),
        ];

        let mut errors: Vec<FieldError> = required
            .into_iter()
            .filter(|(_, value, _)| value.trim().is_empty())
            .map(|(field, _, message)| FieldError {
                field,
                message: message.to_string(),
            })
            .collect();

        if !self.email.trim().is_empty() && Email::parse(self.email.trim()).is_err() {
            errors.push(FieldError {
                field: "email",
                message: "Invalid email address".to_string(),
            });
        }

        if !self.country.trim().is_empty() && !SHIPPING_COUNTRIES.contains(&self.country.trim()) {
            errors.push(FieldError {
                field: "country",
                message: format!("We do not ship to {}", self.country.trim()),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ShippingError(errors))
        }
    }
}

/// Errors placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// There is nothing to order.
    #[error("cannot place an order for an empty cart")]
    EmptyCart,

    /// The shipping form did not validate.
    #[error(transparent)]
    Shipping(#[from] ShippingError),
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: OrderNumber,
    pub items: Vec<LineItem>,
    pub shipping: ShippingDetails,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Freeze `cart` into a pending order numbered `CJ<unix millis>`.
    ///
    /// The order total is the cart total; tax and shipping are shown at
    /// checkout but not charged.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EmptyCart`] if the cart has no lines, or
    /// [`OrderError::Shipping`] if the shipping details are invalid.
    pub fn place(
        cart: &CartState,
        shipping: ShippingDetails,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        shipping.validate()?;

        Ok(Self {
            order_number: OrderNumber::new(format!("CJ{}", now.timestamp_millis())),
            items: cart.items.clone(),
            shipping,
            total: cart.total,
            status: OrderStatus::Pending,
            created_at: now,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::cart::NewLineItem;

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "555-0100".to_string(),
            address: "1 Analytical Way".to_string(),
            city: "London".to_string(),
            state: "Greater London".to_string(),
            zip_code: "N1 9GU".to_string(),
            country: "GB".to_string(),
        }
    }

    fn cart() -> CartState {
        CartState::empty().add_item(
            NewLineItem::new("1", "Headphones", "/h.jpg", Decimal::new(2999, 2)),
            2,
            Utc::now(),
        )
    }

    #[test]
    fn test_valid_shipping() {
        assert!(shipping().validate().is_ok());
    }

    #[test]
    fn test_blank_form_reports_every_field() {
        let err = ShippingDetails::default().validate().unwrap_err();
        assert_eq!(err.0.len(), 9);
        assert_eq!(err.0[0].field, "firstName");
    }

    #[test]
    fn test_invalid_email_and_country() {
        let details = ShippingDetails {
            email: "not an email".to_string(),
            country: "ZZ".to_string(),
            ..shipping()
        };
        let err = details.validate().unwrap_err();
        let fields: Vec<_> = err.0.iter().map(|e| e.field).collect();
        assert_eq!(fields, ["email", "country"]);
    }

    #[test]
    fn test_place_order() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let order = Order::place(&cart(), shipping(), now).unwrap();

        assert_eq!(order.order_number.as_str(), "CJ1700000000123");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total, Decimal::new(5998, 2));
        assert_eq!(order.created_at, now);
    }

    #[test]
    fn test_place_order_rejects_empty_cart() {
        assert_eq!(
            Order::place(&CartState::empty(), shipping(), Utc::now()),
            Err(OrderError::EmptyCart)
        );
    }

    #[test]
    fn test_place_order_rejects_bad_shipping() {
        let result = Order::place(&cart(), ShippingDetails::default(), Utc::now());
        assert!(matches!(result, Err(OrderError::Shipping(_))));
    }
}
