//! Upstream dropshipping catalog gateway.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest`, authenticated with a static access token
//! - The upstream catalog is the source of truth - no local sync, no caching
//! - Every call resolves to an [`Envelope`]: transport errors, non-2xx
//!   statuses and upstream `result: false` payloads all become
//!   [`Envelope::Failure`] and are never raised past the gateway
//!
//! Falling back to the fixed catalog in [`fallback`] is the caller's
//! decision, not the gateway's.
//!
//! # Example
//!
//! ```rust,ignore
//! use dropcart_storefront::catalog::CatalogClient;
//!
//! let client = CatalogClient::new(&config.catalog)?;
//!
//! match client.get_product("1").await {
//!     Envelope::Success { data, .. } => println!("{}", data.display_name()),
//!     Envelope::Failure { error } => eprintln!("catalog unavailable: {error}"),
//! }
//! ```

mod client;
pub mod fallback;

pub use client::CatalogClient;
pub use fallback::{CatalogListing, fallback_product, fallback_products, related_products};

use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

/// Message used when the upstream reports failure without explaining why.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Upstream request failed";

/// Errors that can occur when talking to the catalog API.
///
/// These never leave the gateway: they are rendered into
/// [`Envelope::Failure`] messages.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network failure, timeout, or unreadable body.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("HTTP error! status: {0}")]
    Status(u16),

    /// Upstream answered `result: false`.
    #[error("{0}")]
    Upstream(String),

    /// Upstream answered with JSON we could not decode.
    #[error("Invalid catalog response: {0}")]
    Parse(#[from] serde_json::Error),

    /// An endpoint URL could not be built.
    #[error("Invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Uniform result of a catalog call.
///
/// Serializes as `{"success": true, "data": …, "message"?: …}` or
/// `{"success": false, "error": …}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    /// The upstream call succeeded.
    Success {
        data: T,
        /// Informational message from the upstream, if any.
        message: Option<String>,
    },
    /// The call failed at the transport or business level.
    Failure { error: String },
}

impl<T> Envelope<T> {
    /// Wrap successful data.
    pub const fn success(data: T) -> Self {
        Self::Success {
            data,
            message: None,
        }
    }

    /// Wrap a failure message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Whether the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The data, if the call succeeded.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// The failure message, if the call failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }

    /// Convert into a `Result`, discarding any success message.
    ///
    /// # Errors
    ///
    /// Returns the failure message for [`Envelope::Failure`].
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Failure { error } => Err(error),
        }
    }

    /// Transform successful data, leaving failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        match self {
            Self::Success { data, message } => Envelope::Success {
                data: f(data),
                message,
            },
            Self::Failure { error } => Envelope::Failure { error },
        }
    }
}

impl<T> From<Result<(T, Option<String>), CatalogError>> for Envelope<T> {
    fn from(result: Result<(T, Option<String>), CatalogError>) -> Self {
        match result {
            Ok((data, message)) => Self::Success { data, message },
            Err(e) => {
                tracing::error!(error = %e, "Catalog API error");
                Self::failure(e.to_string())
            }
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success { data, message } => {
                let len = if message.is_some() { 3 } else { 2 };
                let mut state = serializer.serialize_struct("Envelope", len)?;
                state.serialize_field("success", &true)?;
                state.serialize_field("data", data)?;
                if let Some(message) = message {
                    state.serialize_field("message", message)?;
                }
                state.end()
            }
            Self::Failure { error } => {
                let mut state = serializer.serialize_struct("Envelope", 2)?;
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
                state.end()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_status_error_message() {
        assert_eq!(
            CatalogError::Status(500).to_string(),
            "HTTP error! status: 500"
        );
    }

    #[test]
    fn test_success_serialization() {
        let envelope = Envelope::success(vec![1, 2]);
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"success": true, "data": [1, 2]})
        );

        let envelope = Envelope::Success {
            data: 1,
            message: Some("Success".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"success": true, "data": 1, "message": "Success"})
        );
    }

    #[test]
    fn test_failure_serialization() {
        let envelope: Envelope<()> = Envelope::failure("HTTP error! status: 500");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"success": false, "error": "HTTP error! status: 500"})
        );
    }

    #[test]
    fn test_from_result() {
        let ok: Envelope<u8> = Ok((7, None)).into();
        assert_eq!(ok.data(), Some(&7));

        let err: Envelope<u8> = Err(CatalogError::Upstream("bad token".to_string())).into();
        assert_eq!(err.error(), Some("bad token"));
        assert!(!err.is_success());
    }

    #[test]
    fn test_map_and_into_result() {
        let envelope = Envelope::success(2).map(|n| n * 10);
        assert_eq!(envelope.into_result(), Ok(20));

        let envelope: Envelope<i32> = Envelope::failure("down");
        assert_eq!(envelope.map(|n| n * 10).into_result(), Err("down".to_string()));
    }
}
