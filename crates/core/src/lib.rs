//! dropcart core - Shared domain library.
//!
//! This crate provides the domain used by every dropcart component:
//! - `storefront` - Catalog proxy and cart/checkout JSON API
//! - `cli` - Command-line tools for migrations and catalog inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps the cart engine testable without any
//! storage or network dependency.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses
//! - [`cart`] - Cart aggregate, commands, and snapshot codec
//! - [`catalog`] - Upstream product model, sorting, and filtering
//! - [`pricing`] - Checkout tax and shipping policy
//! - [`order`] - Shipping details and placed orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod order;
pub mod pricing;
pub mod types;

pub use types::*;
