//! Pupusas Core - cart state types.
//!
//! This crate provides the pure state model behind the storefront. It is
//! consumed by:
//! - `pupusas-storefront` - catalog loading and checkout against the remote services
//! - `pupusas-cli` - command-line driver built on the storefront library
//!
//! # Architecture
//!
//! The core crate contains only types and synchronous state transitions - no I/O,
//! no HTTP clients, no timers. Everything here can be exercised from plain unit tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, price helpers, and the UI status enum
//! - [`cart`] - Cart line items and the cart collection
//! - [`catalog`] - Opaque catalog payload with a products view
//! - [`customer`] - Customer record derived from a created order
//! - [`store`] - The owned state object combining all of the above

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod store;
pub mod types;

pub use cart::{Cart, CartError, CartItem, OrderLine};
pub use catalog::Catalog;
pub use customer::Customer;
pub use store::CartStore;
pub use types::*;
