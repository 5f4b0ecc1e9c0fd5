//! Core types for the Pupusas storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;

pub use id::*;
pub use price::{MINOR_UNITS_PER_MAJOR, to_minor_units};
pub use status::UiStatus;
