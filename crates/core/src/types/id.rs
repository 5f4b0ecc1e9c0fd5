//! Newtype IDs for type-safe entity references.
//!
//! The content service hands out opaque string identifiers. Use the `define_id!`
//! macro to wrap them so product and order IDs cannot be mixed up.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<&str>`, `From<String>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use pupusas_core::define_id;
/// define_id!(ShopId);
/// define_id!(LocationId);
///
/// let shop = ShopId::new("ck9ewri0n");
/// let location = LocationId::new("ck9ewri0n");
///
/// // These are different types, so this won't compile:
/// // let _: ShopId = location;
/// assert_eq!(shop.as_str(), location.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(OrderId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_matches_inner() {
        let id = ProductId::new("ck9f0a1");
        assert_eq!(id.to_string(), "ck9f0a1");
        assert_eq!(id.as_str(), "ck9f0a1");
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = OrderId::from("order-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"order-42\"");

        let back: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
