//! Newtype IDs for type-safe entity references.
//!
//! Every table keys its rows with a `SERIAL` integer. Wrapping those integers
//! in distinct types stops a `CartItemId` from being passed where a
//! `ProductId` is expected, which matters on routes like
//! `/update_cart/{item_id}` and `/add_to_cart/{product_id}` that sit side by
//! side.

/// Define a type-safe `i32` ID wrapper.
///
/// The generated type is `Copy`, hashable, (de)serializes as a bare number
/// and, with the `postgres` feature, binds and decodes as `INTEGER`.
///
/// ```rust
/// # use emporium_core::define_id;
/// define_id!(CustomerId);
/// define_id!(InvoiceId);
///
/// let customer_id = CustomerId::new(1);
/// assert_eq!(customer_id.as_i32(), 1);
/// // let _: InvoiceId = customer_id; // does not compile
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw database ID.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw database ID.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(CartItemId);
define_id!(OrderId);
define_id!(OrderItemId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_i32() {
        let id = ProductId::new(42);
        assert_eq!(id.as_i32(), 42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(ProductId::from(42), id);
    }

    #[test]
    fn test_parse_from_path_segment() {
        assert_eq!("17".parse::<CartItemId>().ok(), Some(CartItemId::new(17)));
        assert!("abc".parse::<CartItemId>().is_err());
    }

    #[test]
    fn test_display_and_serde_are_bare_numbers() {
        let id = OrderId::new(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("7"));
    }
}
