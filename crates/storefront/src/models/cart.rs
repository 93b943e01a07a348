//! Shopping cart types.
//!
//! A cart is simply the set of `cart_items` rows owned by a user, at most
//! one per product. Totals are always computed from current product prices.

use rust_decimal::Decimal;
use thiserror::Error;

use emporium_core::{CartItemId, Price, ProductId};

/// One cart row joined with the product it refers to.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub image_url: String,
    pub unit_price: Price,
    pub quantity: i32,
}

impl CartLine {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.times(self.quantity)
    }
}

/// Sum of all line totals.
#[must_use]
pub fn cart_total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

/// Most units of one product a cart row may hold.
pub const MAX_LINE_QUANTITY: i32 = 999;

/// A submitted quantity that cannot be applied.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity must be a whole number")]
    NotANumber,
    #[error("quantity must be at most {max}")]
    TooLarge { max: i32 },
}

/// What an "update quantity" submission asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Set the row to this quantity (1 to [`MAX_LINE_QUANTITY`]).
    Set(i32),
    /// Zero or negative: drop the row.
    Remove,
}

impl QuantityChange {
    /// Interpret the submitted `quantity` field; a missing field means 1.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::NotANumber` when the field is present but not
    /// an integer, and `QuantityError::TooLarge` above [`MAX_LINE_QUANTITY`].
    pub fn parse(raw: Option<&str>) -> Result<Self, QuantityError> {
        let quantity = match raw.map(str::trim) {
            None | Some("") => 1,
            Some(value) => value
                .parse::<i64>()
                .map_err(|_| QuantityError::NotANumber)?,
        };

        if quantity <= 0 {
            return Ok(Self::Remove);
        }
        match i32::try_from(quantity) {
            Ok(q) if q <= MAX_LINE_QUANTITY => Ok(Self::Set(q)),
            _ => Err(QuantityError::TooLarge {
                max: MAX_LINE_QUANTITY,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn line(id: i32, price: &str, quantity: i32) -> CartLine {
        CartLine {
            item_id: CartItemId::new(id),
            product_id: ProductId::new(id),
            product_name: format!("Product {id}"),
            image_url: format!("uploads/{id}.png"),
            unit_price: Price::parse(price).unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_empty_cart_totals_zero() {
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_total_sums_price_times_quantity() {
        let lines = [line(1, "19.99", 2), line(2, "0.10", 3)];
        assert_eq!(lines[0].line_total(), Decimal::from_str("39.98").unwrap());
        assert_eq!(cart_total(&lines), Decimal::from_str("40.28").unwrap());
    }

    #[test]
    fn test_quantity_defaults_to_one() {
        assert_eq!(QuantityChange::parse(None).unwrap(), QuantityChange::Set(1));
        assert_eq!(QuantityChange::parse(Some(" ")).unwrap(), QuantityChange::Set(1));
    }

    #[test]
    fn test_non_positive_quantity_removes() {
        assert_eq!(QuantityChange::parse(Some("0")).unwrap(), QuantityChange::Remove);
        assert_eq!(QuantityChange::parse(Some("-4")).unwrap(), QuantityChange::Remove);
    }

    #[test]
    fn test_quantity_must_be_integer() {
        assert_eq!(QuantityChange::parse(Some("5")).unwrap(), QuantityChange::Set(5));
        assert!(QuantityChange::parse(Some("two")).is_err());
        assert_eq!(
            QuantityChange::parse(Some("1.5")),
            Err(QuantityError::NotANumber)
        );
    }

    #[test]
    fn test_quantity_capped_per_line() {
        assert_eq!(
            QuantityChange::parse(Some("999")).unwrap(),
            QuantityChange::Set(MAX_LINE_QUANTITY)
        );
        for raw in ["1000", "200000000", "99999999999"] {
            let err = QuantityChange::parse(Some(raw)).unwrap_err();
            assert_eq!(err, QuantityError::TooLarge { max: 999 });
            assert_eq!(err.to_string(), "quantity must be at most 999");
        }
        // very negative still means remove
        assert_eq!(
            QuantityChange::parse(Some("-99999999999")).unwrap(),
            QuantityChange::Remove
        );
    }
}
