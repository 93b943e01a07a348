//! Order types and the checkout plan.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use emporium_core::{CartItemId, OrderId, OrderStatus, Price, ProductId, UserId, format_amount};

/// Largest order total the `NUMERIC(12,2)` column holds.
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Why a cart cannot be turned into an order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Your cart is empty.")]
    EmptyCart,
    #[error(
        "Orders are limited to {}. Please reduce some quantities.",
        format_amount(MAX_ORDER_TOTAL)
    )]
    TotalTooLarge { total: Decimal },
}

/// A placed order.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Placement time as shown on order pages.
    #[must_use]
    pub fn placed_at(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// An order item joined with its product name, for display.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    /// Unit price captured at checkout.
    pub price: Price,
}

impl OrderLine {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.times(self.quantity)
    }
}

/// A locked cart row with the product price read inside the checkout
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub cart_item_id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Price,
}

/// Everything checkout writes: the order total and one snapshot per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub total: Decimal,
    pub lines: Vec<CheckoutLine>,
}

impl CheckoutPlan {
    /// Build the plan for a cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` for an empty cart and
    /// `CheckoutError::TotalTooLarge` when the total exceeds
    /// [`MAX_ORDER_TOTAL`].
    pub fn from_lines(lines: Vec<CheckoutLine>) -> Result<Self, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let total: Decimal = lines
            .iter()
            .map(|line| line.unit_price.times(line.quantity))
            .sum();
        if total > MAX_ORDER_TOTAL {
            return Err(CheckoutError::TotalTooLarge { total });
        }
        Ok(Self { total, lines })
    }

    /// Cart rows to delete once the order is written.
    #[must_use]
    pub fn cart_item_ids(&self) -> Vec<i32> {
        self.lines.iter().map(|l| l.cart_item_id.as_i32()).collect()
    }

    /// Column vectors for a single `UNNEST` insert of the order items:
    /// product ids, quantities and snapshot prices.
    #[must_use]
    pub fn item_columns(&self) -> (Vec<i32>, Vec<i32>, Vec<Decimal>) {
        let mut product_ids = Vec::with_capacity(self.lines.len());
        let mut quantities = Vec::with_capacity(self.lines.len());
        let mut prices = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            product_ids.push(line.product_id.as_i32());
            quantities.push(line.quantity);
            prices.push(line.unit_price.amount());
        }
        (product_ids, quantities, prices)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn checkout_line(item: i32, product: i32, quantity: i32, price: &str) -> CheckoutLine {
        CheckoutLine {
            cart_item_id: CartItemId::new(item),
            product_id: ProductId::new(product),
            quantity,
            unit_price: Price::parse(price).unwrap(),
        }
    }

    #[test]
    fn test_empty_cart_has_no_plan() {
        assert_eq!(
            CheckoutPlan::from_lines(Vec::new()),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_total_limited_to_order_column() {
        assert_eq!(MAX_ORDER_TOTAL, Decimal::from_str("9999999999.99").unwrap());

        // 99 999 999.99 x 100 fits exactly below the limit
        let plan = CheckoutPlan::from_lines(vec![checkout_line(1, 1, 100, "99999999.99")]);
        assert_eq!(plan.unwrap().total, Decimal::from_str("9999999999.00").unwrap());

        let err = CheckoutPlan::from_lines(vec![
            checkout_line(1, 1, 100, "99999999.99"),
            checkout_line(2, 2, 1, "1.00"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            CheckoutError::TotalTooLarge {
                total: Decimal::from_str("10000000000.00").unwrap()
            }
        );
        assert!(err.to_string().contains("reduce some quantities"));
    }

    #[test]
    fn test_plan_total_and_snapshots() {
        let plan = CheckoutPlan::from_lines(vec![
            checkout_line(10, 1, 2, "5.25"),
            checkout_line(11, 2, 1, "100"),
        ])
        .unwrap();

        assert_eq!(plan.total, Decimal::from_str("110.50").unwrap());
        assert_eq!(plan.cart_item_ids(), vec![10, 11]);

        let (products, quantities, prices) = plan.item_columns();
        assert_eq!(products, vec![1, 2]);
        assert_eq!(quantities, vec![2, 1]);
        assert_eq!(
            prices,
            vec![
                Decimal::from_str("5.25").unwrap(),
                Decimal::from_str("100.00").unwrap()
            ]
        );
    }

    #[test]
    fn test_order_line_total_uses_snapshot_price() {
        let line = OrderLine {
            product_id: ProductId::new(1),
            product_name: "Tea".into(),
            quantity: 4,
            price: Price::parse("2.50").unwrap(),
        };
        assert_eq!(line.line_total(), Decimal::from_str("10.00").unwrap());
    }
}
