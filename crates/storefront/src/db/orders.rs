//! Order queries, including the checkout transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};

use emporium_core::{CartItemId, OrderId, OrderStatus, Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::{CheckoutError, CheckoutLine, CheckoutPlan, Order, OrderLine};

const ORDER_COLUMNS: &str = "id, user_id, total_price, status, created_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total_price: Decimal,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    product_id: ProductId,
    product_name: String,
    quantity: i32,
    price: Decimal,
}

#[derive(sqlx::FromRow)]
struct CheckoutLineRow {
    cart_item_id: CartItemId,
    product_id: ProductId,
    quantity: i32,
    unit_price: Decimal,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into an order.
    ///
    /// The cart rows are locked and priced, the order and its items are
    /// written with those prices, and exactly the priced rows are deleted,
    /// all in one transaction. The inner `CheckoutError` (nothing written)
    /// reports an empty cart or a total too large to store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction is rolled back.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn checkout(
        &self,
        user_id: UserId,
    ) -> Result<Result<Order, CheckoutError>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<CheckoutLineRow> = sqlx::query_as(
            r"
            SELECT c.id AS cart_item_id, c.product_id, c.quantity, p.price AS unit_price
            FROM shop.cart_items c
            JOIN shop.products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.created_at, c.id
            FOR UPDATE OF c
            FOR SHARE OF p
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let lines = rows
            .into_iter()
            .map(|r| CheckoutLine {
                cart_item_id: r.cart_item_id,
                product_id: r.product_id,
                quantity: r.quantity,
                unit_price: Price::from_db(r.unit_price),
            })
            .collect();

        let plan = match CheckoutPlan::from_lines(lines) {
            Ok(plan) => plan,
            Err(e) => {
                tx.rollback().await?;
                return Ok(Err(e));
            }
        };

        let order: OrderRow = sqlx::query_as(&format!(
            r"
            INSERT INTO shop.orders (user_id, total_price, status)
            VALUES ($1, $2, $3)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(plan.total)
        .bind(OrderStatus::default())
        .fetch_one(&mut *tx)
        .await?;

        let (product_ids, quantities, prices) = plan.item_columns();
        sqlx::query(
            r"
            INSERT INTO shop.order_items (order_id, product_id, quantity, price)
            SELECT $1, item.product_id, item.quantity, item.price
            FROM UNNEST($2::INTEGER[], $3::INTEGER[], $4::NUMERIC[])
                AS item(product_id, quantity, price)
            ",
        )
        .bind(order.id)
        .bind(&product_ids)
        .bind(&quantities)
        .bind(&prices)
        .execute(&mut *tx)
        .await?;

        let cleared = sqlx::query("DELETE FROM shop.cart_items WHERE id = ANY($1) AND user_id = $2")
            .bind(plan.cart_item_ids())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            lines = plan.lines.len(),
            cleared = cleared.rows_affected(),
            total = %plan.total,
            "Order placed"
        );

        Ok(Ok(order.into()))
    }

    /// Get one of the user's orders.
    ///
    /// Orders of other users are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Items of an order with their product names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let rows: Vec<OrderLineRow> = sqlx::query_as(
            r"
            SELECT i.product_id, p.name AS product_name, i.quantity, i.price
            FROM shop.order_items i
            JOIN shop.products p ON p.id = i.product_id
            WHERE i.order_id = $1
            ORDER BY i.id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| OrderLine {
                product_id: r.product_id,
                product_name: r.product_name,
                quantity: r.quantity,
                price: Price::from_db(r.price),
            })
            .collect())
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }
}
