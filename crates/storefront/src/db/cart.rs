//! Cart item queries.
//!
//! Cart rows are always addressed together with their owner so a user can
//! never change someone else's cart through these methods.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use emporium_core::{CartItemId, Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::{CartLine, MAX_LINE_QUANTITY};

/// A bare `cart_items` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct CartItemRecord {
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    item_id: CartItemId,
    product_id: ProductId,
    product_name: String,
    image_url: String,
    unit_price: Decimal,
    quantity: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            item_id: row.item_id,
            product_id: row.product_id,
            product_name: row.product_name,
            image_url: row.image_url,
            unit_price: Price::from_db(row.unit_price),
            quantity: row.quantity,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add one unit of a product, merging with an existing row.
    ///
    /// A row already at [`MAX_LINE_QUANTITY`] stays there. Returns the row's
    /// quantity after the change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product no longer exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_one(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<i32, RepositoryError> {
        let (quantity,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO shop.cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = LEAST(shop.cart_items.quantity, $3 - 1) + 1,
                          updated_at = NOW()
            RETURNING quantity
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(MAX_LINE_QUANTITY)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(quantity)
    }

    /// Get a cart row by ID regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_item(&self, id: CartItemId) -> Result<Option<CartItemRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRecord>(
            "SELECT id, user_id, product_id, quantity FROM shop.cart_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// The user's cart, in the order items were first added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows: Vec<CartLineRow> = sqlx::query_as(
            r"
            SELECT c.id AS item_id, p.id AS product_id, p.name AS product_name,
                   p.image_url, p.price AS unit_price, c.quantity
            FROM shop.cart_items c
            JOIN shop.products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.created_at, c.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLine::from).collect())
    }

    /// Set the quantity of one of the user's rows. `quantity` must be
    /// between 1 and [`MAX_LINE_QUANTITY`].
    ///
    /// Returns `false` when no row of this user matched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn set_quantity(
        &self,
        id: CartItemId,
        user_id: UserId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.cart_items
            SET quantity = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete one of the user's rows.
    ///
    /// Returns `false` when no row of this user matched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn delete_item(&self, id: CartItemId, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
