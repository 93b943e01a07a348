//! Cart route handlers.
//!
//! Cart lines are addressed by cart item ID. A missing item is a 404; an
//! item belonging to someone else is never changed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use emporium_core::{CartItemId, ProductId};

use super::PageContext;
use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireAuth, push_flash};
use crate::models::{CartLine, FlashLevel, QuantityChange, cart_total};
use crate::state::AppState;

/// Quantity update form.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    #[serde(default)]
    pub quantity: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

/// Add one unit of a product to the cart.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Redirect> {
    let product = ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let quantity = CartRepository::new(state.pool())
        .add_one(user.id, product.id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("product {product_id}")),
            other => other.into(),
        })?;

    let product_ref = product.id.to_string();
    let quantity_ref = quantity.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[
            ("product_id", product_ref.as_str()),
            ("quantity", quantity_ref.as_str()),
        ]),
    );

    push_flash(
        &session,
        FlashLevel::Success,
        format!("Added {} to your cart.", product.name),
    )
    .await?;

    Ok(Redirect::to("/"))
}

/// Display the cart with line totals and the cart total.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<CartTemplate> {
    let lines = CartRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    let total = cart_total(&lines);

    Ok(CartTemplate {
        page: PageContext::load(&session).await,
        lines,
        total,
    })
}

/// Set the quantity of a cart line; zero or less removes it.
#[instrument(skip_all, fields(user_id = %user.id, item_id = %item_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let carts = CartRepository::new(state.pool());

    let item = carts
        .get_item(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cart item {item_id}")))?;
    if item.user_id != user.id {
        tracing::warn!(owner_id = %item.user_id, "Cart update on another user's item");
        return Err(AppError::Forbidden(format!("cart item {item_id}")));
    }

    let change = QuantityChange::parse(form.quantity.as_deref())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    match change {
        QuantityChange::Set(quantity) => {
            carts.set_quantity(item_id, user.id, quantity).await?;
        }
        QuantityChange::Remove => {
            carts.delete_item(item_id, user.id).await?;
        }
    }

    let item_ref = item_id.to_string();
    add_breadcrumb("cart", "Updated cart line", Some(&[("item_id", item_ref.as_str())]));

    Ok(Redirect::to("/cart"))
}

/// Remove a line from the cart.
#[instrument(skip_all, fields(user_id = %user.id, item_id = %item_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(item_id): Path<CartItemId>,
) -> Result<Redirect> {
    let carts = CartRepository::new(state.pool());

    let item = carts
        .get_item(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cart item {item_id}")))?;

    if item.user_id == user.id && carts.delete_item(item_id, user.id).await? {
        push_flash(&session, FlashLevel::Info, "Item removed from your cart.").await?;
    }

    Ok(Redirect::to("/cart"))
}
