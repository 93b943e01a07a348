//! Checkout and order confirmation.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tower_sessions::Session;
use tracing::instrument;

use emporium_core::{OrderId, format_amount};

use super::PageContext;
use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireAuth, push_flash};
use crate::models::{FlashLevel, Order, OrderLine};
use crate::state::AppState;

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/success.html")]
pub struct OrderSuccessTemplate {
    pub page: PageContext,
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

/// Place an order for everything in the cart.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<Redirect> {
    let order = match OrderRepository::new(state.pool()).checkout(user.id).await? {
        Ok(order) => order,
        Err(e) => {
            tracing::info!(reason = ?e, "Checkout refused");
            push_flash(&session, FlashLevel::Warning, e.to_string()).await?;
            return Ok(Redirect::to("/cart"));
        }
    };

    let order_ref = order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_ref.as_str())]));

    push_flash(
        &session,
        FlashLevel::Success,
        format!(
            "Order #{} placed, total {}.",
            order.id,
            format_amount(order.total_price)
        ),
    )
    .await?;

    Ok(Redirect::to(&format!("/order/success/{}", order.id)))
}

/// Confirmation page for one of the user's orders.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %order_id))]
pub async fn success(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(order_id): Path<OrderId>,
) -> Result<OrderSuccessTemplate> {
    let orders = OrderRepository::new(state.pool());

    let order = orders
        .get_for_user(order_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
    let lines = orders.lines(order.id).await?;

    Ok(OrderSuccessTemplate {
        page: PageContext::load(&session).await,
        order,
        lines,
    })
}
