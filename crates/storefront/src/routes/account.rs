//! Account pages: user center and profile editing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::PageContext;
use crate::db::OrderRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAuth, push_flash, refresh_current_user};
use crate::models::{CurrentUser, FlashLevel, Order, User};
use crate::services::AuthService;
use crate::state::AppState;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
}

/// User center template.
#[derive(Template, WebTemplate)]
#[template(path = "account/user_center.html")]
pub struct UserCenterTemplate {
    pub page: PageContext,
    pub user: User,
    pub orders: Vec<Order>,
}

/// Profile form template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub username: String,
    pub email: String,
    pub error: Option<String>,
}

/// Account overview with order history.
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn user_center(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
) -> Result<UserCenterTemplate> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;
    let orders = OrderRepository::new(state.pool())
        .list_for_user(current.id)
        .await?;

    Ok(UserCenterTemplate {
        page: PageContext::load(&session).await,
        user,
        orders,
    })
}

/// Display the profile form, prefilled from the database.
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn profile_page(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
) -> Result<ProfileTemplate> {
    let user = AuthService::new(state.pool()).get_user(current.id).await?;

    Ok(ProfileTemplate {
        page: PageContext::load(&session).await,
        username: user.username.to_string(),
        email: user.email.to_string(),
        error: None,
    })
}

/// Save username and email.
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    session: Session,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .update_profile(current.id, &form.username, &form.email)
        .await
    {
        Ok(user) => {
            refresh_current_user(&session, &CurrentUser::from(&user)).await?;
            push_flash(&session, FlashLevel::Success, "Profile updated.").await?;
            Ok(Redirect::to("/profile").into_response())
        }
        Err(e) if e.is_user_error() => Ok(ProfileTemplate {
            page: PageContext::load(&session).await,
            username: form.username,
            email: form.email,
            error: Some(e.to_string()),
        }
        .into_response()),
        Err(e) => Err(e.into()),
    }
}
