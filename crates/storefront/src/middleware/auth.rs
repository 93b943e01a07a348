//! Authentication extractors.
//!
//! `RequireAuth` reads the [`CurrentUser`] from the session. `RequireAdmin` additionally re-checks the admin flag in the
//! database so a revoked admin loses access on their next request.

use axum::{
    extract::FromRequestParts,
    http::{Method, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::flash::push_flash;
use crate::db::UserRepository;
use crate::error::AppError;
use crate::models::{CurrentUser, FlashLevel, session_keys};
use crate::state::AppState;

/// Flash shown to logged-in users who try the admin area.
pub const ADMIN_DENIED_MESSAGE: &str = "You do not have permission to access the admin area.";

/// Extractor that requires a logged-in user.
///
/// If nobody is logged in, redirects to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but nobody is logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page, with the path to return to.
    RedirectToLogin(Option<String>),
    /// No session layer on this route.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(None) => Redirect::to("/login").into_response(),
            Self::RedirectToLogin(Some(next)) => {
                Redirect::to(&format!("/login?next={}", urlencoding::encode(&next)))
                    .into_response()
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Where to send the user back to after logging in.
///
/// Only `GET` requests can be replayed by a redirect, and returning to
/// `/logout` would end the new session straight away.
fn return_path(parts: &Parts) -> Option<String> {
    if parts.method != Method::GET || parts.uri.path() == "/logout" {
        return None;
    }
    parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .filter(|path| path != "/")
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| AuthRejection::RedirectToLogin(return_path(parts)))?;

        Ok(Self(user))
    }
}

/// Extractor that requires a logged-in user whose account is an admin.
///
/// Logged-in non-admins are sent to `/` with a danger flash.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let is_admin = UserRepository::new(state.pool())
            .is_admin(user.id)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        if is_admin {
            return Ok(Self(user));
        }

        tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin access denied");
        if let Some(session) = parts.extensions.get::<Session>() {
            push_flash(session, FlashLevel::Danger, ADMIN_DENIED_MESSAGE)
                .await
                .map_err(|e| AppError::from(e).into_response())?;
        }

        Err(Redirect::to("/").into_response())
    }
}

/// Store the logged-in user in the session.
///
/// The session ID is cycled first so a pre-login session ID cannot be
/// reused after login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Replace the stored identity without cycling the session (profile edits).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn refresh_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Log out: drop all session data and delete the session record.
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
