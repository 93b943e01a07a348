//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (database)
//! GET  /static/*                       - CSS and uploaded product images
//!
//! # Catalog
//! GET  /                               - All products, newest first
//! GET  /product/{id}                   - Product detail
//!
//! # Auth
//! GET  /register, POST /register       - Create an account
//! GET  /login,    POST /login          - Log in (?next=/path)
//! GET  /logout,   POST /logout         - Log out
//!
//! # Account (requires auth)
//! GET  /user_center                    - Overview and order history
//! GET  /profile,  POST /profile        - Edit username and email
//!
//! # Cart (requires auth)
//! POST /add_to_cart/{product_id}       - Add one unit
//! GET  /cart                           - Cart page
//! POST /update_cart/{item_id}          - Set quantity (<= 0 removes)
//! GET  /remove_from_cart/{item_id}     - Remove a line
//!
//! # Checkout (requires auth)
//! POST /checkout                       - Turn the cart into an order
//! GET  /order/success/{order_id}       - Order confirmation
//!
//! # Admin (requires admin)
//! GET  /admin                          - Users and products
//! GET  /admin/add_product,       POST  - Create a product (multipart)
//! GET  /admin/edit_product/{id}, POST  - Edit a product (multipart)
//! POST /admin/delete_product/{id}      - Delete a product
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::Session;
use tower_sessions_sqlx_store::PostgresStore;

use crate::middleware::{
    auth_rate_limiter, create_session_layer, request_id_middleware, security_headers_middleware,
    take_flashes,
};
use crate::models::{CurrentUser, FlashMessage, session_keys};
use crate::state::AppState;

/// Data every page needs for the shared layout: who is logged in and which
/// flash messages to show.
#[derive(Debug, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub flashes: Vec<FlashMessage>,
}

impl PageContext {
    /// Read the user and consume pending flashes.
    ///
    /// Call only when a page is actually rendered, otherwise the flashes
    /// are lost.
    pub async fn load(session: &Session) -> Self {
        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let flashes = take_flashes(session).await;

        Self { user, flashes }
    }

    /// Whether to show the admin link.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

/// Catalog, auth and account routes.
///
/// Login and registration are rate limited per client IP; proxy headers
/// name the client only when `trust_proxy_headers` is set.
fn public_routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/product/{id}", get(home::product_detail))
        .route(
            "/register",
            get(auth::register_page)
                .merge(post(auth::register).layer(auth_rate_limiter(trust_proxy_headers))),
        )
        .route(
            "/login",
            get(auth::login_page)
                .merge(post(auth::login).layer(auth_rate_limiter(trust_proxy_headers))),
        )
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/user_center", get(account::user_center))
        .route(
            "/profile",
            get(account::profile_page).post(account::update_profile),
        )
}

/// Cart and checkout routes.
fn shopping_routes() -> Router<AppState> {
    Router::new()
        .route("/add_to_cart/{product_id}", post(cart::add))
        .route("/cart", get(cart::show))
        .route("/update_cart/{item_id}", post(cart::update))
        .route("/remove_from_cart/{item_id}", get(cart::remove))
        .route("/checkout", post(checkout::checkout))
        .route("/order/success/{order_id}", get(checkout::success))
}

/// Product administration routes, with the upload body limit.
fn admin_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::dashboard))
        .route(
            "/admin/add_product",
            get(admin::add_product_page).post(admin::add_product),
        )
        .route(
            "/admin/edit_product/{id}",
            get(admin::edit_product_page).post(admin::edit_product),
        )
        .route("/admin/delete_product/{id}", post(admin::delete_product))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Build the complete application with all middleware.
pub fn app(state: AppState, session_store: PostgresStore) -> Router {
    let session_layer = create_session_layer(session_store, state.config());
    let static_dir = state.config().static_dir.clone();
    let max_upload_bytes = state.config().upload.max_bytes;
    let trusted_proxy = state.config().trusted_proxy;

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(public_routes(trusted_proxy))
        .merge(shopping_routes())
        .merge(admin_routes(max_upload_bytes))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(
            ServiceBuilder::new()
                .layer(sentry_tower::NewSentryLayer::<Request>::new_from_top())
                .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()),
        )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use axum::body::Body;
    use axum::http::{Method, header};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{SentryConfig, StorefrontConfig, UploadConfig};

    /// App over a pool that never connects; only routes that stay away from
    /// the database can be exercised.
    fn test_app() -> Router {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/emporium_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            static_dir: PathBuf::from("static"),
            upload: UploadConfig {
                dir: std::env::temp_dir().join("emporium-router-test"),
                max_bytes: 1024,
            },
            trusted_proxy: false,
            sentry: SentryConfig::default(),
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/emporium_test")
            .unwrap();
        let store = PostgresStore::new(pool.clone());
        app(AppState::new(config, pool), store)
    }

    fn get(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
    }

    #[tokio::test]
    async fn test_cart_requires_login() {
        let response = test_app().oneshot(get("/cart")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login?next=%2Fcart");
    }

    #[tokio::test]
    async fn test_checkout_requires_login() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/checkout")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_admin_requires_login() {
        let response = test_app().oneshot(get("/admin")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login?next=%2Fadmin");
    }

    #[tokio::test]
    async fn test_upstream_request_id_is_echoed() {
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[test]
    fn test_page_context_admin_flag() {
        assert!(!PageContext::default().is_admin());
    }
}
