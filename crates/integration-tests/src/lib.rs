//! Integration tests for the Emporium storefront.
//!
//! The tests drive a running storefront over HTTP and inspect its database
//! directly. They are `#[ignore]`d so `cargo test` stays hermetic.
//!
//! # Running Tests
//!
//! ```bash
//! emporium-cli migrate
//! STOREFRONT_TRUSTED_PROXY=true cargo run -p emporium-storefront &
//! cargo test -p emporium-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_TEST_URL` - Storefront base URL (default: `http://localhost:3000`)
//! - `STOREFRONT_DATABASE_URL` - Same database the server uses (falls back to `DATABASE_URL`)
//!
//! Each shopper sends its own `X-Forwarded-For` address. The server must run
//! with `STOREFRONT_TRUSTED_PROXY=true` so the login rate limiter keys on it.

use std::net::Ipv4Addr;

use reqwest::header::{HeaderMap, HeaderValue, LOCATION};
use reqwest::{Client, Response, StatusCode, redirect};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use uuid::Uuid;

use emporium_core::{CartItemId, OrderId, ProductId, UserId};

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "hunter22";

/// Base URL of the storefront under test.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_TEST_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Connect to the storefront database.
///
/// # Panics
///
/// Panics if no database URL is configured or the database is unreachable.
pub async fn connect_db() -> PgPool {
    let url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .expect("STOREFRONT_DATABASE_URL or DATABASE_URL must be set");

    PgPool::connect(url.expose_secret())
        .await
        .expect("Failed to connect to storefront database")
}

/// A random private address, so each shopper gets its own rate-limit bucket
/// on a server that trusts proxy headers.
fn random_client_ip() -> Ipv4Addr {
    let [a, b, c, ..] = *Uuid::new_v4().as_bytes();
    Ipv4Addr::new(10, a, b, c)
}

/// Read the `Location` header of a redirect.
///
/// # Panics
///
/// Panics if the response is not a 303 redirect.
#[must_use]
pub fn location(response: &Response) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("redirect without Location header")
        .to_string()
}

/// A logged-in customer with its own cookie jar.
pub struct Shopper {
    pub client: Client,
    pub base_url: String,
    pub username: String,
    pub user_id: UserId,
}

impl Shopper {
    /// Build a cookie-keeping client that does not follow redirects.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client() -> Client {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_str(&random_client_ip().to_string())
                .expect("an IPv4 address is a valid header value"),
        );

        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Register a fresh account and log in with it.
    ///
    /// # Panics
    ///
    /// Panics if registration or login does not redirect as expected.
    pub async fn sign_up(db: &PgPool) -> Self {
        let client = Self::client();
        let base_url = storefront_url();
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(12).collect();
        let username = format!("it_{suffix}");

        let resp = client
            .post(format!("{base_url}/register"))
            .form(&[
                ("username", username.as_str()),
                ("email", &format!("{username}@example.com")),
                ("password", TEST_PASSWORD),
            ])
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(location(&resp), "/login");

        let resp = client
            .post(format!("{base_url}/login"))
            .form(&[("username", username.as_str()), ("password", TEST_PASSWORD)])
            .send()
            .await
            .expect("Failed to log in");
        assert_eq!(location(&resp), "/");

        let user_id = sqlx::query_scalar("SELECT id FROM shop.users WHERE username = $1")
            .bind(&username)
            .fetch_one(db)
            .await
            .expect("registered user missing from database");

        Self {
            client,
            base_url,
            username,
            user_id,
        }
    }

    /// GET a storefront path.
    ///
    /// # Panics
    ///
    /// Panics on transport errors.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("GET request failed")
    }

    /// POST a form to a storefront path.
    ///
    /// # Panics
    ///
    /// Panics on transport errors.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .form(form)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Add one unit of a product to the cart.
    pub async fn add_to_cart(&self, product_id: ProductId) -> Response {
        self.post_form(&format!("/add_to_cart/{product_id}"), &[])
            .await
    }

    /// Check out and return the new order's ID.
    ///
    /// # Panics
    ///
    /// Panics if checkout does not redirect to an order confirmation.
    pub async fn checkout(&self) -> OrderId {
        let resp = self.post_form("/checkout", &[]).await;
        location(&resp)
            .strip_prefix("/order/success/")
            .and_then(|id| id.parse().ok())
            .expect("checkout did not redirect to an order")
    }

    /// Grant this account the admin flag.
    ///
    /// # Panics
    ///
    /// Panics on database errors.
    pub async fn set_admin(&self, db: &PgPool, is_admin: bool) {
        sqlx::query("UPDATE shop.users SET is_admin = $1 WHERE id = $2")
            .bind(is_admin)
            .bind(self.user_id)
            .execute(db)
            .await
            .expect("Failed to update admin flag");
    }

    /// This shopper's cart as `(item id, product id, quantity)` rows.
    ///
    /// # Panics
    ///
    /// Panics on database errors.
    pub async fn cart_rows(&self, db: &PgPool) -> Vec<(CartItemId, ProductId, i32)> {
        sqlx::query_as(
            "SELECT id, product_id, quantity FROM shop.cart_items WHERE user_id = $1 ORDER BY id",
        )
        .bind(self.user_id)
        .fetch_all(db)
        .await
        .expect("Failed to read cart")
    }
}

/// Insert a catalog product directly.
///
/// # Panics
///
/// Panics on database errors or an unparsable price.
pub async fn insert_product(db: &PgPool, name: &str, price: &str) -> ProductId {
    let price: Decimal = price.parse().expect("test price must be a decimal");
    sqlx::query_scalar(
        "INSERT INTO shop.products (name, description, price, image_url) \
         VALUES ($1, 'Integration test product', $2, 'uploads/test.png') RETURNING id",
    )
    .bind(name)
    .bind(price)
    .fetch_one(db)
    .await
    .expect("Failed to insert product")
}

/// Change a product's current price.
///
/// # Panics
///
/// Panics on database errors or an unparsable price.
pub async fn set_product_price(db: &PgPool, product_id: ProductId, price: &str) {
    let price: Decimal = price.parse().expect("test price must be a decimal");
    sqlx::query("UPDATE shop.products SET price = $1 WHERE id = $2")
        .bind(price)
        .bind(product_id)
        .execute(db)
        .await
        .expect("Failed to update price");
}

/// Read a response body.
///
/// # Panics
///
/// Panics if the body cannot be read.
pub async fn body(response: Response) -> String {
    response.text().await.expect("Failed to read response body")
}
