//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! emporium-cli admin create -u alice -e alice@example.com -p 'correct horse'
//! ```

use thiserror::Error;

use emporium_core::UserId;
use emporium_storefront::services::{AuthError, AuthService};

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Validation failed or the username is taken.
    #[error("Could not create admin: {0}")]
    Auth(#[from] AuthError),
}

/// Create a new admin account.
///
/// Applies the same username, email and password rules as registration.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the database is unreachable, a field is invalid, or
/// the username is already registered.
pub async fn create_user(username: &str, email: &str, password: &str) -> Result<UserId, AdminError> {
    let pool = connect().await?;

    tracing::info!("Creating admin user: {}", username);
    let user = AuthService::new(&pool)
        .create_admin(username, email, password)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Username: {}, Email: {}",
        user.id,
        user.username,
        user.email
    );

    Ok(user.id)
}
