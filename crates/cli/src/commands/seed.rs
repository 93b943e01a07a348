//! Seed the database with a default admin account.
//!
//! Does nothing when any admin account already exists, so it is safe to run
//! on every deploy.

use thiserror::Error;
use tracing::{info, warn};

use emporium_storefront::db::{RepositoryError, UserRepository};
use emporium_storefront::services::{AuthError, AuthService};

use super::{CommandError, connect};

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_EMAIL: &str = "admin@example.com";
pub const DEFAULT_PASSWORD: &str = "admin123";

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Could not create admin: {0}")]
    Auth(#[from] AuthError),
}

/// Create the default admin account unless an admin already exists.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the account cannot be
/// created.
pub async fn default_admin(username: &str, email: &str, password: &str) -> Result<(), SeedError> {
    let pool = connect().await?;

    if UserRepository::new(&pool).any_admin_exists().await? {
        info!("An admin account already exists, nothing to seed");
        return Ok(());
    }

    let user = AuthService::new(&pool)
        .create_admin(username, email, password)
        .await?;

    info!(user_id = %user.id, username = %user.username, "Default admin created");
    if password == DEFAULT_PASSWORD {
        warn!("The default admin uses the built-in password; pass --password to seed a stronger one");
    }

    Ok(())
}
