//! Authentication error types.

use thiserror::Error;

use emporium_core::{EmailError, UsernameError};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
///
/// The `Display` text of the validation variants is shown on the forms.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid username format.
    #[error("{0}")]
    InvalidUsername(#[from] UsernameError),

    /// Invalid email format.
    #[error("{0}")]
    InvalidEmail(#[from] EmailError),

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// Username already registered.
    #[error("username already taken")]
    UsernameTaken,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid username or password")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether the error is the user's to fix (shown on the form) rather
    /// than a server failure.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUsername(_)
                | Self::InvalidEmail(_)
                | Self::WeakPassword(_)
                | Self::UsernameTaken
                | Self::InvalidCredentials
        )
    }
}
