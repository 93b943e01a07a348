//! User domain types.

use chrono::{DateTime, Utc};

use emporium_core::{Email, UserId, Username};

/// A registered account.
///
/// The password hash is deliberately not part of this type; it is only read
/// by [`crate::db::users::UserRepository::get_credentials`] during login.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// Contact email address.
    pub email: Email,
    /// Whether the user may use the admin area.
    pub is_admin: bool,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}
