//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login and profile changes (Argon2id passwords)
//! - `uploads` - Product image validation and storage

pub mod auth;
pub mod uploads;

pub use auth::{AuthError, AuthService};
pub use uploads::{UploadError, UploadStore};
