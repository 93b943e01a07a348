//! Emporium Core - Shared domain types.
//!
//! This crate provides the types shared by the Emporium components:
//! - `storefront` - The web application (catalog, cart, checkout, admin)
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP. Validation lives here so that forms, the CLI and the database
//! layer agree on what a valid username, email or price is.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, usernames and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
