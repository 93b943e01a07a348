//! Emporium storefront library.
//!
//! Catalog browsing, accounts, a per-user cart, transactional checkout and
//! a role-gated product admin, served as server-rendered pages. The binary
//! in `main.rs` only wires configuration, telemetry and the listener around
//! [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
