//! Accounts service library crate.
//!
//! # Purpose
//! Exposes the HTTP API, the account policy engine, configuration,
//! observability and storage backends for use by the binary and tests.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod store;
