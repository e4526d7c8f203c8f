//! Accounts HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules, shared payload types and the mapping from
//! account errors to HTTP responses.
pub mod auth;
pub mod error;
pub mod openapi;
pub mod system;
pub mod types;
pub mod users;

use crate::api::error::{ApiError, api_validation_error};

/// Reject blank required fields with a 400 naming the first offender.
pub(crate) fn require_fields(fields: &[(&str, &str)]) -> Result<(), ApiError> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(api_validation_error(&format!("{name} must not be blank")));
        }
    }
    Ok(())
}
