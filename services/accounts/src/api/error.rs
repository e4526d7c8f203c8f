//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Keeps error bodies uniform across endpoints and translates account errors
//! into HTTP responses.
//!
//! # Key invariants and assumptions
//! - Every error body carries a stable `code` and a human-readable `message`.
//! - Policy errors keep their fixed message; internal errors are logged and
//!   answered with a generic message.
use crate::api::types::ErrorResponse;
use crate::auth::AccountError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Structured API error returned by handlers.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use accounts::api::error::ApiError;
/// use accounts::api::types::ErrorResponse;
///
/// let err = ApiError {
///     status: StatusCode::BAD_REQUEST,
///     body: ErrorResponse {
///         code: "user_not_found".to_string(),
///         message: "User was not recognized.".to_string(),
///         request_id: None,
///     },
/// };
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

/// Build a 500 from a collaborator failure, logging the detail.
pub fn api_internal(message: &str, err: &dyn std::error::Error) -> ApiError {
    tracing::error!(error = %err, source = ?err.source(), "accounts internal error");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn api_unauthorized(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

/// Build a 400 for malformed or blank input.
pub fn api_validation_error(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "validation_error", message)
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        if err.is_internal() {
            return api_internal("internal error", &err);
        }
        let status = match err {
            AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AccountError::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        };
        api_error(status, err.code(), &err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn api_error_helpers_build_expected_codes() {
        let unauthorized = api_unauthorized("nope");
        assert_eq!(unauthorized.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unauthorized.body.code, "unauthorized");

        let forbidden = api_forbidden("nope");
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        assert_eq!(forbidden.body.code, "forbidden");

        let validation = api_validation_error("bad");
        assert_eq!(validation.status, StatusCode::BAD_REQUEST);
        assert_eq!(validation.body.code, "validation_error");
    }

    #[test]
    fn account_errors_map_to_status_and_code() {
        let cases = [
            (AccountError::DuplicateUsername, StatusCode::BAD_REQUEST, "duplicate_username"),
            (AccountError::DuplicateEmail, StatusCode::BAD_REQUEST, "duplicate_email"),
            (AccountError::AccountSuspended, StatusCode::BAD_REQUEST, "account_suspended"),
            (AccountError::UserNotFound, StatusCode::BAD_REQUEST, "user_not_found"),
            (AccountError::RoleNotFound, StatusCode::BAD_REQUEST, "role_not_found"),
            (
                AccountError::CannotRevokeOwnAuthority,
                StatusCode::BAD_REQUEST,
                "cannot_revoke_own_authority",
            ),
            (
                AccountError::CannotDeleteOwnAccount,
                StatusCode::BAD_REQUEST,
                "cannot_delete_own_account",
            ),
            (
                AccountError::InvalidCredentials,
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
            ),
            (AccountError::Forbidden, StatusCode::FORBIDDEN, "forbidden"),
        ];
        for (err, status, code) in cases {
            let message = err.to_string();
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.body.code, code);
            assert_eq!(api.body.message, message);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AccountError::Store(StoreError::Unexpected(anyhow::anyhow!("db password=hunter2")));
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body.code, "internal");
        assert_eq!(api.body.message, "internal error");
    }
}
