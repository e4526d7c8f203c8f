//! Route gate: bearer token to actor identity.
//!
//! # Purpose
//! Resolves the acting [`Identity`] from `Authorization: Bearer <token>` and
//! checks that it holds the role a route requires.
//!
//! # Security considerations
//! - A missing, malformed or unverifiable token is 401; a valid token without
//!   the required role is 403.
//! - The identity is the snapshot from the token. Role changes made after the
//!   token was issued are not seen until the holder logs in again.
use crate::api::error::{ApiError, api_forbidden, api_unauthorized};
use crate::app::AppState;
use account_authz::{Identity, Role, policy};
use axum::http::HeaderMap;

pub fn require_role(
    state: &AppState,
    headers: &HeaderMap,
    required: Role,
) -> Result<Identity, ApiError> {
    let bearer = extract_bearer(headers).ok_or_else(|| api_unauthorized("missing bearer token"))?;
    let actor = state.engine.sessions().validate(bearer).map_err(|err| {
        tracing::debug!(error = %err, "rejected session token");
        api_unauthorized("invalid token")
    })?;
    if !policy::holds(&actor, required) {
        metrics::counter!("accounts_authz_denials_total", "reason" => "missing_role").increment(1);
        tracing::info!(actor = %actor.username, required = %required, "route gate denied");
        return Err(api_forbidden(&format!("missing {required}")));
    }
    Ok(actor)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?;
    let value = value.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::trim).filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("header"),
        );
        headers
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer(&headers("Basic abc")), None);
        assert_eq!(extract_bearer(&headers("Bearer ")), None);
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }
}
