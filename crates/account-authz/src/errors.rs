use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("role not found: {0}")]
    RoleNotFound(String),
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),
    #[error("invalid session ttl: {0}")]
    InvalidSessionTtl(String),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("session token carries unknown role {0}")]
    UnknownTokenRole(String),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthzError::RoleNotFound("ROLE_ROOT".to_string()),
            AuthzError::InvalidSigningKey("short seed".to_string()),
            AuthzError::InvalidSessionTtl("0s".to_string()),
            AuthzError::UnknownTokenRole("ROLE_ROOT".to_string()),
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }
}
