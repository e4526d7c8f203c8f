//! Error taxonomy for account operations.
//!
//! Expected policy outcomes are ordinary variants with fixed, client-safe
//! messages. Only collaborator failures (`Store`, `Session`, `Hashing`) are
//! internal, and their details stay in the logs.
use crate::store::StoreError;
use account_authz::AuthzError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Error: Username already exists.")]
    DuplicateUsername,
    #[error("Error: Email already exists.")]
    DuplicateEmail,
    #[error("Bad credentials.")]
    InvalidCredentials,
    #[error("This account is suspended.")]
    AccountSuspended,
    #[error("User was not recognized.")]
    UserNotFound,
    #[error("Error: Role is not found.")]
    RoleNotFound,
    #[error("You can not revoke your own grants.")]
    CannotRevokeOwnAuthority,
    #[error("You can not delete your own account.")]
    CannotDeleteOwnAccount,
    #[error("You are not allowed to perform this action.")]
    Forbidden,
    #[error("account storage failed")]
    Store(#[from] StoreError),
    #[error("session could not be issued")]
    Session(#[from] AuthzError),
    #[error("password could not be hashed")]
    Hashing(#[source] anyhow::Error),
}

impl AccountError {
    /// Stable snake_case code used in API error bodies and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::DuplicateUsername => "duplicate_username",
            AccountError::DuplicateEmail => "duplicate_email",
            AccountError::InvalidCredentials => "invalid_credentials",
            AccountError::AccountSuspended => "account_suspended",
            AccountError::UserNotFound => "user_not_found",
            AccountError::RoleNotFound => "role_not_found",
            AccountError::CannotRevokeOwnAuthority => "cannot_revoke_own_authority",
            AccountError::CannotDeleteOwnAccount => "cannot_delete_own_account",
            AccountError::Forbidden => "forbidden",
            AccountError::Store(_) | AccountError::Session(_) | AccountError::Hashing(_) => {
                "internal"
            }
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AccountError::Store(_) | AccountError::Session(_) | AccountError::Hashing(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UniqueField;

    #[test]
    fn policy_messages_are_fixed() {
        let cases = [
            (AccountError::DuplicateUsername, "Error: Username already exists."),
            (AccountError::DuplicateEmail, "Error: Email already exists."),
            (AccountError::AccountSuspended, "This account is suspended."),
            (AccountError::UserNotFound, "User was not recognized."),
            (AccountError::RoleNotFound, "Error: Role is not found."),
            (
                AccountError::CannotRevokeOwnAuthority,
                "You can not revoke your own grants.",
            ),
            (
                AccountError::CannotDeleteOwnAccount,
                "You can not delete your own account.",
            ),
        ];
        for (error, message) in cases {
            assert_eq!(error.to_string(), message);
            assert!(!error.is_internal());
        }
    }

    #[test]
    fn collaborator_failures_are_internal() {
        let store = AccountError::from(StoreError::Conflict(UniqueField::Email));
        assert!(store.is_internal());
        assert_eq!(store.code(), "internal");
        assert!(!store.to_string().contains("email"));

        let session = AccountError::from(AuthzError::InvalidSigningKey("short".to_string()));
        assert_eq!(session.code(), "internal");

        let hashing = AccountError::Hashing(anyhow::anyhow!("salt"));
        assert!(hashing.is_internal());
    }

    #[test]
    fn codes_are_snake_case() {
        assert_eq!(
            AccountError::CannotRevokeOwnAuthority.code(),
            "cannot_revoke_own_authority"
        );
        assert_eq!(AccountError::Forbidden.code(), "forbidden");
        assert_eq!(AccountError::InvalidCredentials.code(), "invalid_credentials");
    }
}
