//! Self-service signup.
//!
//! The first account ever stored becomes the bootstrap admin. The emptiness
//! check runs inside the store's insert guard, so racing first signups still
//! yield exactly one admin.
use crate::auth::engine::AccountEngine;
use crate::auth::error::AccountError;
use crate::model::{Account, AccountDraft, UniqueField};
use crate::store::StoreError;
use account_authz::{Role, RoleSet};

/// Roles for a new account: both roles for the very first one, `User`
/// otherwise.
pub fn initial_roles(store_was_empty: bool) -> RoleSet {
    if store_was_empty {
        [Role::User, Role::Admin].into_iter().collect()
    } else {
        [Role::User].into_iter().collect()
    }
}

impl AccountEngine {
    /// Create an account. Does not issue a session.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        raw_password: &str,
    ) -> Result<Account, AccountError> {
        let result = self.register_inner(username, email, raw_password).await;
        let outcome = match &result {
            Ok(_) => "created",
            Err(err) => err.code(),
        };
        metrics::counter!("accounts_registrations_total", "outcome" => outcome).increment(1);
        result
    }

    async fn register_inner(
        &self,
        username: &str,
        email: &str,
        raw_password: &str,
    ) -> Result<Account, AccountError> {
        if self.store.exists_by_username(username).await? {
            return Err(AccountError::DuplicateUsername);
        }
        if self.store.exists_by_email(email).await? {
            return Err(AccountError::DuplicateEmail);
        }
        let draft = AccountDraft {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: self.hash_password(raw_password).await?,
        };
        let account = match self.store.create_account(draft, initial_roles).await {
            Ok(account) => account,
            // Lost a race with a concurrent signup after the pre-checks.
            Err(StoreError::Conflict(UniqueField::Username)) => {
                return Err(AccountError::DuplicateUsername);
            }
            Err(StoreError::Conflict(UniqueField::Email)) => {
                return Err(AccountError::DuplicateEmail);
            }
            Err(err) => return Err(err.into()),
        };
        tracing::info!(
            account_id = account.id,
            username = %account.username,
            bootstrap_admin = account.roles.contains(&Role::Admin),
            "account registered"
        );
        Ok(account)
    }
}
