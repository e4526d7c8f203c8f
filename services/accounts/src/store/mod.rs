//! Credential store abstraction.
//!
//! # Purpose
//! Defines the persistence contract the account engine depends on, plus the
//! error type shared by every backend.
//!
//! # Key invariants
//! - `create_account` decides the initial role set and inserts under one
//!   serializing guard, so two concurrent first signups cannot both observe an
//!   empty store.
//! - Unique collisions on username or email surface as
//!   [`StoreError::Conflict`] naming the column.
//! - `list_all` is ordered by id.
use crate::model::{Account, AccountDraft, UniqueField};
use account_authz::RoleSet;
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

/// Chooses the role set of a new account given whether the store was empty
/// at the moment of insertion.
pub type InitialRoles = fn(bool) -> RoleSet;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict on {0}")]
    Conflict(UniqueField),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>>;
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Account>>;
    async fn exists_by_username(&self, username: &str) -> StoreResult<bool>;
    async fn exists_by_email(&self, email: &str) -> StoreResult<bool>;
    async fn is_empty(&self) -> StoreResult<bool>;

    async fn create_account(
        &self,
        draft: AccountDraft,
        initial_roles: InitialRoles,
    ) -> StoreResult<Account>;
    /// Overwrite an existing account, matched by id.
    async fn save(&self, account: &Account) -> StoreResult<()>;
    async fn delete(&self, account: &Account) -> StoreResult<()>;
    async fn list_all(&self) -> StoreResult<Vec<Account>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display_names_the_field() {
        assert_eq!(
            StoreError::Conflict(UniqueField::Email).to_string(),
            "conflict on email"
        );
        assert_eq!(
            StoreError::NotFound("account 3".to_string()).to_string(),
            "not found: account 3"
        );
    }

    #[test]
    fn sqlx_errors_become_unexpected() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Unexpected(_)));
    }
}
