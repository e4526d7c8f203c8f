//! Authorization engine for account mutation.
//!
//! # Purpose
//! Decides whether an actor may change roles, passwords, profile fields or
//! existence of a target account, and applies the change when allowed.
//!
//! # Key invariants
//! - The actor is always an explicit parameter; nothing is read from ambient
//!   request state.
//! - Targets resolve only when both id and exact username match one stored
//!   account. Any mismatch is `UserNotFound`, never a hint about which half
//!   was wrong.
//! - Nobody can change their own roles or delete their own account, admins
//!   included. The self check compares usernames case-insensitively.
//! - Role names are parsed all-or-nothing before anything is written.
//! - Each operation is read, decide, write. Concurrent writers to one account
//!   are last-write-wins.
//!
//! # Preconditions
//! `update_roles`, `update_account` and `delete_account` assume the caller
//! already passed the ADMIN route gate. `list_accounts` checks ADMIN itself.
use crate::auth::error::AccountError;
use crate::auth::password::CredentialHasher;
use crate::model::{Account, AccountSummary, TargetRef, UniqueField};
use crate::store::{AccountStore, StoreError};
use account_authz::{Identity, SessionIssuer, parse_roles, policy, role_ids};
use std::sync::{Arc, OnceLock};

/// Hashed once and verified against when a login names no account.
const DECOY_PASSWORD: &str = "accounts-decoy-password";

/// Optional edits applied by an administrator in one request.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub roles: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct AccountEngine {
    pub(crate) store: Arc<dyn AccountStore + Send + Sync>,
    pub(crate) hasher: Arc<dyn CredentialHasher>,
    pub(crate) sessions: Arc<SessionIssuer>,
    decoy_hash: Arc<OnceLock<String>>,
}

impl AccountEngine {
    pub fn new(
        store: Arc<dyn AccountStore + Send + Sync>,
        hasher: Arc<dyn CredentialHasher>,
        sessions: Arc<SessionIssuer>,
    ) -> Self {
        Self {
            store,
            hasher,
            sessions,
            decoy_hash: Arc::new(OnceLock::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn AccountStore + Send + Sync> {
        &self.store
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    /// Hash `raw` on the blocking pool.
    pub(crate) async fn hash_password(&self, raw: &str) -> Result<String, AccountError> {
        let hasher = self.hasher.clone();
        let raw = raw.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&raw))
            .await
            .map_err(|err| AccountError::Hashing(anyhow::Error::new(err)))?
            .map_err(AccountError::Hashing)
    }

    /// Check `raw` against `stored` on the blocking pool.
    ///
    /// With no stored hash the password is still verified, against a decoy,
    /// so an unknown username costs the same as a wrong password. The result
    /// is then always `false`.
    pub(crate) async fn verify_password(
        &self,
        raw: &str,
        stored: Option<String>,
    ) -> Result<bool, AccountError> {
        let hasher = self.hasher.clone();
        let decoy_hash = self.decoy_hash.clone();
        let raw = raw.to_string();
        tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
            let Some(stored) = stored else {
                let decoy = match decoy_hash.get() {
                    Some(decoy) => decoy,
                    None => {
                        let fresh = hasher.hash(DECOY_PASSWORD)?;
                        decoy_hash.get_or_init(|| fresh)
                    }
                };
                let _ = hasher.verify(&raw, decoy);
                return Ok(false);
            };
            Ok(hasher.verify(&raw, &stored))
        })
        .await
        .map_err(|err| AccountError::Hashing(anyhow::Error::new(err)))?
        .map_err(AccountError::Hashing)
    }

    /// Look up the account named by `target`.
    pub async fn resolve_target(&self, target: &TargetRef) -> Result<Account, AccountError> {
        match self.store.find_by_username(&target.username).await? {
            Some(account) if account.id == target.id => Ok(account),
            _ => Err(AccountError::UserNotFound),
        }
    }

    /// Replace the target's role set. An empty list suspends the account.
    pub async fn update_roles(
        &self,
        actor: &Identity,
        target: &TargetRef,
        role_names: &[String],
    ) -> Result<Account, AccountError> {
        let mut account = self.resolve_target(target).await?;
        if policy::is_same_user(actor, &account.username) {
            return Err(denied(AccountError::CannotRevokeOwnAuthority));
        }
        account.roles = parse_roles(role_names).map_err(|_| AccountError::RoleNotFound)?;
        self.store.save(&account).await.map_err(write_error)?;
        tracing::info!(
            actor = %actor.username,
            target_id = account.id,
            roles = ?role_ids(&account.roles),
            "account roles updated"
        );
        Ok(account)
    }

    /// Set a new password for the holder of the account or, as override, by
    /// an admin.
    pub async fn change_password(
        &self,
        actor: &Identity,
        target: &TargetRef,
        new_password: &str,
    ) -> Result<(), AccountError> {
        let mut account = self.resolve_target(target).await?;
        if !policy::can_change_password(actor, &account.username) {
            return Err(denied(AccountError::Forbidden));
        }
        account.password_hash = self.hash_password(new_password).await?;
        self.store.save(&account).await.map_err(write_error)?;
        tracing::info!(actor = %actor.username, target_id = account.id, "password changed");
        Ok(())
    }

    /// Apply an admin edit of email, password and roles as one save.
    pub async fn update_account(
        &self,
        actor: &Identity,
        target: &TargetRef,
        update: AccountUpdate,
    ) -> Result<Account, AccountError> {
        let mut account = self.resolve_target(target).await?;
        if let Some(role_names) = &update.roles {
            if policy::is_same_user(actor, &account.username) {
                return Err(denied(AccountError::CannotRevokeOwnAuthority));
            }
            account.roles = parse_roles(role_names).map_err(|_| AccountError::RoleNotFound)?;
        }
        if let Some(email) = update.email {
            if email != account.email {
                if self.store.exists_by_email(&email).await? {
                    return Err(AccountError::DuplicateEmail);
                }
                account.email = email;
            }
        }
        if let Some(password) = update.password {
            account.password_hash = self.hash_password(&password).await?;
        }
        self.store.save(&account).await.map_err(write_error)?;
        tracing::info!(actor = %actor.username, target_id = account.id, "account updated");
        Ok(account)
    }

    /// Permanently remove the account with `target_id`.
    pub async fn delete_account(&self, actor: &Identity, target_id: i64) -> Result<(), AccountError> {
        let account = self
            .store
            .find_by_id(target_id)
            .await?
            .ok_or(AccountError::UserNotFound)?;
        if policy::is_same_user(actor, &account.username) {
            return Err(denied(AccountError::CannotDeleteOwnAccount));
        }
        self.store.delete(&account).await.map_err(write_error)?;
        tracing::info!(actor = %actor.username, target_id, "account deleted");
        Ok(())
    }

    pub async fn list_accounts(&self, actor: &Identity) -> Result<Vec<AccountSummary>, AccountError> {
        if !policy::is_admin(actor) {
            return Err(denied(AccountError::Forbidden));
        }
        let accounts = self.store.list_all().await?;
        Ok(accounts.iter().map(Account::summary).collect())
    }
}

/// Record a policy denial and hand the error back.
fn denied(err: AccountError) -> AccountError {
    let reason = err.code();
    metrics::counter!("accounts_authz_denials_total", "reason" => reason).increment(1);
    tracing::info!(reason, "account operation denied");
    err
}

/// Map store failures on writes back into the account vocabulary. The target
/// can vanish between read and write, and a concurrent writer can claim an
/// email first.
fn write_error(err: StoreError) -> AccountError {
    match err {
        StoreError::NotFound(_) => AccountError::UserNotFound,
        StoreError::Conflict(UniqueField::Username) => AccountError::DuplicateUsername,
        StoreError::Conflict(UniqueField::Email) => AccountError::DuplicateEmail,
        other => AccountError::Store(other),
    }
}
