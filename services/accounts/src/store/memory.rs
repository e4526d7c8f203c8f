//! In-memory implementation of the credential store.
//!
//! # Purpose
//! Implements [`AccountStore`] entirely in memory behind one
//! `tokio::sync::RwLock`. Used for local development, tests and deployments
//! that do not need durability.
//!
//! # Durability and consistency
//! - **Not durable**: all accounts are lost on restart.
//! - Mutations take the write lock, so the emptiness check and insert in
//!   `create_account` cannot interleave with another signup.
//! - Ids come from a counter that only moves forward; deleted ids are never
//!   handed out again.
//!
//! # Metrics
//! Keeps the `accounts_total` gauge in step with the map size.
use super::{AccountStore, InitialRoles, StoreError, StoreResult};
use crate::model::{Account, AccountDraft, UniqueField};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug)]
struct MemoryState {
    next_id: i64,
    accounts: BTreeMap<i64, Account>,
}

impl MemoryState {
    /// Unique column a write would collide on, ignoring the account `skip_id`.
    /// Username wins when both collide.
    fn collision(&self, username: &str, email: &str, skip_id: Option<i64>) -> Option<UniqueField> {
        let mut email_taken = false;
        for existing in self.accounts.values() {
            if Some(existing.id) == skip_id {
                continue;
            }
            if existing.username == username {
                return Some(UniqueField::Username);
            }
            email_taken |= existing.email == email;
        }
        email_taken.then_some(UniqueField::Email)
    }
}

#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState {
                next_id: 1,
                accounts: BTreeMap::new(),
            })),
        }
    }
}

fn record_total(count: usize) {
    metrics::gauge!("accounts_total").set(count as f64);
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Account>> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .any(|account| account.username == username))
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state.accounts.values().any(|account| account.email == email))
    }

    async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.state.read().await.accounts.is_empty())
    }

    async fn create_account(
        &self,
        draft: AccountDraft,
        initial_roles: InitialRoles,
    ) -> StoreResult<Account> {
        let mut state = self.state.write().await;
        if let Some(field) = state.collision(&draft.username, &draft.email, None) {
            return Err(StoreError::Conflict(field));
        }
        let roles = initial_roles(state.accounts.is_empty());
        let id = state.next_id;
        state.next_id += 1;
        let account = Account {
            id,
            username: draft.username,
            email: draft.email,
            password_hash: draft.password_hash,
            roles,
        };
        state.accounts.insert(id, account.clone());
        record_total(state.accounts.len());
        Ok(account)
    }

    async fn save(&self, account: &Account) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if !state.accounts.contains_key(&account.id) {
            return Err(StoreError::NotFound(format!("account {}", account.id)));
        }
        if let Some(field) = state.collision(&account.username, &account.email, Some(account.id)) {
            return Err(StoreError::Conflict(field));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn delete(&self, account: &Account) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.accounts.remove(&account.id).is_none() {
            return Err(StoreError::NotFound(format!("account {}", account.id)));
        }
        record_total(state.accounts.len());
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<Account>> {
        // BTreeMap iteration is already id-ordered.
        Ok(self.state.read().await.accounts.values().cloned().collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
