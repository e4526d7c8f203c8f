//! Stored account record and derived views.
use account_authz::{Identity, RoleSet, policy, role_ids};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Persisted account.
///
/// # Invariants
/// - `id` is assigned by the store and never reused.
/// - `password_hash` is an opaque PHC string and never leaves the service.
/// - An empty `roles` set means the account is suspended.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: RoleSet,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

impl Account {
    pub fn is_suspended(&self) -> bool {
        policy::is_suspended(&self.roles)
    }

    /// Snapshot used when issuing a session.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            roles: self.roles.clone(),
        }
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            roles: role_ids(&self.roles),
        }
    }
}

/// Fields supplied at registration, before the store assigns an id and roles.
#[derive(Clone)]
pub struct AccountDraft {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Client-facing view of an account.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

/// Names the account a mutation applies to.
///
/// Resolves only when both the id and the exact username belong to the same
/// stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    pub id: i64,
    pub username: String,
}

impl TargetRef {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

/// Unique column a write collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Username => f.write_str("username"),
            UniqueField::Email => f.write_str("email"),
        }
    }
}
