//! Identity snapshot carried by a session.
use crate::{Role, RoleSet};
use serde::{Deserialize, Serialize};

/// Who is acting, as of the moment their session was issued.
///
/// # Invariants
/// - `roles` is a snapshot; it is not refreshed when the stored account
///   changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub roles: RoleSet,
}

impl Identity {
    pub fn new(
        id: i64,
        username: impl Into<String>,
        email: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
