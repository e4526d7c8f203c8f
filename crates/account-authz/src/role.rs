//! The closed two-role model.
//!
//! # Purpose
//! Maps each role to the stable identifier persisted in stores and embedded in
//! session tokens, plus a human-readable description.
//!
//! # Key invariants
//! - Identifiers are `ROLE_USER` and `ROLE_ADMIN`; parsing is exact and
//!   case-sensitive.
//! - [`parse_roles`] is all-or-nothing: one unknown name rejects the whole list.
//!
//! # Examples
//! ```rust
//! use account_authz::{Role, parse_roles};
//!
//! let roles = parse_roles(["ROLE_USER", "ROLE_ADMIN"]).expect("known roles");
//! assert!(roles.contains(&Role::Admin));
//! assert!(parse_roles(["ROLE_USER", "ROLE_ROOT"]).is_err());
//! ```
use crate::{AuthzError, AuthzResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Role granted to an account.
///
/// # Summary
/// `User` marks an ordinary active account; `Admin` grants account
/// management. Serialized with the stable identifier string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

/// Set of roles held by one account. Empty means suspended.
pub type RoleSet = BTreeSet<Role>;

impl Role {
    pub const ALL: [Role; 2] = [Role::User, Role::Admin];

    /// Stable identifier string.
    pub fn id(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::User => "The account is active if this role is granted",
            Role::Admin => {
                "Grants the authority to display, create, edit (includes management of authorities) and delete users"
            }
        }
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.id() == value)
            .ok_or_else(|| AuthzError::RoleNotFound(value.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Parse every name or none.
///
/// # Errors
/// - `AuthzError::RoleNotFound` naming the first unrecognized entry.
pub fn parse_roles<I, S>(names: I) -> AuthzResult<RoleSet>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| name.as_ref().parse::<Role>())
        .collect()
}

/// Identifier strings for a role set, in role order.
pub fn role_ids(roles: &RoleSet) -> Vec<String> {
    roles.iter().map(|role| role.id().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.id().parse::<Role>().expect("parse"), role);
            assert_eq!(role.to_string(), role.id());
            assert!(!role.description().is_empty());
        }
    }

    #[test]
    fn parsing_is_exact() {
        assert!("role_user".parse::<Role>().is_err());
        assert!("USER".parse::<Role>().is_err());
        assert!(" ROLE_USER".parse::<Role>().is_err());
    }

    #[test]
    fn parse_roles_rejects_whole_list_on_unknown_name() {
        let err = parse_roles(["ROLE_USER", "randomString"]).expect_err("unknown role");
        assert!(matches!(err, AuthzError::RoleNotFound(name) if name == "randomString"));
    }

    #[test]
    fn parse_roles_accepts_empty_and_duplicates() {
        assert!(parse_roles(Vec::<String>::new()).expect("empty").is_empty());
        let roles = parse_roles(["ROLE_ADMIN", "ROLE_ADMIN"]).expect("dupes");
        assert_eq!(roles.len(), 1);
    }

    #[test]
    fn role_ids_follow_role_order() {
        let roles: RoleSet = [Role::Admin, Role::User].into_iter().collect();
        assert_eq!(role_ids(&roles), vec!["ROLE_USER", "ROLE_ADMIN"]);
    }

    #[test]
    fn serde_uses_identifiers() {
        let json = serde_json::to_string(&Role::Admin).expect("serialize");
        assert_eq!(json, "\"ROLE_ADMIN\"");
        let role: Role = serde_json::from_str("\"ROLE_USER\"").expect("deserialize");
        assert_eq!(role, Role::User);
    }
}
