//! Shared predicates for account authorization decisions.
//!
//! # Purpose
//! Every guarded account mutation is decided from a handful of facts about the
//! actor and the target. Keeping them here means the engine, the HTTP gate and
//! the tests all agree on what "self", "admin" and "suspended" mean.
//!
//! # Key invariants
//! - Self identity compares usernames case-insensitively, while store lookups
//!   stay case-sensitive.
//! - Password changes are allowed for the account holder or any admin; the
//!   older self-only rule is superseded.
use crate::{Identity, Role, RoleSet};

/// True when `actor` and the account named `target_username` are the same
/// person.
pub fn is_same_user(actor: &Identity, target_username: &str) -> bool {
    actor.username.to_lowercase() == target_username.to_lowercase()
}

pub fn is_admin(actor: &Identity) -> bool {
    actor.has_role(Role::Admin)
}

/// An account with no roles is suspended.
pub fn is_suspended(roles: &RoleSet) -> bool {
    roles.is_empty()
}

/// Self-service or admin override.
pub fn can_change_password(actor: &Identity, target_username: &str) -> bool {
    is_same_user(actor, target_username) || is_admin(actor)
}

/// Whether the actor may pass a route gate requiring `required`.
pub fn holds(actor: &Identity, required: Role) -> bool {
    actor.has_role(required)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Identity {
        Identity::new(1, "admin", "admin@x", [Role::User, Role::Admin])
    }

    fn bob() -> Identity {
        Identity::new(2, "bob", "bob@x", [Role::User])
    }

    #[test]
    fn self_check_ignores_case() {
        assert!(is_same_user(&bob(), "bob"));
        assert!(is_same_user(&bob(), "BOB"));
        assert!(is_same_user(&admin(), "Admin"));
        assert!(!is_same_user(&bob(), "bobby"));
    }

    #[test]
    fn admin_check_reads_snapshot_roles() {
        assert!(is_admin(&admin()));
        assert!(!is_admin(&bob()));
    }

    #[test]
    fn suspension_means_no_roles() {
        assert!(is_suspended(&RoleSet::new()));
        assert!(!is_suspended(&[Role::Admin].into_iter().collect()));
    }

    #[test]
    fn password_change_matrix() {
        assert!(can_change_password(&bob(), "bob"));
        assert!(can_change_password(&admin(), "bob"));
        assert!(!can_change_password(&bob(), "admin"));
        let carol = Identity::new(3, "carol", "carol@x", [Role::User]);
        assert!(!can_change_password(&carol, "bob"));
    }

    #[test]
    fn gate_requires_role() {
        assert!(holds(&admin(), Role::Admin));
        assert!(!holds(&bob(), Role::Admin));
        assert!(holds(&bob(), Role::User));
        let admin_only = Identity::new(4, "ops", "ops@x", [Role::Admin]);
        assert!(!holds(&admin_only, Role::User));
    }
}
