//! Account authn/authz primitives shared by the accounts service and its tests.
//!
//! # Purpose
//! Centralizes the two-role model, the identity snapshot carried by sessions,
//! the predicates every account mutation is judged by, and session token
//! minting/validation.
//!
//! # How it fits
//! The accounts service resolves an [`Identity`] from a bearer token with
//! [`SessionIssuer::validate`], then feeds it to its authorization engine,
//! which decides with the predicates in [`policy`].
//!
//! # Key invariants
//! - The role set is closed: `ROLE_USER` and `ROLE_ADMIN`, nothing else parses.
//! - An empty role set means the account is suspended.
//! - Session tokens are EdDSA/Ed25519 only; other algorithms are rejected.
//!
//! # Examples
//! ```rust
//! use account_authz::{Identity, Role, policy};
//!
//! let actor = Identity::new(1, "Admin", "admin@x", [Role::User, Role::Admin]);
//! assert!(policy::is_admin(&actor));
//! assert!(policy::is_same_user(&actor, "admin"));
//! ```
//!
//! # Common pitfalls
//! - Identity snapshots are taken at login; role changes made afterwards are
//!   not visible until the holder signs in again.

mod errors;
mod identity;
mod role;
mod token;

pub mod policy;

pub use errors::{AuthzError, AuthzResult};
pub use identity::Identity;
pub use role::{Role, RoleSet, parse_roles, role_ids};
pub use token::{
    IssuedSession, MAX_SESSION_TTL, SessionClaims, SessionIssuer, SessionSigningKey,
    generate_signing_key, session_ttl_secs,
};
