//! Account policy: registration, login and guarded account mutation.
//!
//! # Purpose
//! Hosts the [`AccountEngine`], which owns every decision about who may act on
//! whose account, plus the password hasher and the HTTP role gate.
//!
//! # Notes
//! The engine only sees its collaborators through traits (`AccountStore`,
//! `CredentialHasher`) and the shared `SessionIssuer`, so the policy can be
//! exercised without HTTP or a database.
pub mod engine;
pub mod error;
pub mod gate;
pub mod login;
pub mod password;
pub mod registration;

pub use engine::{AccountEngine, AccountUpdate};
pub use error::AccountError;
pub use login::LoginOutcome;
pub use password::{Argon2Hasher, CredentialHasher};
