//! Account data model.
//!
//! # Purpose
//! Re-exports the stored account record and the shapes derived from it for
//! the store, engine and HTTP layers.
mod account;

pub use account::{Account, AccountDraft, AccountSummary, TargetRef, UniqueField};
