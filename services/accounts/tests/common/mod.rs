#![allow(dead_code)]

use accounts::app::{AppState, build_router};
use accounts::auth::{AccountEngine, Argon2Hasher};
use accounts::store::memory::InMemoryStore;
use account_authz::{SessionIssuer, SessionSigningKey};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_SEED: [u8; 32] = [11u8; 32];

pub fn session_issuer() -> SessionIssuer {
    SessionIssuer::new(
        "accounts-auth",
        "accounts-api",
        Duration::from_secs(600),
        0,
        SessionSigningKey::from_seed("test-key", TEST_SEED),
    )
    .expect("issuer")
}

pub fn engine() -> AccountEngine {
    AccountEngine::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(Argon2Hasher),
        Arc::new(session_issuer()),
    )
}

pub fn app() -> axum::routing::RouterIntoService<axum::body::Body, ()> {
    build_router(AppState::new(engine())).into_service()
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
