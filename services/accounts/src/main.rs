//! Accounts HTTP service entry point.
//!
//! # Purpose
//! Loads configuration, opens the configured store, builds the session issuer
//! and serves the API plus the metrics listener until Ctrl-C.
use accounts::app::{AppState, build_router};
use accounts::auth::{AccountEngine, Argon2Hasher};
use accounts::config::{self, AccountsConfig, SessionConfig};
use accounts::observability;
use accounts::store::{AccountStore, memory::InMemoryStore, postgres::PostgresStore};
use account_authz::{SessionIssuer, SessionSigningKey, generate_signing_key};
use anyhow::Context;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const CONFIGURED_KEY_ID: &str = "accounts-configured";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AccountsConfig::from_env_or_yaml().context("accounts config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: AccountsConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("accounts")?;
    let state = build_state(config.clone()).await?;
    tracing::info!(
        storage = state.engine.store().backend_name(),
        durable = state.engine.store().is_durable(),
        "account store ready"
    );
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
        std::future::pending(),
    ));

    let app = build_router(state);
    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, "accounts listening");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("accounts shutting down");
    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: AccountsConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn AccountStore + Send + Sync> = match config.storage {
        config::StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        config::StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(PostgresStore::connect(pg).await?)
        }
    };
    let sessions = build_session_issuer(&config.session)?;
    let engine = AccountEngine::new(store, Arc::new(Argon2Hasher), Arc::new(sessions));
    Ok(AppState::new(engine))
}

fn build_session_issuer(session: &SessionConfig) -> anyhow::Result<SessionIssuer> {
    let key = match &session.signing_key_hex {
        Some(seed_hex) => SessionSigningKey::from_seed_hex(CONFIGURED_KEY_ID, seed_hex)
            .context("parse ACCOUNTS_SESSION_KEY_HEX")?,
        None => {
            tracing::warn!("no session signing key configured; sessions end at restart");
            generate_signing_key()
        }
    };
    let issuer = SessionIssuer::new(
        session.issuer.clone(),
        session.audience.clone(),
        Duration::from_secs(session.ttl_secs),
        session.leeway_secs,
        key,
    )?;
    Ok(issuer)
}
