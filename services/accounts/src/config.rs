//! Service configuration.
//!
//! # Purpose
//! Reads settings from `ACCOUNTS_*` environment variables, then applies an
//! optional YAML override file named by `ACCOUNTS_CONFIG`.
use account_authz::session_ttl_secs;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_METRICS_BIND: &str = "0.0.0.0:9090";
pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_PG_ACQUIRE_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_SESSION_ISSUER: &str = "accounts-auth";
pub const DEFAULT_SESSION_AUDIENCE: &str = "accounts-api";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;
pub const DEFAULT_SESSION_LEEWAY_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

#[derive(Clone)]
pub struct SessionConfig {
    pub issuer: String,
    pub audience: String,
    pub ttl_secs: u64,
    pub leeway_secs: u64,
    /// Hex Ed25519 seed. A fresh key is generated at startup when unset.
    pub signing_key_hex: Option<String>,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_secs", &self.ttl_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("signing_key_hex", &self.signing_key_hex.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AccountsConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub session: SessionConfig,
}

#[derive(Debug, Default, Deserialize)]
struct AccountsConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<StorageBackend>,
    postgres: Option<PostgresConfigOverride>,
    session: Option<SessionConfigOverride>,
}

#[derive(Debug, Default, Deserialize)]
struct PostgresConfigOverride {
    url: Option<String>,
    max_connections: Option<u32>,
    acquire_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionConfigOverride {
    issuer: Option<String>,
    audience: Option<String>,
    ttl_secs: Option<u64>,
    leeway_secs: Option<u64>,
    signing_key_hex: Option<String>,
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}

impl AccountsConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("ACCOUNTS_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND.to_string())
            .parse()
            .with_context(|| "parse ACCOUNTS_BIND")?;
        let metrics_bind = std::env::var("ACCOUNTS_METRICS_BIND")
            .unwrap_or_else(|_| DEFAULT_METRICS_BIND.to_string())
            .parse()
            .with_context(|| "parse ACCOUNTS_METRICS_BIND")?;
        let storage = match std::env::var("ACCOUNTS_STORAGE") {
            Ok(value) => value.parse().with_context(|| "parse ACCOUNTS_STORAGE")?,
            Err(_) => StorageBackend::Memory,
        };
        let postgres = match std::env::var("ACCOUNTS_PG_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse(
                    "ACCOUNTS_PG_MAX_CONNECTIONS",
                    DEFAULT_PG_MAX_CONNECTIONS,
                )?,
                acquire_timeout_ms: env_parse(
                    "ACCOUNTS_PG_ACQUIRE_TIMEOUT_MS",
                    DEFAULT_PG_ACQUIRE_TIMEOUT_MS,
                )?,
            }),
            Err(_) => None,
        };
        let session = SessionConfig {
            issuer: std::env::var("ACCOUNTS_SESSION_ISSUER")
                .unwrap_or_else(|_| DEFAULT_SESSION_ISSUER.to_string()),
            audience: std::env::var("ACCOUNTS_SESSION_AUDIENCE")
                .unwrap_or_else(|_| DEFAULT_SESSION_AUDIENCE.to_string()),
            ttl_secs: env_parse("ACCOUNTS_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
            leeway_secs: env_parse("ACCOUNTS_SESSION_LEEWAY_SECS", DEFAULT_SESSION_LEEWAY_SECS)?,
            signing_key_hex: std::env::var("ACCOUNTS_SESSION_KEY_HEX").ok(),
        };
        let config = Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            session,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("ACCOUNTS_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read ACCOUNTS_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
            config.validate()?;
        }
        Ok(config)
    }

    /// Reject settings that parse but cannot work at runtime.
    pub fn validate(&self) -> Result<()> {
        session_ttl_secs(std::time::Duration::from_secs(self.session.ttl_secs))
            .with_context(|| format!("session ttl_secs {}", self.session.ttl_secs))?;
        Ok(())
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: AccountsConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse accounts config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = value;
        }
        if let Some(pg) = override_cfg.postgres {
            let existing = self.postgres.take();
            let url = match (pg.url, existing.as_ref()) {
                (Some(url), _) => url,
                (None, Some(current)) => current.url.clone(),
                (None, None) => bail!("postgres.url is required when overriding postgres"),
            };
            self.postgres = Some(PostgresConfig {
                url,
                max_connections: pg
                    .max_connections
                    .or(existing.as_ref().map(|current| current.max_connections))
                    .unwrap_or(DEFAULT_PG_MAX_CONNECTIONS),
                acquire_timeout_ms: pg
                    .acquire_timeout_ms
                    .or(existing.as_ref().map(|current| current.acquire_timeout_ms))
                    .unwrap_or(DEFAULT_PG_ACQUIRE_TIMEOUT_MS),
            });
        }
        if let Some(session) = override_cfg.session {
            if let Some(value) = session.issuer {
                self.session.issuer = value;
            }
            if let Some(value) = session.audience {
                self.session.audience = value;
            }
            if let Some(value) = session.ttl_secs {
                self.session.ttl_secs = value;
            }
            if let Some(value) = session.leeway_secs {
                self.session.leeway_secs = value;
            }
            if let Some(value) = session.signing_key_hex {
                self.session.signing_key_hex = Some(value);
            }
        }
        Ok(())
    }
}
