//! Postgres-backed implementation of the credential store.
//!
//! # Key invariants
//! - `username` and `email` carry unique constraints; violations come back as
//!   [`StoreError::Conflict`] naming the column.
//! - Roles are stored as a `TEXT[]` of role identifiers and parsed on read.
//!   An unknown identifier in the table is treated as corruption.
//! - `create_account` takes an exclusive table lock inside its transaction
//!   before checking emptiness, so the bootstrap-admin decision and the insert
//!   are serialized against other signups.
//!
//! # Security notes
//! - Database URLs may contain credentials; never log `PostgresConfig::url`.
//!
//! # Operational notes
//! Migrations under `./migrations` run at connect time, before any request is
//! served.
use super::{AccountStore, InitialRoles, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::model::{Account, AccountDraft, UniqueField};
use account_authz::{parse_roles, role_ids};
use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;

const USERNAME_CONSTRAINT: &str = "accounts_username_key";
const EMAIL_CONSTRAINT: &str = "accounts_email_key";

/// Durable account store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use accounts::config::PostgresConfig;
/// use accounts::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, Clone, FromRow)]
struct DbAccount {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    roles: Vec<String>,
}

impl PostgresStore {
    /// Connect, then apply embedded migrations.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, true).await
    }

    #[cfg(any(test, feature = "pg-tests"))]
    pub async fn connect_without_migrations(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, false).await
    }

    async fn connect_internal(pg: &PostgresConfig, run_migrations: bool) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options)
            .await?;

        if run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
        }
        Ok(Self { pool })
    }

    /// Remove every account. Only for test setup.
    #[cfg(feature = "pg-tests")]
    pub async fn truncate_for_tests(&self) -> StoreResult<()> {
        sqlx::query("TRUNCATE accounts RESTART IDENTITY")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

const SELECT_ACCOUNT: &str = "SELECT id, username, email, password_hash, roles FROM accounts";

#[async_trait]
impl AccountStore for PostgresStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let row = sqlx::query_as::<_, DbAccount>(&format!("{SELECT_ACCOUNT} WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(account_from_db).transpose()
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Account>> {
        let row = sqlx::query_as::<_, DbAccount>(&format!("{SELECT_ACCOUNT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(account_from_db).transpose()
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn is_empty(&self) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM accounts)")
            .fetch_one(&self.pool)
            .await?;
        Ok(!exists)
    }

    async fn create_account(
        &self,
        draft: AccountDraft,
        initial_roles: InitialRoles,
    ) -> StoreResult<Account> {
        let mut tx = self.pool.begin().await?;
        // EXCLUSIVE conflicts with itself and with the ROW EXCLUSIVE lock taken
        // by INSERT/UPDATE/DELETE, but still admits plain reads.
        sqlx::query("LOCK TABLE accounts IN EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM accounts)")
            .fetch_one(&mut *tx)
            .await?;
        let roles = initial_roles(!exists);
        let insert = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO accounts (username, email, password_hash, roles)
               VALUES ($1, $2, $3, $4)
               RETURNING id"#,
        )
        .bind(&draft.username)
        .bind(&draft.email)
        .bind(&draft.password_hash)
        .bind(role_ids(&roles))
        .fetch_one(&mut *tx)
        .await;
        let id = match insert {
            Ok(id) => id,
            Err(err) => return Err(map_write_error(err)),
        };
        tx.commit().await?;
        Ok(Account {
            id,
            username: draft.username,
            email: draft.email,
            password_hash: draft.password_hash,
            roles,
        })
    }

    async fn save(&self, account: &Account) -> StoreResult<()> {
        let result = sqlx::query(
            r#"UPDATE accounts
               SET username = $2, email = $3, password_hash = $4, roles = $5, updated_at = now()
               WHERE id = $1"#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(role_ids(&account.roles))
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("account {}", account.id)));
        }
        Ok(())
    }

    async fn delete(&self, account: &Account) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(account.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("account {}", account.id)));
        }
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, DbAccount>(&format!("{SELECT_ACCOUNT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(account_from_db).collect()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

fn account_from_db(row: DbAccount) -> StoreResult<Account> {
    let roles = parse_roles(&row.roles)
        .map_err(|err| StoreError::Unexpected(anyhow!("account {} has {err}", row.id)))?;
    Ok(Account {
        id: row.id,
        username: row.username,
        email: row.email,
        password_hash: row.password_hash,
        roles,
    })
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match unique_violation_field(&err) {
        Some(field) => StoreError::Conflict(field),
        None => StoreError::Unexpected(err.into()),
    }
}

fn unique_violation_field(err: &sqlx::Error) -> Option<UniqueField> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.code().as_deref() != Some("23505") {
        return None;
    }
    field_for_constraint(db_err.constraint())
}

fn field_for_constraint(constraint: Option<&str>) -> Option<UniqueField> {
    match constraint {
        Some(USERNAME_CONSTRAINT) => Some(UniqueField::Username),
        Some(EMAIL_CONSTRAINT) => Some(UniqueField::Email),
        _ => None,
    }
}
