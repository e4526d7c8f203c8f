//! Credential check and session issuance.
use crate::auth::engine::AccountEngine;
use crate::auth::error::AccountError;
use account_authz::role_ids;

/// Successful login: the bearer token plus the identity it snapshots.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: i64,
    pub id: i64,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl AccountEngine {
    /// Verify credentials and issue a session token.
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown username or a wrong password,
    ///   indistinguishably.
    /// - `AccountSuspended` when the credentials are right but the account
    ///   holds no roles. No token is issued.
    pub async fn login(&self, username: &str, raw_password: &str) -> Result<LoginOutcome, AccountError> {
        let result = self.login_inner(username, raw_password).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.code(),
        };
        metrics::counter!("accounts_logins_total", "outcome" => outcome).increment(1);
        result
    }

    async fn login_inner(&self, username: &str, raw_password: &str) -> Result<LoginOutcome, AccountError> {
        let account = self.store.find_by_username(username).await?;
        let stored = account.as_ref().map(|account| account.password_hash.clone());
        let verified = self.verify_password(raw_password, stored).await?;
        let account = match account {
            Some(account) if verified => account,
            _ => return Err(AccountError::InvalidCredentials),
        };
        if account.is_suspended() {
            tracing::info!(account_id = account.id, "login refused for suspended account");
            return Err(AccountError::AccountSuspended);
        }
        let identity = account.identity();
        let session = self.sessions.issue(&identity)?;
        Ok(LoginOutcome {
            token: session.token,
            token_type: "Bearer",
            expires_at: session.expires_at,
            id: identity.id,
            username: identity.username,
            email: identity.email,
            roles: role_ids(&identity.roles),
        })
    }
}
