//! Session token minting and validation.
//!
//! # Purpose
//! Turns a verified [`Identity`] into a signed bearer token and back. The
//! token is self-contained: it carries the identity snapshot and its own
//! expiry, and there is no server-side session table.
//!
//! # Key invariants
//! - Tokens are always EdDSA (Ed25519); any other `alg` fails validation.
//! - `iss`, `aud` and `exp` are mandatory and validated.
//! - Session lifetimes lie between one second and [`MAX_SESSION_TTL`].
//! - The private key is a raw 32-byte Ed25519 seed; the public key must be the
//!   one derived from it.
//!
//! # Security model
//! - Attackers may present arbitrary tokens; signature, issuer, audience and
//!   expiry are all checked before any claim is trusted.
//! - Role claims outside the closed role set invalidate the token rather than
//!   being dropped silently.
//! - There is no revocation: a token stays valid until `exp` even if the
//!   account is suspended or deleted in the meantime.
//!
//! # Examples
//! ```rust
//! use account_authz::{Identity, Role, SessionIssuer, generate_signing_key};
//! use std::time::Duration;
//!
//! let issuer = SessionIssuer::new(
//!     "accounts-auth",
//!     "accounts-api",
//!     Duration::from_secs(60),
//!     5,
//!     generate_signing_key(),
//! )
//! .expect("issuer");
//! let identity = Identity::new(7, "bob", "bob@x", [Role::User]);
//! let session = issuer.issue(&identity).expect("issue");
//! assert_eq!(issuer.validate(&session.token).expect("validate"), identity);
//! ```
use crate::{AuthzError, AuthzResult, Identity, Role, RoleSet, role_ids};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::SigningKey as Ed25519SigningKey;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const ED25519_KEY_LEN: usize = 32;

/// Claims carried by a session token.
///
/// `sub` is the username; `uid` the stable account id; `roles` the role
/// identifiers held at issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub uid: i64,
    pub email: String,
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    /// Rebuild the identity snapshot.
    ///
    /// # Errors
    /// - `AuthzError::UnknownTokenRole` if a role claim is not a known
    ///   identifier.
    pub fn identity(&self) -> AuthzResult<Identity> {
        let roles = self
            .roles
            .iter()
            .map(|name| {
                name.parse::<Role>()
                    .map_err(|_| AuthzError::UnknownTokenRole(name.clone()))
            })
            .collect::<AuthzResult<RoleSet>>()?;
        Ok(Identity {
            id: self.uid,
            username: self.sub.clone(),
            email: self.email.clone(),
            roles,
        })
    }
}

/// Ed25519 key material used to sign sessions.
///
/// # Security
/// - Never log or serialize `private_key`.
#[derive(Clone)]
pub struct SessionSigningKey {
    pub kid: String,
    pub private_key: [u8; ED25519_KEY_LEN],
    pub public_key: [u8; ED25519_KEY_LEN],
}

impl std::fmt::Debug for SessionSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigningKey")
            .field("kid", &self.kid)
            .field("public_key", &hex::encode(self.public_key))
            .finish_non_exhaustive()
    }
}

impl SessionSigningKey {
    /// Derive a key from a raw 32-byte seed.
    pub fn from_seed(kid: impl Into<String>, seed: [u8; ED25519_KEY_LEN]) -> Self {
        let signing_key = Ed25519SigningKey::from_bytes(&seed);
        Self {
            kid: kid.into(),
            private_key: seed,
            public_key: signing_key.verifying_key().to_bytes(),
        }
    }

    /// Derive a key from a hex-encoded seed, as supplied through configuration.
    ///
    /// # Errors
    /// - `AuthzError::InvalidSigningKey` if the value is not 64 hex characters.
    pub fn from_seed_hex(kid: impl Into<String>, seed_hex: &str) -> AuthzResult<Self> {
        let bytes = hex::decode(seed_hex.trim())
            .map_err(|err| AuthzError::InvalidSigningKey(format!("decode seed: {err}")))?;
        let seed: [u8; ED25519_KEY_LEN] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            AuthzError::InvalidSigningKey(format!(
                "seed must be {ED25519_KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::from_seed(kid, seed))
    }

    /// Confirm the public key matches the private seed.
    pub fn validate(&self) -> AuthzResult<()> {
        let expected = Ed25519SigningKey::from_bytes(&self.private_key)
            .verifying_key()
            .to_bytes();
        if expected != self.public_key {
            return Err(AuthzError::InvalidSigningKey(
                "Ed25519 public key does not match private seed".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generate a fresh signing key with a random `kid`.
pub fn generate_signing_key() -> SessionSigningKey {
    let mut seed = [0u8; ED25519_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut seed);
    let mut kid_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut kid_bytes);
    SessionSigningKey::from_seed(hex::encode(kid_bytes), seed)
}

/// Longest session lifetime an issuer accepts (ten years).
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// A freshly minted token and its expiry (epoch seconds).
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: i64,
}

/// Mints and validates session tokens for one issuer/audience pair.
pub struct SessionIssuer {
    issuer: String,
    audience: String,
    ttl: Duration,
    ttl_secs: i64,
    leeway: u64,
    kid: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionIssuer {
    /// Build an issuer, converting the key material once up front.
    ///
    /// # Errors
    /// - `AuthzError::InvalidSigningKey` when the key pair is inconsistent or
    ///   cannot be encoded.
    /// - `AuthzError::InvalidSessionTtl` when `ttl` is under one second or
    ///   above [`MAX_SESSION_TTL`].
    pub fn new(
        issuer: impl Into<String>,
        audience: impl Into<String>,
        ttl: Duration,
        leeway: u64,
        key: SessionSigningKey,
    ) -> AuthzResult<Self> {
        let ttl_secs = session_ttl_secs(ttl)?;
        key.validate()?;
        // jsonwebtoken wants PKCS8 DER for signing and the JWK `x` component
        // for verification.
        let der = Ed25519SigningKey::from_bytes(&key.private_key)
            .to_pkcs8_der()
            .map_err(|err| AuthzError::InvalidSigningKey(format!("encode Ed25519 key: {err}")))?;
        let encoding_key = EncodingKey::from_ed_der(der.as_bytes());
        let decoding_key = DecodingKey::from_ed_components(&URL_SAFE_NO_PAD.encode(key.public_key))?;
        Ok(Self {
            issuer: issuer.into(),
            audience: audience.into(),
            ttl,
            ttl_secs,
            leeway,
            kid: key.kid,
            encoding_key,
            decoding_key,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token snapshotting `identity`.
    pub fn issue(&self, identity: &Identity) -> AuthzResult<IssuedSession> {
        let now = now_epoch_seconds();
        let exp = now.checked_add(self.ttl_secs).ok_or_else(|| {
            AuthzError::InvalidSessionTtl(format!("expiry overflows for ttl {}s", self.ttl_secs))
        })?;
        let claims = SessionClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            sub: identity.username.clone(),
            uid: identity.id,
            email: identity.email.clone(),
            roles: role_ids(&identity.roles),
            iat: now,
            exp,
        };
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(self.kid.clone());
        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key)?;
        Ok(IssuedSession {
            token,
            expires_at: exp,
        })
    }

    /// Verify `token` and return the identity it snapshots.
    pub fn validate(&self, token: &str) -> AuthzResult<Identity> {
        self.decode(token)?.identity()
    }

    /// Verify `token` and return its raw claims.
    pub fn decode(&self, token: &str) -> AuthzResult<SessionClaims> {
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.leeway = self.leeway;
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

/// Whole seconds of a session lifetime, checked against the accepted range.
pub fn session_ttl_secs(ttl: Duration) -> AuthzResult<i64> {
    if ttl.as_secs() == 0 || ttl > MAX_SESSION_TTL {
        return Err(AuthzError::InvalidSessionTtl(format!(
            "{}s is outside 1s..={}s",
            ttl.as_secs(),
            MAX_SESSION_TTL.as_secs()
        )));
    }
    i64::try_from(ttl.as_secs())
        .map_err(|_| AuthzError::InvalidSessionTtl(format!("{}s", ttl.as_secs())))
}

fn now_epoch_seconds() -> i64 {
    // Clamp a backwards clock to zero instead of panicking.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
        .try_into()
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SEED: [u8; 32] = [5u8; 32];

    fn issuer() -> SessionIssuer {
        SessionIssuer::new(
            "accounts-auth",
            "accounts-api",
            Duration::from_secs(600),
            0,
            SessionSigningKey::from_seed("k1", TEST_SEED),
        )
        .expect("issuer")
    }

    fn bob() -> Identity {
        Identity::new(2, "bob", "bob@x", [Role::User])
    }

    fn sign_raw(claims: &SessionClaims) -> String {
        let der = Ed25519SigningKey::from_bytes(&TEST_SEED)
            .to_pkcs8_der()
            .expect("der");
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some("k1".to_string());
        jsonwebtoken::encode(&header, claims, &EncodingKey::from_ed_der(der.as_bytes()))
            .expect("encode")
    }

    fn claims_for(identity: &Identity) -> SessionClaims {
        let now = now_epoch_seconds();
        SessionClaims {
            iss: "accounts-auth".to_string(),
            aud: "accounts-api".to_string(),
            sub: identity.username.clone(),
            uid: identity.id,
            email: identity.email.clone(),
            roles: role_ids(&identity.roles),
            iat: now,
            exp: now + 600,
        }
    }

    #[test]
    fn issue_and_validate_round_trip_identity() {
        let issuer = issuer();
        let session = issuer.issue(&bob()).expect("issue");
        assert!(!session.token.is_empty());
        let claims = issuer.decode(&session.token).expect("decode");
        assert_eq!(claims.sub, "bob");
        assert_eq!(claims.roles, vec!["ROLE_USER".to_string()]);
        assert_eq!(claims.exp, session.expires_at);
        assert_eq!(issuer.validate(&session.token).expect("validate"), bob());
    }

    #[test]
    fn empty_role_snapshot_survives_round_trip() {
        let issuer = issuer();
        let suspended = Identity::new(3, "carol", "carol@x", []);
        let session = issuer.issue(&suspended).expect("issue");
        let identity = issuer.validate(&session.token).expect("validate");
        assert!(identity.roles.is_empty());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let issuer = issuer();
        let session = issuer.issue(&bob()).expect("issue");
        let mut parts: Vec<&str> = session.token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims_for(&Identity::new(
                2,
                "bob",
                "bob@x",
                [Role::User, Role::Admin],
            )))
            .expect("json"),
        );
        parts[1] = &forged;
        let err = issuer.validate(&parts.join(".")).expect_err("forged");
        assert!(matches!(err, AuthzError::Jwt(_)));
    }

    #[test]
    fn token_from_other_key_is_rejected() {
        let other = SessionIssuer::new(
            "accounts-auth",
            "accounts-api",
            Duration::from_secs(600),
            0,
            SessionSigningKey::from_seed("k2", [9u8; 32]),
        )
        .expect("issuer");
        let session = other.issue(&bob()).expect("issue");
        assert!(issuer().validate(&session.token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = claims_for(&bob());
        claims.iat -= 7200;
        claims.exp -= 3600;
        let err = issuer().validate(&sign_raw(&claims)).expect_err("expired");
        assert!(matches!(err, AuthzError::Jwt(_)));
    }

    #[test]
    fn audience_and_issuer_are_enforced() {
        let mut claims = claims_for(&bob());
        claims.aud = "someone-else".to_string();
        assert!(issuer().validate(&sign_raw(&claims)).is_err());

        let mut claims = claims_for(&bob());
        claims.iss = "someone-else".to_string();
        assert!(issuer().validate(&sign_raw(&claims)).is_err());
    }

    #[test]
    fn unknown_role_claim_invalidates_token() {
        let mut claims = claims_for(&bob());
        claims.roles.push("ROLE_ROOT".to_string());
        let err = issuer().validate(&sign_raw(&claims)).expect_err("role");
        assert!(matches!(err, AuthzError::UnknownTokenRole(name) if name == "ROLE_ROOT"));
    }

    #[test]
    fn seed_hex_parsing() {
        let key = SessionSigningKey::from_seed_hex("k1", &hex::encode(TEST_SEED)).expect("seed");
        assert_eq!(key.private_key, TEST_SEED);
        key.validate().expect("consistent");

        let err = SessionSigningKey::from_seed_hex("k1", "abcd").expect_err("short");
        assert!(matches!(err, AuthzError::InvalidSigningKey(_)));
        let err = SessionSigningKey::from_seed_hex("k1", "zz").expect_err("not hex");
        assert!(matches!(err, AuthzError::InvalidSigningKey(_)));
    }

    #[test]
    fn mismatched_key_material_is_rejected() {
        let mut key = SessionSigningKey::from_seed("k1", TEST_SEED);
        key.public_key = [0u8; 32];
        let err = SessionIssuer::new("a", "b", Duration::from_secs(1), 0, key)
            .err()
            .expect("mismatch");
        assert!(matches!(err, AuthzError::InvalidSigningKey(_)));
    }

    #[test]
    fn generated_keys_are_distinct_and_valid() {
        let a = generate_signing_key();
        let b = generate_signing_key();
        a.validate().expect("a");
        b.validate().expect("b");
        assert_ne!(a.kid, b.kid);
        assert_ne!(a.private_key, b.private_key);
        assert!(!format!("{a:?}").contains(&hex::encode(a.private_key)));
    }

    #[test]
    fn out_of_range_ttls_are_rejected() {
        for ttl in [
            Duration::ZERO,
            Duration::from_millis(500),
            MAX_SESSION_TTL + Duration::from_secs(1),
            Duration::from_secs(u64::MAX),
        ] {
            let err = SessionIssuer::new(
                "a",
                "b",
                ttl,
                0,
                SessionSigningKey::from_seed("k1", TEST_SEED),
            )
            .err()
            .expect("ttl out of range");
            assert!(matches!(err, AuthzError::InvalidSessionTtl(_)));
        }
    }

    #[test]
    fn longest_ttl_still_issues_live_tokens() {
        let issuer = SessionIssuer::new(
            "accounts-auth",
            "accounts-api",
            MAX_SESSION_TTL,
            0,
            SessionSigningKey::from_seed("k1", TEST_SEED),
        )
        .expect("issuer");
        let session = issuer.issue(&bob()).expect("issue");
        assert!(session.expires_at > now_epoch_seconds());
        assert_eq!(issuer.validate(&session.token).expect("validate"), bob());
    }
}
