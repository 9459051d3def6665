//! Authentication service — registration, login, logout and per-request
//! token verification.
//!
//! Every call into the credential store or the revocation ledger is bounded
//! by `AuthConfig::store_timeout`. A timeout or an unreachable store surfaces
//! as [`AuthError::Unavailable`], never as an authentication failure.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::credentials::CredentialStore;
use super::jwt::{DEFAULT_TOKEN_TTL_DAYS, JwtSecret, TokenCodec};
use super::password::{DEFAULT_BCRYPT_COST, PasswordHasher};
use super::revocation::RevocationLedger;
use super::validation::{normalize_email, validate_registration};
use super::{AuthError, StoreError};
use crate::models::auth::{AuthSession, NewUser, UserView};

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables for [`AuthService`].
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Lifetime of issued tokens.
    pub token_ttl: chrono::Duration,
    /// Upper bound on each credential-store / ledger call.
    pub store_timeout: Duration,
    /// bcrypt work factor.
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl: chrono::Duration::days(DEFAULT_TOKEN_TTL_DAYS),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

/// Orchestrates the credential store, password hasher, token codec and
/// revocation ledger. Holds no locks; cheap to clone.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    ledger: Arc<dyn RevocationLedger>,
    codec: TokenCodec,
    hasher: PasswordHasher,
    store_timeout: Duration,
    /// Verified against when the email is unknown, so that path costs one
    /// bcrypt round like a wrong password does.
    dummy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(
        secret: &JwtSecret,
        users: Arc<dyn CredentialStore>,
        ledger: Arc<dyn RevocationLedger>,
        config: AuthConfig,
    ) -> Result<Self, AuthError> {
        if config.token_ttl <= chrono::Duration::zero() {
            return Err(AuthError::Config("token lifetime must be positive".into()));
        }
        if Utc::now().checked_add_signed(config.token_ttl).is_none() {
            return Err(AuthError::Config("token lifetime out of range".into()));
        }
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        let dummy_hash = hasher.hash("sahayak-unknown-user")?;
        Ok(Self {
            users,
            ledger,
            codec: TokenCodec::new(secret, config.token_ttl),
            hasher,
            store_timeout: config.store_timeout,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Token codec used by this service.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Register a new user and issue a token for them.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let registration = validate_registration(name, email, password)?;

        if self
            .bounded("email lookup", self.users.email_exists(&registration.email))
            .await?
        {
            return Err(AuthError::Conflict);
        }

        let password_hash = self.hash_password(password).await?;
        // The store enforces uniqueness again; a concurrent registration that
        // passed the check above surfaces here as Conflict.
        let user = self
            .bounded(
                "create user",
                self.users.create(NewUser {
                    name: registration.name,
                    email: registration.email,
                    password_hash,
                }),
            )
            .await?;

        let token = self.codec.issue(&user.id)?;
        info!(user_id = %user.id, "registered user");
        Ok(AuthSession {
            token,
            user: UserView::from(&user),
        })
    }

    /// Verify credentials and issue a fresh token.
    ///
    /// An unknown email and a wrong password yield the same
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::ValidationError("Missing fields".into()));
        }

        let user = self
            .bounded("user lookup", self.users.find_by_email(&email))
            .await?;

        let Some(user) = user else {
            self.verify_password(password, self.dummy_hash.clone()).await?;
            debug!("login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .verify_password(password, user.password_hash.as_str().into())
            .await?
        {
            debug!(user_id = %user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.codec.issue(&user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(AuthSession {
            token,
            user: UserView::from(&user),
        })
    }

    /// Whether an email is registered. Read-only.
    pub async fn check_email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(AuthError::ValidationError("Missing email".into()));
        }
        self.bounded("email lookup", self.users.email_exists(&email))
            .await
    }

    /// Revoke a token. Idempotent.
    ///
    /// Tokens that fail verification are still revoked verbatim, using the
    /// unverified expiry claim or the default lifetime as the entry's expiry.
    pub async fn logout(&self, token: Option<&str>) -> Result<(), AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::ValidationError("No token provided".into()))?;

        let expires_at = match self.codec.decode(token) {
            Ok(decoded) => decoded.expires_at,
            Err(reason) => {
                debug!(%reason, "revoking a token that failed verification");
                match self.codec.peek(token) {
                    Ok(expires_at) => expires_at,
                    Err(_) => Utc::now()
                        .checked_add_signed(self.codec.ttl())
                        .ok_or_else(|| AuthError::Internal("token lifetime out of range".into()))?,
                }
            }
        };

        self.bounded("revoke token", self.ledger.insert(token, expires_at))
            .await?;
        info!(%expires_at, "token revoked");
        Ok(())
    }

    /// Resolve the subject of a presented token.
    ///
    /// The ledger is consulted before the signature: a token can be well
    /// within its lifetime and still revoked.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<String, AuthError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated)?;

        if self
            .bounded("revocation lookup", self.ledger.contains(token))
            .await?
        {
            debug!("rejected revoked token");
            return Err(AuthError::Revoked);
        }

        let decoded = self.codec.decode(token).map_err(|reason| {
            debug!(%reason, "rejected invalid token");
            AuthError::InvalidToken(reason)
        })?;
        Ok(decoded.subject_id)
    }

    /// Public view of an authenticated subject, if the user still exists.
    pub async fn current_user(&self, subject_id: &str) -> Result<Option<UserView>, AuthError> {
        let user = self
            .bounded("user lookup", self.users.find_by_id(subject_id))
            .await?;
        Ok(user.as_ref().map(UserView::from))
    }

    /// Run a store call under the configured timeout.
    async fn bounded<T, F>(&self, op: &'static str, call: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if !matches!(e, StoreError::Conflict) {
                    warn!(op, error = %e, "store call failed");
                }
                Err(e.into())
            }
            Err(_) => {
                warn!(op, timeout_ms = self.store_timeout.as_millis() as u64, "store call timed out");
                Err(AuthError::Unavailable(format!(
                    "{op} timed out after {:?}",
                    self.store_timeout
                )))
            }
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hash task: {e}")))?
    }

    async fn verify_password(&self, password: &str, hash: Arc<str>) -> Result<bool, AuthError> {
        let hasher = self.hasher;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("verify task: {e}")))
    }
}
