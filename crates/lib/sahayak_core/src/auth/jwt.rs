//! JWT token issuance, verification and best-effort expiry extraction.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use uuid::Uuid;

use super::{AuthError, TokenRejection};
use crate::models::auth::{DecodedToken, TokenClaims};

/// Token lifetime: 7 days.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Shortest signing secret accepted at startup.
pub const MIN_SECRET_LEN: usize = 32;

/// Server-held HMAC signing secret. Immutable once constructed.
#[derive(Clone)]
pub struct JwtSecret(Vec<u8>);

impl JwtSecret {
    /// Wrap a secret, rejecting empty or short values.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Config(format!(
                "JWT secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        Ok(Self(secret))
    }

    /// Resolve the secret from `JWT_SECRET`, falling back to `AUTH_SECRET`.
    ///
    /// There is no built-in default: a missing secret is a startup error.
    pub fn from_env() -> Result<Self, AuthError> {
        for var in ["JWT_SECRET", "AUTH_SECRET"] {
            if let Ok(secret) = std::env::var(var)
                && !secret.is_empty()
            {
                return Self::new(secret);
            }
        }
        Err(AuthError::Config(
            "JWT_SECRET (or AUTH_SECRET) must be set".into(),
        ))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtSecret(<redacted>)")
    }
}

/// Only the expiry claim, read without verifying the signature.
#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Signs and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    peek_validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &JwtSecret, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let mut peek_validation = Validation::new(Algorithm::HS256);
        peek_validation.insecure_disable_signature_validation();
        peek_validation.validate_exp = false;
        peek_validation.validate_aud = false;
        peek_validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            peek_validation,
            ttl,
        }
    }

    /// Default lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject_id` with the default lifetime.
    pub fn issue(&self, subject_id: &str) -> Result<String, AuthError> {
        self.issue_with_ttl(subject_id, self.ttl)
    }

    /// Issue a token for `subject_id` expiring `ttl` from now.
    pub fn issue_with_ttl(&self, subject_id: &str, ttl: Duration) -> Result<String, AuthError> {
        if ttl <= Duration::zero() {
            return Err(AuthError::ValidationError(
                "token lifetime must be positive".into(),
            ));
        }
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AuthError::ValidationError("token lifetime out of range".into())
        })?;
        let claims = TokenClaims {
            sub: subject_id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify signature and expiry, returning the subject and expiry.
    pub fn decode(&self, token: &str) -> Result<DecodedToken, TokenRejection> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenRejection::Expired,
                ErrorKind::InvalidSignature => TokenRejection::BadSignature,
                _ => TokenRejection::Malformed,
            }
        })?;
        let claims = data.claims;
        if claims.sub.is_empty() {
            return Err(TokenRejection::Malformed);
        }
        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(TokenRejection::Malformed)?;
        // jsonwebtoken accepts `exp == now`; a token is only valid strictly before expiry.
        if expires_at <= Utc::now() {
            return Err(TokenRejection::Expired);
        }
        Ok(DecodedToken {
            subject_id: claims.sub,
            expires_at,
        })
    }

    /// Read the expiry claim without checking the signature or the expiry itself.
    ///
    /// Never use the result for authorization.
    pub fn peek(&self, token: &str) -> Result<DateTime<Utc>, TokenRejection> {
        let key = DecodingKey::from_secret(&[]);
        let data = decode::<ExpiryClaim>(token, &key, &self.peek_validation)
            .map_err(|_| TokenRejection::Malformed)?;
        DateTime::from_timestamp(data.claims.exp, 0).ok_or(TokenRejection::Malformed)
    }
}
