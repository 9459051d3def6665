//! Authentication and token revocation.
//!
//! Provides password hashing, JWT issuance and verification, the revocation
//! ledger, the credential store, and the `AuthService` that ties them
//! together. Transport-agnostic: `sahayak_api` binds it to HTTP.

pub mod credentials;
pub mod jwt;
pub mod password;
pub mod revocation;
pub mod service;
pub mod validation;

use std::fmt;

use thiserror::Error;

pub use service::{AuthConfig, AuthService};

/// Why a presented token failed verification.
///
/// Only used for diagnostics and logging; callers treat every variant as
/// "not authenticated".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    BadSignature,
    Expired,
    Malformed,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            TokenRejection::BadSignature => "bad signature",
            TokenRejection::Expired => "expired",
            TokenRejection::Malformed => "malformed",
        };
        f.write_str(reason)
    }
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Email already registered")]
    Conflict,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No token supplied")]
    Unauthenticated,

    #[error("Token is not valid: {0}")]
    InvalidToken(TokenRejection),

    #[error("Token has been revoked")]
    Revoked,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// True for the outcomes a caller must present as "not authenticated".
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AuthError::Unauthenticated | AuthError::InvalidToken(_) | AuthError::Revoked
        )
    }
}

/// Errors reported by the credential store and the revocation ledger.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate key")]
    Conflict,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Conflict,
            sqlx::Error::Database(ref db) if db.code().is_some_and(|c| is_outage_sqlstate(&c)) => {
                StoreError::Unavailable(e.to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(e.to_string()),
            _ => StoreError::Internal(e.to_string()),
        }
    }
}

/// SQLSTATEs meaning the server is unreachable or going away: class 08
/// (connection exception) and 57P01..57P03 (shutdown, cannot connect now).
fn is_outage_sqlstate(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03")
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => AuthError::Conflict,
            StoreError::Unavailable(msg) => AuthError::Unavailable(msg),
            StoreError::Internal(msg) => AuthError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_token_outcomes_are_auth_failures() {
        assert!(AuthError::Unauthenticated.is_auth_failure());
        assert!(AuthError::Revoked.is_auth_failure());
        assert!(AuthError::InvalidToken(TokenRejection::Expired).is_auth_failure());
        assert!(!AuthError::InvalidCredentials.is_auth_failure());
        assert!(!AuthError::Unavailable("down".into()).is_auth_failure());
    }

    #[test]
    fn pool_timeout_maps_to_unavailable() {
        let err = AuthError::from(StoreError::from(sqlx::Error::PoolTimedOut));
        assert!(matches!(err, AuthError::Unavailable(_)));
    }

    #[test]
    fn connection_sqlstates_are_outages() {
        assert!(is_outage_sqlstate("08006"));
        assert!(is_outage_sqlstate("08001"));
        assert!(is_outage_sqlstate("57P01"));
        assert!(is_outage_sqlstate("57P03"));
        assert!(!is_outage_sqlstate("23505"));
        assert!(!is_outage_sqlstate("42P01"));
    }

    #[test]
    fn store_conflict_maps_to_conflict() {
        assert!(matches!(
            AuthError::from(StoreError::Conflict),
            AuthError::Conflict
        ));
    }
}
