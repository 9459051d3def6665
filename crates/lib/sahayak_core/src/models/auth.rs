//! Authentication domain models.
//!
//! `UserView` and `AuthSession` are serialized as-is by `sahayak_api`
//! (camelCase on the wire); the rest stay internal to the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The only user role the system knows.
pub const STUDENT: &str = "student";

/// Stored user identity, including the password hash.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Normalized (trimmed, lowercased).
    pub email: String,
    pub password_hash: String,
    pub user_type: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user. The email must already be normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_type: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            user_type: user.user_type.clone(),
        }
    }
}

/// A freshly issued token together with the user it was issued to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserView,
}

/// JWT claims embedded in bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — user ID.
    pub sub: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Random token ID; keeps tokens issued in the same second distinct.
    pub jti: String,
}

/// Contents of a token whose signature and expiry have been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub subject_id: String,
    pub expires_at: DateTime<Utc>,
}
