//! Request and response bodies.
//!
//! Request fields are optional so that a missing field reaches the core as an
//! empty string and is reported as a validation error, not a JSON rejection.

use serde::{Deserialize, Serialize};

/// `POST /api/auth/signup` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `POST /api/auth/login` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `POST /api/auth/check-email` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckEmailRequest {
    pub email: Option<String>,
}

/// Token supplied in a JSON body or query string instead of a header.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenField {
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckEmailResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error body for every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
