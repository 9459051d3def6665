//! API server configuration.

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:5000").
    pub bind_addr: String,
    /// Include the precise rejection reason (revoked, expired, ...) in 401
    /// responses. Off in production: every auth failure looks the same.
    pub expose_auth_diagnostics: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".into(),
            expose_auth_diagnostics: false,
        }
    }
}
