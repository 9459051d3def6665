//! Authentication middleware — supplied-token extraction and verification.
//!
//! The token is taken from `Authorization: Bearer <token>`, falling back to a
//! `token` field in a JSON body and then to the `token` query parameter.

use axum::body::{Body, Bytes};
use axum::extract::{Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Uri};
use axum::middleware::Next;
use axum::response::Response;

use crate::AppState;
use crate::error::AppError;
use crate::models::TokenField;

/// Largest body buffered while looking for a `token` field.
const MAX_TOKEN_BODY_BYTES: usize = 64 * 1024;

/// Subject ID of the verified token, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .split(' ')
        .next()
        .filter(|t| !t.is_empty())
}

fn body_token(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice::<TokenField>(body)
        .ok()?
        .token
        .filter(|t| !t.is_empty())
}

fn query_token(uri: &Uri) -> Option<String> {
    Query::<TokenField>::try_from_uri(uri)
        .ok()?
        .0
        .token
        .filter(|t| !t.is_empty())
}

/// Resolve the supplied token from header, body, or query, in that order.
pub fn supplied_token(headers: &HeaderMap, body: &[u8], uri: &Uri) -> Option<String> {
    bearer_token(headers)
        .map(str::to_string)
        .or_else(|| body_token(body))
        .or_else(|| query_token(uri))
}

/// Axum middleware: verifies the supplied token (revocation included) and
/// injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();

    // Only buffer the body when the header does not carry the token.
    let (token, body) = match bearer_token(&parts.headers) {
        Some(token) => (Some(token.to_string()), body),
        None => {
            let bytes: Bytes = axum::body::to_bytes(body, MAX_TOKEN_BODY_BYTES)
                .await
                .map_err(|_| AppError::Validation("Request body too large".into()))?;
            let token = supplied_token(&parts.headers, &bytes, &parts.uri);
            (token, Body::from(bytes))
        }
    };

    let subject = state
        .auth
        .authenticate(token.as_deref())
        .await
        .map_err(|e| AppError::from_auth(e, state.config.expose_auth_diagnostics))?;

    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(AuthenticatedUser(subject));
    Ok(next.run(request).await)
}
