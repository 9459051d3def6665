//! Authentication request handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use sahayak_core::models::auth::AuthSession;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::supplied_token;
use crate::models::{
    CheckEmailRequest, CheckEmailResponse, LoginRequest, MessageResponse, SignupRequest,
};

/// `POST /api/auth/signup` — create a student account and issue a token.
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthSession>)> {
    let session = state
        .auth
        .register(
            body.name.as_deref().unwrap_or_default(),
            body.email.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /api/auth/login` — authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthSession>> {
    let session = state
        .auth
        .login(
            body.email.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(session))
}

/// `POST /api/auth/check-email` — whether an email is already registered.
pub async fn check_email_handler(
    State(state): State<AppState>,
    Json(body): Json<CheckEmailRequest>,
) -> AppResult<Json<CheckEmailResponse>> {
    let exists = state
        .auth
        .check_email_exists(body.email.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(CheckEmailResponse { exists }))
}

/// `POST /api/auth/logout` — revoke the supplied token.
///
/// Accepts the token from the header, body, or query, like `require_auth`.
/// Does not require the token to be valid.
pub async fn logout_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> AppResult<Json<MessageResponse>> {
    let token = supplied_token(&headers, &body, &uri);
    state.auth.logout(token.as_deref()).await?;
    Ok(Json(MessageResponse {
        message: "Logged out".into(),
    }))
}
