//! Example protected endpoint.

use axum::extract::State;
use axum::{Extension, Json};
use sahayak_core::models::auth::UserView;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;

/// `GET /api/profile` — the authenticated user's public view.
pub async fn profile_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> AppResult<Json<UserView>> {
    let view = state
        .auth
        .current_user(&user.0)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(view))
}
