//! Authentication handlers
//!
//! Implements login, logout, and current user endpoints

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{Caller, SESSION_TIMESTAMP_KEY, SESSION_USER_KEY};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Current user response
#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub id: String,
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<CurrentUserResponse>>> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest("username and password required".to_string()));
    }

    let Some(user) = state.users.find_user_by_username(&req.username).await? else {
        tracing::warn!("Login failed: user not found - {}", req.username);
        return Err(AppError::BadRequest("username or password error".to_string()));
    };

    let password_valid = bcrypt::verify(&req.password, &user.password_hash).unwrap_or(false);
    if !password_valid {
        tracing::warn!("Login failed: wrong password - {}", req.username);
        return Err(AppError::BadRequest("username or password error".to_string()));
    }

    session
        .insert(SESSION_USER_KEY, &user.id)
        .await
        .map_err(|e| AppError::Internal(format!("failed to save session: {}", e)))?;
    if let Err(e) = session
        .insert(SESSION_TIMESTAMP_KEY, chrono::Utc::now().timestamp())
        .await
    {
        tracing::error!("Failed to save session timestamp: {}", e);
    }

    tracing::info!("User logged in: {}", user.username);

    Ok(Json(ApiResponse::success(CurrentUserResponse {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
    })))
}

/// POST /api/logout
pub async fn logout(
    session: Session,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<ApiResponse<()>>> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("failed to flush session: {}", e)))?;

    if let Some(user) = caller.0 {
        tracing::info!("User logged out: {}", user.username);
    }

    Ok(Json(ApiResponse::success_msg("logout success")))
}

/// GET /api/user/current
pub async fn current_user(
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<ApiResponse<CurrentUserResponse>>> {
    let user = caller.0.ok_or(AppError::Unauthenticated)?;
    Ok(Json(ApiResponse::success(CurrentUserResponse {
        id: user.id,
        username: user.username,
        full_name: user.full_name,
    })))
}
