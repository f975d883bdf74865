use axum::http::HeaderMap;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, Claims};
use crate::database::models::{AuditAction, User};
use crate::database;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::AuditService;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - authenticate and receive a JWT
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<Json<Value>, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let pool = database::pool().await?;
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE email = $1 AND deleted_at IS NULL",
    )
    .bind(payload.email.trim())
    .fetch_optional(pool)
    .await?
    // Same message for unknown email and bad password
    .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !auth::verify_password(&payload.password, &user.password_salt, &user.password_digest) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let claims = Claims::new(user.id, user.email.clone(), user.role.clone());
    let token = auth::generate_jwt(&claims)
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?;

    let auth_user = AuthUser {
        user_id: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
    };
    AuditService::record(&auth_user, AuditAction::Login, "session", None, json!({})).await;

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "user": user,
            "expires_in": claims.expires_in_secs(),
        }
    })))
}

/// POST /auth/refresh - re-issue a token from a still-valid one
pub async fn refresh(headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let auth_str = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Authorization header must use Bearer token format"))?;

    let claims = auth::validate_jwt(token).map_err(|e| ApiError::unauthorized(e.to_string()))?;

    // Refresh only works for users that still exist
    let pool = database::pool().await?;
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(claims.user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    let fresh = Claims::new(user.id, user.email.clone(), user.role.clone());
    let token = auth::generate_jwt(&fresh)
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "expires_in": fresh.expires_in_secs(),
        }
    })))
}
