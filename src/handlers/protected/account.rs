use axum::extract::Extension;
use axum::response::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{hash_password, new_salt, verify_password};
use crate::database::models::{AuditAction, User};
use crate::database;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::AuditService;

/// GET /api/account - the authenticated user's own record
pub async fn get(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let account = fetch_user(&user).await?;
    Ok(Json(json!({ "success": true, "data": account })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// PUT /api/account - update name and/or email
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<Value>, ApiError> {
    if let Some(ref email) = payload.email {
        if !email.contains('@') {
            return Err(ApiError::validation_error(
                "Invalid email address",
                Some([("email".to_string(), "invalid format".to_string())].into()),
            ));
        }
    }
    if let Some(ref name) = payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation_error(
                "Name cannot be empty",
                Some([("name".to_string(), "required".to_string())].into()),
            ));
        }
    }

    let pool = database::pool().await?;

    if let Some(ref email) = payload.email {
        let taken: Option<uuid::Uuid> = sqlx::query_scalar(
            "SELECT id FROM users WHERE email = $1 AND id != $2 AND deleted_at IS NULL",
        )
        .bind(email)
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;
        if taken.is_some() {
            return Err(ApiError::conflict("Email is already in use"));
        }
    }

    let account = sqlx::query_as::<_, User>(
        "UPDATE users SET \
            name = COALESCE($2, name), \
            email = COALESCE($3, email), \
            updated_at = $4 \
         WHERE id = $1 AND deleted_at IS NULL RETURNING *",
    )
    .bind(user.user_id)
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.email.as_deref())
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Account no longer exists"))?;

    AuditService::record(
        &user,
        AuditAction::Update,
        "user",
        Some(account.id),
        json!({ "email": account.email }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": account })))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// PUT /api/account/password - requires the current password
pub async fn change_password(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.new_password.len() < 8 {
        return Err(ApiError::validation_error(
            "Password must be at least 8 characters",
            Some([("new_password".to_string(), "too short".to_string())].into()),
        ));
    }

    let account = fetch_user(&user).await?;
    if !verify_password(
        &payload.current_password,
        &account.password_salt,
        &account.password_digest,
    ) {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let salt = new_salt();
    let digest = hash_password(&payload.new_password, &salt);

    let pool = database::pool().await?;
    sqlx::query(
        "UPDATE users SET password_digest = $2, password_salt = $3, updated_at = $4 \
         WHERE id = $1",
    )
    .bind(account.id)
    .bind(&digest)
    .bind(&salt)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    AuditService::record(
        &user,
        AuditAction::Update,
        "user",
        Some(account.id),
        json!({ "password_changed": true }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": { "updated": true } })))
}

async fn fetch_user(user: &AuthUser) -> Result<User, ApiError> {
    let pool = database::pool().await?;
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Account no longer exists"))
}
