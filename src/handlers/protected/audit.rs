use axum::extract::Query;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config;
use crate::database::models::AuditEntry;
use crate::database;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AuditListQuery {
    pub entity: Option<String>,
    pub entity_id: Option<Uuid>,
    pub action: Option<String>,
    pub user_email: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/audit - append-only log, newest first
pub async fn list(Query(query): Query<AuditListQuery>) -> Result<Json<Value>, ApiError> {
    if let Some(ref action) = query.action {
        let known = ["CREATE", "UPDATE", "DELETE", "LOGIN"];
        if !known.contains(&action.as_str()) {
            return Err(ApiError::bad_request(format!(
                "Unknown action '{}', expected one of: {}",
                action,
                known.join(", ")
            )));
        }
    }

    let filter_config = &config::config().filter;
    let limit = query
        .limit
        .unwrap_or(filter_config.default_limit as i64)
        .clamp(1, filter_config.max_limit as i64);
    let offset = query.offset.unwrap_or(0).max(0);

    // audit_log is append-only; no soft-delete column to guard
    let mut conditions = Vec::new();
    if query.entity.is_some() {
        conditions.push(format!("entity = ${}", conditions.len() + 1));
    }
    if query.entity_id.is_some() {
        conditions.push(format!("entity_id = ${}", conditions.len() + 1));
    }
    if query.action.is_some() {
        conditions.push(format!("action = ${}", conditions.len() + 1));
    }
    if query.user_email.is_some() {
        conditions.push(format!("user_email = ${}", conditions.len() + 1));
    }
    let where_sql = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let sql = format!(
        "SELECT * FROM audit_log{} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
        where_sql,
        conditions.len() + 1,
        conditions.len() + 2
    );
    let count_sql = format!("SELECT COUNT(*) FROM audit_log{}", where_sql);

    let mut select = sqlx::query_as::<_, AuditEntry>(&sql);
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(ref entity) = query.entity {
        select = select.bind(entity);
        count = count.bind(entity);
    }
    if let Some(entity_id) = query.entity_id {
        select = select.bind(entity_id);
        count = count.bind(entity_id);
    }
    if let Some(ref action) = query.action {
        select = select.bind(action);
        count = count.bind(action);
    }
    if let Some(ref user_email) = query.user_email {
        select = select.bind(user_email);
        count = count.bind(user_email);
    }

    let pool = database::pool().await?;
    let total = count.fetch_one(pool).await?;
    let entries = select.bind(limit).bind(offset).fetch_all(pool).await?;

    Ok(Json(json!({ "success": true, "data": entries, "total": total })))
}
