use serde_json::Value;
use uuid::Uuid;

use crate::database::models::AuditAction;
use crate::database::{self, DbError};
use crate::middleware::AuthUser;

/// Append-only audit trail writer.
///
/// Audit writes must never fail the request that triggered them; `record`
/// swallows errors after logging them.
pub struct AuditService;

impl AuditService {
    pub async fn record(
        user: &AuthUser,
        action: AuditAction,
        entity: &str,
        entity_id: Option<Uuid>,
        details: Value,
    ) {
        if let Err(e) = Self::try_record(user, action, entity, entity_id, details).await {
            tracing::warn!(
                action = action.as_str(),
                entity,
                "failed to write audit entry: {}",
                e
            );
        }
    }

    async fn try_record(
        user: &AuthUser,
        action: AuditAction,
        entity: &str,
        entity_id: Option<Uuid>,
        details: Value,
    ) -> Result<(), DbError> {
        let pool = database::pool().await?;
        sqlx::query(
            "INSERT INTO audit_log (id, user_id, user_email, action, entity, entity_id, details) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(&user.email)
        .bind(action.as_str())
        .bind(entity)
        .bind(entity_id)
        .bind(details)
        .execute(pool)
        .await?;
        Ok(())
    }
}
