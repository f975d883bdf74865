use axum::extract::{Extension, Path};
use axum::response::Json;
use serde_json::{json, Value};
use sqlx::postgres::PgArguments;
use sqlx::Row;
use uuid::Uuid;

use crate::database;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData};
use crate::middleware::AuthUser;

/// Entities exposed to the search endpoint. Maps the public name to the
/// backing table and whether the table carries a soft-delete column.
fn lookup(entity: &str) -> Option<(&'static str, bool)> {
    let mapped = match entity {
        "pages" => ("pages", true),
        "sections" => ("page_sections", true),
        "media" => ("media_assets", true),
        "clients" => ("clients", true),
        "legal_entities" => ("client_legal_entities", true),
        "contracts" => ("client_contracts", true),
        "contacts" => ("client_contacts", true),
        "garage" => ("client_vehicles", true),
        "categories" => ("categories", true),
        "products" => ("products", true),
        "users" => ("users", true),
        // append-only, no deleted_at column
        "audit" => ("audit_log", false),
        _ => return None,
    };
    Some(mapped)
}

/// POST /api/find/:entity - structured search with the filter language
pub async fn find(
    Extension(user): Extension<AuthUser>,
    Path(entity): Path<String>,
    Json(filter_data): Json<FilterData>,
) -> Result<Json<Value>, ApiError> {
    let (table, soft_deletes) = lookup(&entity).ok_or_else(|| {
        ApiError::not_found(format!("Unknown search entity '{}'", entity))
    })?;

    // Accounts and the audit trail are admin-only
    if matches!(entity.as_str(), "users" | "audit") && !user.is_admin() {
        return Err(ApiError::forbidden(format!(
            "Entity '{}' requires the admin role",
            entity
        )));
    }

    let mut filter = Filter::new(table)?;
    filter.assign(filter_data)?;
    if !soft_deletes {
        filter.include_deleted(true);
    }

    let sql = filter.to_sql()?;
    let count_sql = filter.to_count_sql()?;

    // Rows come back as JSON so column subsets in `select` work uniformly
    let wrapped = format!("SELECT row_to_json(t) AS record FROM ({}) t", sql.query);

    let pool = database::pool().await?;

    let mut query = sqlx::query(&wrapped);
    for param in sql.params.iter() {
        query = bind_json_param(query, param);
    }
    let rows = query.fetch_all(pool).await.map_err(crate::database::DbError::from)?;

    let mut count_query = sqlx::query(&count_sql.query);
    for param in count_sql.params.iter() {
        count_query = bind_json_param(count_query, param);
    }
    let count_row = count_query
        .fetch_one(pool)
        .await
        .map_err(crate::database::DbError::from)?;
    let total: i64 = count_row.try_get("count").map_err(crate::database::DbError::from)?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let mut record: Value = row.try_get("record").map_err(crate::database::DbError::from)?;
        if entity == "users" {
            strip_credentials(&mut record);
        }
        records.push(record);
    }

    Ok(Json(json!({ "success": true, "data": records, "total": total })))
}

fn strip_credentials(record: &mut Value) {
    if let Some(map) = record.as_object_mut() {
        map.remove("password_digest");
        map.remove("password_salt");
    }
}

fn bind_json_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => {
            if let Ok(id) = Uuid::parse_str(s) {
                q.bind(id)
            } else {
                q.bind(s)
            }
        }
        // Arrays are expanded into individual params before binding
        Value::Array(_) => q,
        Value::Object(_) => q.bind(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_whitelist() {
        assert_eq!(lookup("pages"), Some(("pages", true)));
        assert_eq!(lookup("audit"), Some(("audit_log", false)));
        assert_eq!(lookup("garage"), Some(("client_vehicles", true)));
        assert_eq!(lookup("information_schema"), None);
        assert_eq!(lookup(""), None);
    }

    #[test]
    fn credentials_are_stripped() {
        let mut record = serde_json::json!({
            "id": "4c9f8d4e-9e24-41c0-8a3a-2f6f0d3a9a11",
            "email": "admin@protek.example",
            "password_digest": "abc",
            "password_salt": "def"
        });
        strip_credentials(&mut record);
        assert!(record.get("password_digest").is_none());
        assert!(record.get("password_salt").is_none());
        assert!(record.get("email").is_some());
    }
}
