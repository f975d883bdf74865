use axum::extract::{Extension, Path, Query};
use axum::response::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::{AuditAction, Page};
use crate::database::{self, Repository};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::AuthUser;
use crate::services::{AuditService, PageService};

#[derive(Debug, Deserialize)]
pub struct PageListQuery {
    pub published: Option<bool>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// GET /api/pages
pub async fn list(Query(query): Query<PageListQuery>) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let repo = Repository::<Page>::new("pages", pool.clone());

    let where_clause = query.published.map(|p| json!({ "published": p }));
    let filter = FilterData {
        where_clause,
        order: Some(json!("updated_at desc")),
        limit: query.limit,
        offset: query.offset,
        ..Default::default()
    };

    let total = repo.count(filter.clone()).await?;
    let pages = repo.select_any(filter).await?;

    Ok(Json(json!({ "success": true, "data": pages, "total": total })))
}

#[derive(Debug, Deserialize)]
pub struct CreatePageRequest {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published: bool,
}

/// POST /api/pages
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreatePageRequest>,
) -> Result<Json<Value>, ApiError> {
    validate_slug(&payload.slug)?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation_error(
            "Title is required",
            Some([("title".to_string(), "required".to_string())].into()),
        ));
    }

    let pool = database::pool().await?;
    let existing: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM pages WHERE slug = $1 AND deleted_at IS NULL")
            .bind(&payload.slug)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(ApiError::conflict(format!(
            "Page with slug '{}' already exists",
            payload.slug
        )));
    }

    let page = sqlx::query_as::<_, Page>(
        "INSERT INTO pages (id, slug, title, description, published) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&payload.slug)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.published)
    .fetch_one(pool)
    .await?;

    AuditService::record(
        &user,
        AuditAction::Create,
        "page",
        Some(page.id),
        json!({ "slug": page.slug }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": page })))
}

/// GET /api/pages/:id - page plus its sections in display order
pub async fn get(Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let service = PageService::new(pool);

    let page = service.get_page(id).await?;
    let sections = service.list_sections(id).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "page": page, "sections": sections }
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePageRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub published: Option<bool>,
}

/// PUT /api/pages/:id
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePageRequest>,
) -> Result<Json<Value>, ApiError> {
    if let Some(ref slug) = payload.slug {
        validate_slug(slug)?;
    }
    if let Some(ref title) = payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::validation_error(
                "Title cannot be empty",
                Some([("title".to_string(), "required".to_string())].into()),
            ));
        }
    }

    let pool = database::pool().await?;

    // Renaming onto a live slug is a conflict, same as on create
    if let Some(ref slug) = payload.slug {
        let taken: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM pages WHERE slug = $1 AND id != $2 AND deleted_at IS NULL",
        )
        .bind(slug)
        .bind(id)
        .fetch_optional(pool)
        .await?;
        if taken.is_some() {
            return Err(ApiError::conflict(format!(
                "Page with slug '{}' already exists",
                slug
            )));
        }
    }

    let page = sqlx::query_as::<_, Page>(
        "UPDATE pages SET \
            slug = COALESCE($2, slug), \
            title = COALESCE($3, title), \
            description = COALESCE($4, description), \
            published = COALESCE($5, published), \
            updated_at = $6 \
         WHERE id = $1 AND deleted_at IS NULL RETURNING *",
    )
    .bind(id)
    .bind(payload.slug.as_deref())
    .bind(payload.title.as_deref().map(str::trim))
    .bind(payload.description.as_deref())
    .bind(payload.published)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Page {} not found", id)))?;

    AuditService::record(
        &user,
        AuditAction::Update,
        "page",
        Some(page.id),
        json!({ "slug": page.slug }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": page })))
}

/// DELETE /api/pages/:id - soft delete
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let page = sqlx::query_as::<_, Page>(
        "UPDATE pages SET deleted_at = $2 \
         WHERE id = $1 AND deleted_at IS NULL RETURNING *",
    )
    .bind(id)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Page {} not found", id)))?;

    AuditService::record(
        &user,
        AuditAction::Delete,
        "page",
        Some(page.id),
        json!({ "slug": page.slug }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": page })))
}

/// POST /api/pages/:id/restore - undo a soft delete
pub async fn restore(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let page = sqlx::query_as::<_, Page>(
        "UPDATE pages SET deleted_at = NULL, updated_at = $2 \
         WHERE id = $1 AND deleted_at IS NOT NULL RETURNING *",
    )
    .bind(id)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("No deleted page {} to restore", id)))?;

    AuditService::record(
        &user,
        AuditAction::Update,
        "page",
        Some(page.id),
        json!({ "restored": true }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": page })))
}

fn validate_slug(slug: &str) -> Result<(), ApiError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');
    if valid {
        Ok(())
    } else {
        Err(ApiError::validation_error(
            "Slug must be lowercase letters, digits and hyphens",
            Some([("slug".to_string(), "invalid format".to_string())].into()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_validation() {
        assert!(validate_slug("delivery").is_ok());
        assert!(validate_slug("about-company-2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Main").is_err());
        assert!(validate_slug("-lead").is_err());
        assert!(validate_slug("trail-").is_err());
        assert!(validate_slug("with space").is_err());
    }
}
