use axum::extract::{Extension, Path};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::content::SectionKind;
use crate::database::models::AuditAction;
use crate::database;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::{AuditService, PageService};

/// GET /api/pages/:id/sections
pub async fn list(Path(page_id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let service = PageService::new(pool);

    // 404 for unknown pages, not an empty list
    service.get_page(page_id).await?;
    let sections = service.list_sections(page_id).await?;

    Ok(Json(json!({ "success": true, "data": sections })))
}

#[derive(Debug, Deserialize)]
pub struct CreateSectionRequest {
    pub kind: String,
    /// Omitted content gets the kind's default payload
    pub content: Option<Value>,
}

/// POST /api/pages/:id/sections
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Path(page_id): Path<Uuid>,
    Json(payload): Json<CreateSectionRequest>,
) -> Result<Json<Value>, ApiError> {
    let kind = SectionKind::parse(&payload.kind)?;

    let pool = database::pool().await?;
    let section = PageService::new(pool)
        .create_section(page_id, kind, payload.content)
        .await?;

    AuditService::record(
        &user,
        AuditAction::Create,
        "page_section",
        Some(section.id),
        json!({ "page_id": page_id, "kind": section.kind }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": section })))
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub lock_version: i32,
    pub section_ids: Vec<Uuid>,
}

/// PUT /api/pages/:id/sections/order - optimistic-concurrency reorder
pub async fn reorder(
    Extension(user): Extension<AuthUser>,
    Path(page_id): Path<Uuid>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let page = PageService::new(pool)
        .reorder_sections(page_id, payload.lock_version, &payload.section_ids)
        .await?;

    AuditService::record(
        &user,
        AuditAction::Update,
        "page",
        Some(page_id),
        json!({ "reordered": payload.section_ids, "lock_version": page.lock_version }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": page })))
}

/// GET /api/sections/:id - payload upgraded to the current schema version
pub async fn get(Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let section = PageService::new(pool).get_section(id).await?;
    Ok(Json(json!({ "success": true, "data": section })))
}

#[derive(Debug, Deserialize)]
pub struct PatchSectionRequest {
    pub content: Value,
}

/// PATCH /api/sections/:id - replace the content payload
pub async fn patch(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PatchSectionRequest>,
) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let section = PageService::new(pool)
        .patch_section_content(id, payload.content)
        .await?;

    AuditService::record(
        &user,
        AuditAction::Update,
        "page_section",
        Some(section.id),
        json!({ "kind": section.kind }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": section })))
}

/// DELETE /api/sections/:id - soft delete
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let section = PageService::new(pool).delete_section(id).await?;

    AuditService::record(
        &user,
        AuditAction::Delete,
        "page_section",
        Some(section.id),
        json!({ "page_id": section.page_id, "kind": section.kind }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": section })))
}
