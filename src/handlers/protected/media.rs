use axum::extract::{Extension, Multipart, Path, Query};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config;
use crate::database::models::{AuditAction, MediaAsset};
use crate::database::{self, Repository};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::media::{FsStore, MediaStore, MediaStoreError};
use crate::middleware::AuthUser;
use crate::services::AuditService;

#[derive(Debug, Deserialize)]
pub struct MediaListQuery {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// GET /api/media
pub async fn list(Query(query): Query<MediaListQuery>) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let repo = Repository::<MediaAsset>::new("media_assets", pool.clone());

    let filter = FilterData {
        order: Some(json!("created_at desc")),
        limit: query.limit,
        offset: query.offset,
        ..Default::default()
    };
    let total = repo.count(filter.clone()).await?;
    let assets = repo.select_any(filter).await?;

    Ok(Json(json!({ "success": true, "data": assets, "total": total })))
}

/// POST /api/media - multipart upload: a `file` part plus optional `alt` text
pub async fn upload(
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let max_bytes = config::config().media.max_upload_bytes;

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut alt = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
                if bytes.len() > max_bytes {
                    return Err(ApiError::bad_request(format!(
                        "Upload exceeds maximum size of {} bytes",
                        max_bytes
                    )));
                }
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("alt") => {
                alt = field.text().await.unwrap_or_default();
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::bad_request("Missing 'file' part"))?;
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let store = FsStore::from_config();
    let storage_path = store
        .put(&file_name, &bytes)
        .await
        .map_err(store_error)?;

    let pool = database::pool().await?;
    let asset = sqlx::query_as::<_, MediaAsset>(
        "INSERT INTO media_assets (id, file_name, content_type, byte_size, storage_path, alt) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&file_name)
    .bind(&content_type)
    .bind(bytes.len() as i64)
    .bind(&storage_path)
    .bind(&alt)
    .fetch_one(pool)
    .await?;

    AuditService::record(
        &user,
        AuditAction::Create,
        "media_asset",
        Some(asset.id),
        json!({ "file_name": asset.file_name, "byte_size": asset.byte_size }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": asset })))
}

/// GET /api/media/:id - metadata
pub async fn get(Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let asset = fetch_asset(id).await?;
    Ok(Json(json!({ "success": true, "data": asset })))
}

/// GET /api/media/:id/raw - asset bytes with the stored content type
pub async fn raw(Path(id): Path<Uuid>) -> Result<Response, ApiError> {
    let asset = fetch_asset(id).await?;

    let store = FsStore::from_config();
    let bytes = store.get(&asset.storage_path).await.map_err(store_error)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, asset.content_type)],
        bytes,
    )
        .into_response())
}

/// DELETE /api/media/:id - soft-delete the row, remove the bytes
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let asset = sqlx::query_as::<_, MediaAsset>(
        "UPDATE media_assets SET deleted_at = $2 \
         WHERE id = $1 AND deleted_at IS NULL RETURNING *",
    )
    .bind(id)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Media asset {} not found", id)))?;

    // Bytes are gone even if the row is only soft-deleted; restore would re-upload
    let store = FsStore::from_config();
    if let Err(e) = store.delete(&asset.storage_path).await {
        tracing::warn!("failed to remove stored file {}: {}", asset.storage_path, e);
    }

    AuditService::record(
        &user,
        AuditAction::Delete,
        "media_asset",
        Some(asset.id),
        json!({ "file_name": asset.file_name }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": asset })))
}

async fn fetch_asset(id: Uuid) -> Result<MediaAsset, ApiError> {
    let pool = database::pool().await?;
    sqlx::query_as::<_, MediaAsset>(
        "SELECT * FROM media_assets WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Media asset {} not found", id)))
}

fn store_error(err: MediaStoreError) -> ApiError {
    match err {
        MediaStoreError::NotFound(path) => {
            tracing::warn!("asset row exists but file missing: {}", path);
            ApiError::not_found("Stored file is missing")
        }
        other => {
            tracing::error!("media store error: {}", other);
            ApiError::internal_server_error("Media storage error")
        }
    }
}
