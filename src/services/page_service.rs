use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::content::SectionKind;
use crate::database::models::{Page, PageSection};
use crate::error::ApiError;

/// Section lifecycle on top of the content registry: creation with validated
/// or defaulted payloads, content patches, lazy payload upgrades, and
/// optimistic-concurrency reordering.
pub struct PageService<'a> {
    pool: &'a PgPool,
}

impl<'a> PageService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_page(&self, page_id: Uuid) -> Result<Page, ApiError> {
        sqlx::query_as::<_, Page>(
            "SELECT * FROM pages WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(page_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Page {} not found", page_id)))
    }

    /// Live sections of a page in display order, payloads upgraded to the
    /// current schema version. Upgrades are not written back here; the next
    /// content write persists the current version.
    pub async fn list_sections(&self, page_id: Uuid) -> Result<Vec<PageSection>, ApiError> {
        let rows = sqlx::query_as::<_, PageSection>(
            "SELECT * FROM page_sections \
             WHERE page_id = $1 AND deleted_at IS NULL ORDER BY position",
        )
        .bind(page_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Self::upgraded).collect()
    }

    pub async fn get_section(&self, section_id: Uuid) -> Result<PageSection, ApiError> {
        let section = sqlx::query_as::<_, PageSection>(
            "SELECT * FROM page_sections WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(section_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Section {} not found", section_id)))?;

        Self::upgraded(section)
    }

    /// Create a section at the end of the page. A missing payload gets the
    /// kind's default; a present one must validate.
    pub async fn create_section(
        &self,
        page_id: Uuid,
        kind: SectionKind,
        content: Option<Value>,
    ) -> Result<PageSection, ApiError> {
        // 404 before 400: the page must exist
        self.get_page(page_id).await?;

        let content = match content {
            Some(payload) => {
                kind.validate(&payload)?;
                payload
            }
            None => kind.default_content(),
        };

        let section = sqlx::query_as::<_, PageSection>(
            "INSERT INTO page_sections (id, page_id, kind, position, schema_version, content) \
             VALUES ($1, $2, $3, \
                     (SELECT COALESCE(MAX(position), -1) + 1 FROM page_sections \
                      WHERE page_id = $2 AND deleted_at IS NULL), \
                     $4, $5) \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(page_id)
        .bind(kind.as_str())
        .bind(kind.current_version())
        .bind(content)
        .fetch_one(self.pool)
        .await?;

        Ok(section)
    }

    /// Replace a section's payload. The payload must satisfy the section
    /// kind's current shape; the row is stamped with the current version.
    pub async fn patch_section_content(
        &self,
        section_id: Uuid,
        content: Value,
    ) -> Result<PageSection, ApiError> {
        let section = self.get_section(section_id).await?;
        let kind = SectionKind::parse(&section.kind)?;
        kind.validate(&content)?;

        let updated = sqlx::query_as::<_, PageSection>(
            "UPDATE page_sections \
             SET content = $2, schema_version = $3, updated_at = $4 \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING *",
        )
        .bind(section_id)
        .bind(content)
        .bind(kind.current_version())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(updated)
    }

    pub async fn delete_section(&self, section_id: Uuid) -> Result<PageSection, ApiError> {
        let section = sqlx::query_as::<_, PageSection>(
            "UPDATE page_sections SET deleted_at = $2 \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING *",
        )
        .bind(section_id)
        .bind(Utc::now())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Section {} not found", section_id)))?;

        Ok(section)
    }

    /// Rewrite the display order of a page's sections.
    ///
    /// `expected_version` must match the page's current `lock_version`; a
    /// mismatch means someone reordered concurrently and yields 409 with no
    /// changes applied. `section_ids` must be exactly the page's live
    /// sections.
    pub async fn reorder_sections(
        &self,
        page_id: Uuid,
        expected_version: i32,
        section_ids: &[Uuid],
    ) -> Result<Page, ApiError> {
        let mut tx = self.pool.begin().await?;

        let page = sqlx::query_as::<_, Page>(
            "SELECT * FROM pages WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(page_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Page {} not found", page_id)))?;

        if page.lock_version != expected_version {
            return Err(ApiError::conflict(format!(
                "Page was reordered concurrently (expected version {}, found {})",
                expected_version, page.lock_version
            )));
        }

        let live_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM page_sections WHERE page_id = $1 AND deleted_at IS NULL",
        )
        .bind(page_id)
        .fetch_all(&mut *tx)
        .await?;

        if !same_id_set(section_ids, &live_ids) {
            return Err(ApiError::bad_request(
                "Reorder must list every live section of the page exactly once",
            ));
        }

        for (position, section_id) in section_ids.iter().enumerate() {
            sqlx::query("UPDATE page_sections SET position = $2, updated_at = $3 WHERE id = $1")
                .bind(section_id)
                .bind(position as i32)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
        }

        let page = sqlx::query_as::<_, Page>(
            "UPDATE pages SET lock_version = lock_version + 1, updated_at = $2 \
             WHERE id = $1 RETURNING *",
        )
        .bind(page_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(page)
    }

    fn upgraded(mut section: PageSection) -> Result<PageSection, ApiError> {
        let kind = SectionKind::parse(&section.kind)?;
        if section.schema_version != kind.current_version() {
            let (content, version) =
                kind.upgrade(section.schema_version, section.content)?;
            section.content = content;
            section.schema_version = version;
        }
        Ok(section)
    }
}

fn same_id_set(requested: &[Uuid], live: &[Uuid]) -> bool {
    if requested.len() != live.len() {
        return false;
    }
    let mut a: Vec<Uuid> = requested.to_vec();
    let mut b: Vec<Uuid> = live.to_vec();
    a.sort();
    a.dedup();
    if a.len() != live.len() {
        return false;
    }
    b.sort();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_set_comparison() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        assert!(same_id_set(&[a, b], &[b, a]));
        assert!(!same_id_set(&[a, b], &[a, c]));
        assert!(!same_id_set(&[a], &[a, b]));
        // Duplicates never match
        assert!(!same_id_set(&[a, a], &[a, b]));
    }
}
