use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A site route with an ordered list of content sections.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Page {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub published: bool,
    /// Bumped on every section reorder; reorder requests must present it.
    pub lock_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A typed JSON content block belonging to a page.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PageSection {
    pub id: Uuid,
    pub page_id: Uuid,
    pub kind: String,
    pub position: i32,
    pub schema_version: i32,
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
