//! Comment entity and its table configuration.

use crate::db::ModelConfiguration;
use crate::model::article::ArticleId;
use crate::model::audit::{Auditable, AuditFields, AUDIT_COLUMNS_SQL};
use crate::model::{parse_uuid_column, require_text, ValidationError};
use crate::tracking::Entity;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::any::Any;
use uuid::Uuid;

pub type CommentId = Uuid;

pub(crate) const COMMENT_TABLE: &str = "comments";

/// Reader comment attached to one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    /// Must reference a persisted article; enforced by a foreign key.
    pub article_id: ArticleId,
    pub content: String,
    pub audit: AuditFields,
}

impl Comment {
    pub fn new(article_id: ArticleId, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            article_id,
            content: content.into(),
            audit: AuditFields::default(),
        }
    }

    pub(crate) fn select_sql() -> String {
        format!("SELECT id, article_id, content, {AUDIT_COLUMNS_SQL} FROM {COMMENT_TABLE}")
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_uuid_column(row, "id")?,
            article_id: parse_uuid_column(row, "article_id")?,
            content: row.get("content")?,
            audit: AuditFields::from_row(row)?,
        })
    }
}

impl Auditable for Comment {
    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl Entity for Comment {
    fn table(&self) -> &'static str {
        COMMENT_TABLE
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("comment", "content", &self.content)
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO comments (
                id, article_id, content, created_by, created_on, modified_by, modified_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                self.key(),
                self.article_id.to_string(),
                self.content.as_str(),
                self.audit.created_by.as_deref(),
                self.audit.created_on,
                self.audit.modified_by.as_deref(),
                self.audit.modified_on,
            ],
        )
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "UPDATE comments
             SET
                content = ?2,
                created_by = ?3,
                created_on = ?4,
                modified_by = ?5,
                modified_on = ?6
             WHERE id = ?1;",
            params![
                self.key(),
                self.content.as_str(),
                self.audit.created_by.as_deref(),
                self.audit.created_on,
                self.audit.modified_by.as_deref(),
                self.audit.modified_on,
            ],
        )
    }

    fn as_auditable(&self) -> Option<&dyn Auditable> {
        Some(self)
    }

    fn as_auditable_mut(&mut self) -> Option<&mut dyn Auditable> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Table configuration for [`Comment`]. Must be registered after articles.
pub struct CommentConfiguration;

impl ModelConfiguration for CommentConfiguration {
    fn name(&self) -> &'static str {
        COMMENT_TABLE
    }

    fn create_sql(&self) -> &'static str {
        "CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY NOT NULL,
            article_id TEXT NOT NULL REFERENCES articles (id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            created_by TEXT NULL,
            created_on INTEGER NOT NULL,
            modified_by TEXT NULL,
            modified_on INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_comments_article ON comments (article_id, created_on);"
    }
}
