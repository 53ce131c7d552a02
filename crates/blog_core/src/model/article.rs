//! Article entity and its table configuration.

use crate::db::ModelConfiguration;
use crate::model::audit::{Auditable, AuditFields, AUDIT_COLUMNS_SQL};
use crate::model::{parse_uuid_column, require_text, ValidationError};
use crate::tracking::Entity;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::any::Any;
use uuid::Uuid;

pub type ArticleId = Uuid;

pub(crate) const ARTICLE_TABLE: &str = "articles";

/// Published blog article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    /// Markdown body.
    pub content: String,
    pub audit: AuditFields,
}

impl Article {
    /// Creates an unsaved article with a generated id and empty provenance.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, content)
    }

    pub fn with_id(id: ArticleId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            audit: AuditFields::default(),
        }
    }

    pub(crate) fn select_sql() -> String {
        format!("SELECT id, title, content, {AUDIT_COLUMNS_SQL} FROM {ARTICLE_TABLE}")
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_uuid_column(row, "id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            audit: AuditFields::from_row(row)?,
        })
    }
}

impl Auditable for Article {
    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl Entity for Article {
    fn table(&self) -> &'static str {
        ARTICLE_TABLE
    }

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("article", "title", &self.title)?;
        require_text("article", "content", &self.content)
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO articles (
                id, title, content, created_by, created_on, modified_by, modified_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                self.key(),
                self.title.as_str(),
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
            "UPDATE articles
             SET
                title = ?2,
                content = ?3,
                created_by = ?4,
                created_on = ?5,
                modified_by = ?6,
                modified_on = ?7
             WHERE id = ?1;",
            params![
                self.key(),
                self.title.as_str(),
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

/// Table configuration for [`Article`].
pub struct ArticleConfiguration;

impl ModelConfiguration for ArticleConfiguration {
    fn name(&self) -> &'static str {
        ARTICLE_TABLE
    }

    fn create_sql(&self) -> &'static str {
        "CREATE TABLE IF NOT EXISTS articles (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            created_by TEXT NULL,
            created_on INTEGER NOT NULL,
            modified_by TEXT NULL,
            modified_on INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_articles_created_on ON articles (created_on DESC);"
    }
}
