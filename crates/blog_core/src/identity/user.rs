//! Identity user entity.

use crate::db::ModelConfiguration;
use crate::model::audit::ActorId;
use crate::model::{require_text, ValidationError};
use crate::tracking::Entity;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::any::Any;

pub(crate) const USER_TABLE: &str = "users";

/// Registered principal. Its `id` is the actor identity stamped on content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: ActorId,
    pub user_name: String,
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<ActorId>, user_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_name: user_name.into(),
            email: None,
        }
    }

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_name: row.get("user_name")?,
            email: row.get("email")?,
        })
    }
}

impl Entity for User {
    fn table(&self) -> &'static str {
        USER_TABLE
    }

    fn key(&self) -> String {
        self.id.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text("user", "id", &self.id)?;
        require_text("user", "user_name", &self.user_name)
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO users (id, user_name, normalized_user_name, email)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                self.id.as_str(),
                self.user_name.as_str(),
                self.user_name.to_lowercase(),
                self.email.as_deref(),
            ],
        )
    }

    fn update(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "UPDATE users
             SET user_name = ?2, normalized_user_name = ?3, email = ?4
             WHERE id = ?1;",
            params![
                self.id.as_str(),
                self.user_name.as_str(),
                self.user_name.to_lowercase(),
                self.email.as_deref(),
            ],
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Table configuration for [`User`].
pub struct UserConfiguration;

impl ModelConfiguration for UserConfiguration {
    fn name(&self) -> &'static str {
        USER_TABLE
    }

    fn create_sql(&self) -> &'static str {
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY NOT NULL,
            user_name TEXT NOT NULL,
            normalized_user_name TEXT NOT NULL UNIQUE,
            email TEXT NULL
        );"
    }
}
