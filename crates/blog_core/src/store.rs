//! Blog unit of work with audit stamping.
//!
//! # Responsibility
//! - Wrap the identity store and register the blog tables through it.
//! - Run the audit interceptor exactly once per commit, right before the
//!   durable write.
//!
//! # Invariants
//! - `commit` is the only implementation; `commit_blocking` just drives it.
//! - The affected-row count is the base commit's count, unchanged.
//! - Stamps from a commit that fails are rolled back in memory too.
//!
//! # Concurrency
//! - One store per logical request. Every mutating API takes `&mut self`.

use crate::audit::{AuditInterceptor, Clock, CurrentActor};
use crate::cancel::CancellationToken;
use crate::db::ModelConfiguration;
use crate::error::{StoreError, StoreResult};
use crate::identity::IdentityStore;
use crate::model::article::{ArticleConfiguration, ArticleId, Article, ARTICLE_TABLE};
use crate::model::comment::{Comment, CommentConfiguration, CommentId, COMMENT_TABLE};
use crate::tracking::{ChangeTracker, Entity, EntityState, EntryKey};
use log::warn;
use rusqlite::Connection;
use std::sync::Arc;

/// Blog registration list, applied after the identity tables.
pub const BLOG_CONFIGURATIONS: &[&dyn ModelConfiguration] =
    &[&ArticleConfiguration, &CommentConfiguration];

/// Request-scoped store for articles, comments and identity users.
pub struct BlogStore {
    identity: IdentityStore,
    current_actor: Arc<dyn CurrentActor>,
    clock: Arc<dyn Clock>,
}

impl BlogStore {
    /// Creates a store over `conn` and registers identity and blog tables.
    pub fn new(
        conn: Connection,
        current_actor: Arc<dyn CurrentActor>,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        Self::with_configurations(conn, current_actor, clock, BLOG_CONFIGURATIONS)
    }

    /// Like [`BlogStore::new`] with an explicit application registration list.
    pub fn with_configurations(
        conn: Connection,
        current_actor: Arc<dyn CurrentActor>,
        clock: Arc<dyn Clock>,
        configurations: &[&dyn ModelConfiguration],
    ) -> StoreResult<Self> {
        Ok(Self {
            identity: IdentityStore::new(conn, configurations)?,
            current_actor,
            clock,
        })
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    pub fn identity_mut(&mut self) -> &mut IdentityStore {
        &mut self.identity
    }

    pub fn connection(&self) -> &Connection {
        self.identity.connection()
    }

    pub fn tracker(&self) -> &ChangeTracker {
        self.identity.tracker()
    }

    pub fn add<T: Entity>(&mut self, entity: T) -> EntryKey {
        self.identity.tracker_mut().add(entity)
    }

    pub fn attach<T: Entity>(&mut self, entity: T) -> EntryKey {
        self.identity.tracker_mut().attach(entity)
    }

    pub fn get<T: Entity>(&self, key: EntryKey) -> Option<&T> {
        self.identity.tracker().get(key)
    }

    /// Mutable access; marks an unchanged entity modified.
    pub fn get_mut<T: Entity>(&mut self, key: EntryKey) -> Option<&mut T> {
        self.identity.tracker_mut().get_mut(key)
    }

    pub fn remove(&mut self, key: EntryKey) -> bool {
        self.identity.tracker_mut().remove(key)
    }

    pub fn detach(&mut self, key: EntryKey) -> bool {
        self.identity.tracker_mut().detach(key)
    }

    pub fn state(&self, key: EntryKey) -> Option<EntityState> {
        self.identity.tracker().state(key)
    }

    pub fn find_article(&mut self, id: ArticleId) -> StoreResult<Option<EntryKey>> {
        let sql = format!("{} WHERE id = ?1;", Article::select_sql());
        self.identity
            .load_one(ARTICLE_TABLE, &id.to_string(), &sql, Article::from_row)
    }

    pub fn find_comment(&mut self, id: CommentId) -> StoreResult<Option<EntryKey>> {
        let sql = format!("{} WHERE id = ?1;", Comment::select_sql());
        self.identity
            .load_one(COMMENT_TABLE, &id.to_string(), &sql, Comment::from_row)
    }

    /// Loads comments of one article, oldest first.
    pub fn comments_for_article(&mut self, article_id: ArticleId) -> StoreResult<Vec<EntryKey>> {
        let sql = format!(
            "{} WHERE article_id = ?1 ORDER BY created_on ASC, id ASC;",
            Comment::select_sql()
        );
        self.identity
            .load_many(&sql, &article_id.to_string(), Comment::from_row)
    }

    /// Stamps provenance on pending auditable entities, then persists every
    /// pending change and returns the affected-row count.
    ///
    /// # Errors
    /// - `Provider` when the actor or clock provider fails; nothing written.
    /// - Any base commit error, unchanged, with in-memory stamps undone.
    pub async fn commit(&mut self, cancel: &CancellationToken) -> StoreResult<usize> {
        let snapshot = self.identity.tracker().snapshot_audit();
        {
            let mut changes = self.identity.tracker_mut().auditable_changes();
            AuditInterceptor::new(self.current_actor.as_ref(), self.clock.as_ref())
                .apply(&mut changes)?;
        }

        match self.identity.save_changes(cancel).await {
            Ok(affected) => Ok(affected),
            Err(err) => {
                warn!(
                    "event=store_commit module=store status=error error_code={} restored_audit_entries={}",
                    err.code(),
                    snapshot.len()
                );
                self.identity.tracker_mut().restore_audit(snapshot);
                Err(err)
            }
        }
    }

    /// Blocking form of [`BlogStore::commit`].
    ///
    /// Must not be called from inside an async runtime.
    pub fn commit_blocking(&mut self, cancel: &CancellationToken) -> StoreResult<usize> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(StoreError::Runtime)?;
        runtime.block_on(self.commit(cancel))
    }
}
