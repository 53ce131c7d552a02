//! Article and comment use-case service.
//!
//! # Invariants
//! - Every public operation commits exactly once, or not at all on error.
//! - A failed operation leaves nothing pending; the entry it touched is
//!   detached and reloaded from storage on next access.
//! - Returned records reflect the committed audit stamps.

use crate::cancel::CancellationToken;
use crate::error::{StoreError, StoreResult};
use crate::model::article::{Article, ArticleId, ARTICLE_TABLE};
use crate::model::comment::{Comment, CommentId, COMMENT_TABLE};
use crate::store::BlogStore;
use crate::tracking::EntryKey;

/// Use-case wrapper owning one request-scoped store.
pub struct ArticleService {
    store: BlogStore,
}

impl ArticleService {
    pub fn new(store: BlogStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &BlogStore {
        &self.store
    }

    /// Creates and commits a new article.
    pub fn publish_article(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> StoreResult<Article> {
        let key = self.store.add(Article::new(title, content));
        self.commit_or_detach(key)?;
        self.article_at(key)
    }

    /// Replaces title and content of an existing article.
    pub fn edit_article(
        &mut self,
        id: ArticleId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> StoreResult<Article> {
        let key = self.require_article(id)?;
        if let Some(article) = self.store.get_mut::<Article>(key) {
            article.title = title.into();
            article.content = content.into();
        }
        self.commit_or_detach(key)?;
        self.article_at(key)
    }

    /// Adds a comment to an existing article.
    pub fn add_comment(
        &mut self,
        article_id: ArticleId,
        content: impl Into<String>,
    ) -> StoreResult<Comment> {
        self.require_article(article_id)?;
        let key = self.store.add(Comment::new(article_id, content));
        self.commit_or_detach(key)?;
        self.store
            .get::<Comment>(key)
            .cloned()
            .ok_or_else(|| not_tracked(COMMENT_TABLE, key))
    }

    pub fn delete_comment(&mut self, id: CommentId) -> StoreResult<()> {
        let key = self
            .store
            .find_comment(id)?
            .ok_or_else(|| StoreError::NotFound {
                table: COMMENT_TABLE,
                key: id.to_string(),
            })?;
        self.store.remove(key);
        self.commit_or_detach(key)?;
        Ok(())
    }

    pub fn get_article(&mut self, id: ArticleId) -> StoreResult<Option<Article>> {
        let key = self.store.find_article(id)?;
        Ok(key.and_then(|key| self.store.get::<Article>(key).cloned()))
    }

    /// Comments of one article, oldest first.
    pub fn list_comments(&mut self, article_id: ArticleId) -> StoreResult<Vec<Comment>> {
        let keys = self.store.comments_for_article(article_id)?;
        Ok(keys
            .into_iter()
            .filter_map(|key| self.store.get::<Comment>(key).cloned())
            .collect())
    }

    fn commit_or_detach(&mut self, key: EntryKey) -> StoreResult<usize> {
        match self.store.commit_blocking(&CancellationToken::new()) {
            Ok(affected) => Ok(affected),
            Err(err) => {
                self.store.detach(key);
                Err(err)
            }
        }
    }

    fn require_article(&mut self, id: ArticleId) -> StoreResult<EntryKey> {
        self.store
            .find_article(id)?
            .ok_or_else(|| StoreError::NotFound {
                table: ARTICLE_TABLE,
                key: id.to_string(),
            })
    }

    fn article_at(&self, key: EntryKey) -> StoreResult<Article> {
        self.store
            .get::<Article>(key)
            .cloned()
            .ok_or_else(|| not_tracked(ARTICLE_TABLE, key))
    }
}

fn not_tracked(table: &'static str, key: EntryKey) -> StoreError {
    StoreError::NotFound {
        table,
        key: format!("{key:?}"),
    }
}
