//! Comment service providing a simplified API for comment operations.

use common::{ArticleId, CommentId, UserId};
use store::SoftDeleteStore;

use crate::error::DomainError;

use super::Comment;

/// Service for managing comments.
///
/// Plain single-aggregate CRUD. Cascading deletion of comments is handled by
/// the cascade participant in the saga crate, not here.
pub struct CommentService<S: SoftDeleteStore<Comment>> {
    store: S,
}

impl<S: SoftDeleteStore<Comment>> CommentService<S> {
    /// Creates a new comment service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Posts a new comment.
    #[tracing::instrument(skip(self, content))]
    pub async fn create_comment(
        &self,
        user_id: UserId,
        article_id: ArticleId,
        content: String,
    ) -> Result<Comment, DomainError> {
        let comment = self
            .store
            .create(Comment::new(user_id, article_id, content))
            .await?;
        tracing::info!(comment_id = %comment.id(), "comment created");
        Ok(comment)
    }

    /// Loads an active comment by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_comment(&self, comment_id: CommentId) -> Result<Comment, DomainError> {
        Ok(self.store.get_by_id(comment_id).await?)
    }

    /// Lists the active comments of an article, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn comments_for_article(
        &self,
        article_id: ArticleId,
    ) -> Result<Vec<Comment>, DomainError> {
        Ok(self.store.find_by_article_id(article_id).await?)
    }

    /// Replaces the content of a comment owned by `user_id`.
    #[tracing::instrument(skip(self, content))]
    pub async fn update_content(
        &self,
        comment_id: CommentId,
        user_id: UserId,
        content: String,
    ) -> Result<Comment, DomainError> {
        let comment = self.owned_comment(comment_id, user_id).await?;
        Ok(self.store.update(comment.with_content(content)).await?)
    }

    /// Soft-deletes a comment owned by `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn delete_comment(
        &self,
        comment_id: CommentId,
        user_id: UserId,
    ) -> Result<(), DomainError> {
        self.owned_comment(comment_id, user_id).await?;
        self.store.delete_by_id(comment_id).await?;
        tracing::info!(%comment_id, "comment deleted");
        Ok(())
    }

    async fn owned_comment(
        &self,
        comment_id: CommentId,
        user_id: UserId,
    ) -> Result<Comment, DomainError> {
        let comment = self.store.get_by_id(comment_id).await?;
        if comment.user_id() != user_id {
            return Err(DomainError::NotOwner {
                comment_id,
                user_id,
            });
        }
        Ok(comment)
    }
}
