//! Comment service - creation, deletion, and thread reads.
//!
//! Counter movements ride in the same transaction as the comment row
//! change: a created comment and its post's comment_count bump commit
//! together, as do a tombstone and its decrements.

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::comment_repo;
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentNode, DELETED_COMMENT_BODY};
use crate::services::counters::CounterService;
use crate::services::threads::{self, CommentSort};

#[derive(Clone)]
pub struct CommentService {
    pool: PgPool,
    counters: CounterService,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        let counters = CounterService::new(pool.clone());
        Self { pool, counters }
    }

    /// Create a comment, bumping the post's comment count and, for a
    /// reply, the parent's reply count in the same transaction.
    pub async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        author_name: Option<&str>,
        content: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Comment> {
        let mut tx = self.pool.begin().await?;

        let post_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
                .bind(post_id)
                .fetch_one(&mut *tx)
                .await?;
        if !post_exists {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        if let Some(parent_id) = parent_id {
            // Replying to a tombstone is allowed; the deleted parent still
            // anchors its replies. The parent only has to exist and belong
            // to the same post.
            let parent_post: Option<Uuid> =
                sqlx::query_scalar("SELECT post_id FROM comments WHERE id = $1")
                    .bind(parent_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            match parent_post {
                None => return Err(AppError::NotFound("Parent comment not found".to_string())),
                Some(parent_post_id) if parent_post_id != post_id => {
                    return Err(AppError::BadRequest(
                        "Parent comment belongs to a different post".to_string(),
                    ));
                }
                Some(_) => {}
            }
        }

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, author_id, author_name, content, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, post_id, author_id, author_name, content, parent_id,
                      upvotes, downvotes, reply_count, is_deleted, created_at, updated_at
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(author_name)
        .bind(content)
        .bind(parent_id)
        .fetch_one(&mut *tx)
        .await?;

        self.counters
            .increment_comment_count(&mut tx, post_id, 1)
            .await?;

        if let Some(parent_id) = parent_id {
            self.counters
                .increment_reply_count(&mut tx, parent_id, 1)
                .await?;
        }

        tx.commit().await?;

        Ok(comment)
    }

    /// Soft delete a comment. The row stays behind as a tombstone with its
    /// body replaced, so existing replies keep their anchor; the counters
    /// the comment contributed to are decremented in the same transaction.
    /// Only the author may delete.
    pub async fn delete_comment(&self, comment_id: Uuid, user_id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, author_id, author_name, content, parent_id,
                   upvotes, downvotes, reply_count, is_deleted, created_at, updated_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        if comment.author_id != user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }

        // Guarded by is_deleted so a racing double-delete cannot decrement
        // the counters twice.
        let result = sqlx::query(
            r#"
            UPDATE comments
            SET is_deleted = TRUE, content = $2, updated_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(comment_id)
        .bind(DELETED_COMMENT_BODY)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        self.counters
            .increment_comment_count(&mut tx, comment.post_id, -1)
            .await?;

        if let Some(parent_id) = comment.parent_id {
            self.counters
                .increment_reply_count(&mut tx, parent_id, -1)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// The full thread for a post: top-level nodes under the requested
    /// sort, replies chronological, tombstones included.
    pub async fn get_thread(&self, post_id: Uuid, sort: CommentSort) -> Result<Vec<CommentNode>> {
        let post_exists = crate::db::post_repo::post_exists(&self.pool, post_id).await?;
        if !post_exists {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let comments = comment_repo::list_post_comments(&self.pool, post_id).await?;

        Ok(threads::build_threads(comments, sort))
    }
}
