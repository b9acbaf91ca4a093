use crate::models::Comment;
use sqlx::PgPool;
use uuid::Uuid;

const COMMENT_COLUMNS: &str = "id, post_id, author_id, author_name, content, parent_id, \
     upvotes, downvotes, reply_count, is_deleted, created_at, updated_at";

/// Get a single comment by ID (tombstones included)
pub async fn find_comment_by_id(
    pool: &PgPool,
    comment_id: Uuid,
) -> Result<Option<Comment>, sqlx::Error> {
    let comment = sqlx::query_as::<_, Comment>(&format!(
        r#"
        SELECT {COMMENT_COLUMNS}
        FROM comments
        WHERE id = $1
        "#,
    ))
    .bind(comment_id)
    .fetch_optional(pool)
    .await?;

    Ok(comment)
}

/// Check if a comment exists
pub async fn comment_exists(pool: &PgPool, comment_id: Uuid) -> Result<bool, sqlx::Error> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM comments
            WHERE id = $1
        )
        "#,
    )
    .bind(comment_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Fetch every comment on a post, tombstones included, in chronological
/// order. Deleted comments stay in the result so their replies keep a
/// parent to hang from; thread assembly happens in memory afterwards.
pub async fn list_post_comments(
    pool: &PgPool,
    post_id: Uuid,
) -> Result<Vec<Comment>, sqlx::Error> {
    let comments = sqlx::query_as::<_, Comment>(&format!(
        r#"
        SELECT {COMMENT_COLUMNS}
        FROM comments
        WHERE post_id = $1
        ORDER BY created_at ASC, id
        "#,
    ))
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}
