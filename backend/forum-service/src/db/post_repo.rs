use crate::models::Post;
use sqlx::PgPool;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, author_id, author_name, title, content, content_type, topic_slug, \
     slug, status, is_ai_generated, upvotes, downvotes, comment_count, views, created_at, updated_at";

/// Get a single post by ID
pub async fn find_post_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    let post = sqlx::query_as::<_, Post>(&format!(
        r#"
        SELECT {POST_COLUMNS}
        FROM posts
        WHERE id = $1
        "#,
    ))
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    Ok(post)
}

/// Check if a post exists
pub async fn post_exists(pool: &PgPool, post_id: Uuid) -> Result<bool, sqlx::Error> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM posts
            WHERE id = $1
        )
        "#,
    )
    .bind(post_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Fetch the published snapshot the feed ranks over, optionally filtered by
/// topic and content type. Ordered newest-first so the in-memory ranking
/// always starts from the same sequence for a given data set.
pub async fn list_published(
    pool: &PgPool,
    topic_slug: Option<&str>,
    content_type: Option<&str>,
    limit: i64,
) -> Result<Vec<Post>, sqlx::Error> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        r#"
        SELECT {POST_COLUMNS}
        FROM posts
        WHERE status = 'published'
          AND ($1::text IS NULL OR topic_slug = $1)
          AND ($2::text IS NULL OR content_type = $2)
        ORDER BY created_at DESC, id
        LIMIT $3
        "#,
    ))
    .bind(topic_slug)
    .bind(content_type)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

/// Count published posts matching the feed filters
pub async fn count_published(
    pool: &PgPool,
    topic_slug: Option<&str>,
    content_type: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM posts
        WHERE status = 'published'
          AND ($1::text IS NULL OR topic_slug = $1)
          AND ($2::text IS NULL OR content_type = $2)
        "#,
    )
    .bind(topic_slug)
    .bind(content_type)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
