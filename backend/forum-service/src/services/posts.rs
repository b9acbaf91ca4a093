/// Post reads for the single-post page.
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::post_repo;
use crate::error::Result;
use crate::models::Post;
use crate::services::counters::CounterService;

pub struct PostService {
    pool: PgPool,
    counters: CounterService,
}

impl PostService {
    pub fn new(pool: PgPool) -> Self {
        let counters = CounterService::new(pool.clone());
        Self { pool, counters }
    }

    /// Get a post by ID, bumping its view counter. The returned snapshot
    /// predates the bump, matching what the reader was actually served. A
    /// failed bump degrades to a log line rather than failing the read.
    pub async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        let post = post_repo::find_post_by_id(&self.pool, post_id).await?;

        if post.is_some() {
            if let Err(err) = self.counters.increment_view_count(post_id).await {
                tracing::warn!(%post_id, "View counter bump failed: {}", err);
            }
        }

        Ok(post)
    }
}
