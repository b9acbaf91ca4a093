//! Feed reads: snapshot, rank, paginate.
//!
//! The store hands back a bounded snapshot of published posts; ranking is
//! a pure in-memory pass over it, so a failed read never produces a
//! partially ordered page - it either ranks fully or errors.

use std::time::Instant;

use chrono::Utc;
use sqlx::PgPool;

use crate::config::RankingConfig;
use crate::db::post_repo;
use crate::error::Result;
use crate::metrics::feed::{FEED_REQUEST_DURATION_SECONDS, FEED_REQUEST_TOTAL, FEED_SNAPSHOT_SIZE};
use crate::models::{Pagination, Post};
use crate::services::ranking::{FeedAlgorithm, RankingEngine};

/// Validated feed query.
#[derive(Debug, Clone)]
pub struct FeedQuery {
    pub algorithm: FeedAlgorithm,
    pub topic_slug: Option<String>,
    pub content_type: Option<String>,
    pub page: i64,
    pub page_size: i64,
}

/// One ranked feed page plus its pagination envelope.
#[derive(Debug, serde::Serialize)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}

pub struct FeedService {
    pool: PgPool,
    ranking: RankingEngine,
    max_candidates: i64,
}

impl FeedService {
    pub fn new(pool: PgPool, config: RankingConfig) -> Self {
        let max_candidates = config.max_candidates.max(1);
        Self {
            pool,
            ranking: RankingEngine::new(config),
            max_candidates,
        }
    }

    pub async fn get_feed(&self, query: &FeedQuery) -> Result<FeedPage> {
        let start = Instant::now();
        let algorithm = query.algorithm;

        let snapshot = post_repo::list_published(
            &self.pool,
            query.topic_slug.as_deref(),
            query.content_type.as_deref(),
            self.max_candidates,
        )
        .await?;

        if snapshot.len() as i64 == self.max_candidates {
            let matching = post_repo::count_published(
                &self.pool,
                query.topic_slug.as_deref(),
                query.content_type.as_deref(),
            )
            .await?;
            if matching > self.max_candidates {
                tracing::warn!(
                    matching,
                    max_candidates = self.max_candidates,
                    algorithm = algorithm.as_str(),
                    "Feed snapshot truncated; oldest posts not considered"
                );
            }
        }

        FEED_SNAPSHOT_SIZE
            .with_label_values(&[algorithm.as_str()])
            .observe(snapshot.len() as f64);

        let ranked = self.ranking.rank(snapshot, algorithm, Utc::now());

        let total = ranked.len() as i64;
        let pagination = Pagination::new(query.page, query.page_size, total);

        let offset = ((query.page - 1) * query.page_size).max(0) as usize;
        let posts: Vec<Post> = ranked
            .into_iter()
            .skip(offset)
            .take(query.page_size.max(0) as usize)
            .collect();

        FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&[algorithm.as_str()])
            .observe(start.elapsed().as_secs_f64());
        FEED_REQUEST_TOTAL
            .with_label_values(&[algorithm.as_str()])
            .inc();

        Ok(FeedPage { posts, pagination })
    }
}
