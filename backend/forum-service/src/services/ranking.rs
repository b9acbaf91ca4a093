//! Feed ranking.
//!
//! Every algorithm is a pure, deterministic reordering of an in-memory
//! snapshot: no store access, no randomness, no hidden state. That is what
//! keeps repeated page requests over the same data consistent with each
//! other. Residual ties always break by `created_at` descending.

use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;

use crate::config::RankingConfig;
use crate::error::{AppError, Result};
use crate::models::Post;

/// Closed set of feed sort algorithms. Parsing is the only way in; an
/// unrecognized name is a validation error rather than a silent fallback
/// to `newest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedAlgorithm {
    Newest,
    Popular,
    Top,
    Trending,
    Hot,
    Controversial,
}

impl FeedAlgorithm {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "newest" => Ok(FeedAlgorithm::Newest),
            "popular" => Ok(FeedAlgorithm::Popular),
            "top" => Ok(FeedAlgorithm::Top),
            "trending" => Ok(FeedAlgorithm::Trending),
            "hot" => Ok(FeedAlgorithm::Hot),
            "controversial" => Ok(FeedAlgorithm::Controversial),
            other => Err(AppError::ValidationError(format!(
                "Unknown sort algorithm '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedAlgorithm::Newest => "newest",
            FeedAlgorithm::Popular => "popular",
            FeedAlgorithm::Top => "top",
            FeedAlgorithm::Trending => "trending",
            FeedAlgorithm::Hot => "hot",
            FeedAlgorithm::Controversial => "controversial",
        }
    }
}

/// Engagement-balance weight shared by the post and comment `controversial`
/// sorts: total engagement minus one-sidedness. A 5/5 item scores 10, a
/// 10/0 item scores 0.
pub fn controversy_weight(upvotes: i64, downvotes: i64) -> i64 {
    (upvotes + downvotes) - (upvotes - downvotes).abs()
}

/// Descending comparison for float weights. NaN cannot come out of the
/// weight formulas for finite counters, but a poisoned value must not
/// panic the sort either.
pub(crate) fn compare_weight_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub struct RankingEngine {
    config: RankingConfig,
}

impl RankingEngine {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    /// Order a post snapshot under the given algorithm.
    ///
    /// `trending` and `hot` first restrict the snapshot to their time
    /// window (inclusive at the boundary), measured against the `now` the
    /// caller supplies, so a whole paginated read can share one cutoff.
    pub fn rank(&self, mut posts: Vec<Post>, algorithm: FeedAlgorithm, now: DateTime<Utc>) -> Vec<Post> {
        match algorithm {
            FeedAlgorithm::Newest => {
                posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
            FeedAlgorithm::Popular => {
                posts.sort_by(|a, b| {
                    b.upvotes
                        .cmp(&a.upvotes)
                        .then_with(|| b.created_at.cmp(&a.created_at))
                });
            }
            FeedAlgorithm::Top => {
                posts.sort_by(|a, b| {
                    b.score()
                        .cmp(&a.score())
                        .then_with(|| b.created_at.cmp(&a.created_at))
                });
            }
            FeedAlgorithm::Trending => {
                let window = Duration::hours(self.config.trending_window_hours);
                posts.retain(|p| within_window(p.created_at, now, window));
                posts.sort_by(|a, b| {
                    b.upvotes
                        .cmp(&a.upvotes)
                        .then_with(|| b.comment_count.cmp(&a.comment_count))
                        .then_with(|| b.views.cmp(&a.views))
                        .then_with(|| b.created_at.cmp(&a.created_at))
                });
            }
            FeedAlgorithm::Hot => {
                let window = Duration::hours(self.config.hot_window_hours);
                posts.retain(|p| within_window(p.created_at, now, window));
                posts.sort_by(|a, b| {
                    compare_weight_desc(self.hot_weight(a, now), self.hot_weight(b, now))
                        .then_with(|| b.created_at.cmp(&a.created_at))
                });
            }
            FeedAlgorithm::Controversial => {
                posts.sort_by(|a, b| {
                    controversy_weight(b.upvotes, b.downvotes)
                        .cmp(&controversy_weight(a.upvotes, a.downvotes))
                        .then_with(|| b.created_at.cmp(&a.created_at))
                });
            }
        }

        posts
    }

    /// Engagement weight with linear time decay: older posts need
    /// proportionally more engagement to outrank newer ones.
    pub fn hot_weight(&self, post: &Post, now: DateTime<Utc>) -> f64 {
        let age_ms = now.signed_duration_since(post.created_at).num_milliseconds() as f64;

        self.config.hot_upvote_weight * post.upvotes as f64
            + self.config.hot_comment_weight * post.comment_count as f64
            - self.config.hot_decay_per_ms * age_ms
    }
}

fn within_window(created_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(created_at) <= window
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn post(upvotes: i64, downvotes: i64, comment_count: i64, views: i64, age_secs: i64) -> Post {
        let now = test_now();
        Post {
            id: Uuid::new_v4(),
            author_id: None,
            author_name: None,
            title: "t".to_string(),
            content: "c".to_string(),
            content_type: "opinion".to_string(),
            topic_slug: None,
            slug: format!("t-{}", Uuid::new_v4()),
            status: "published".to_string(),
            is_ai_generated: true,
            upvotes,
            downvotes,
            comment_count,
            views,
            created_at: now - Duration::seconds(age_secs),
            updated_at: now,
        }
    }

    fn test_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn engine() -> RankingEngine {
        RankingEngine::new(RankingConfig::default())
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        assert!(FeedAlgorithm::parse("hot").is_ok());
        let err = FeedAlgorithm::parse("bestest").unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn newest_orders_by_created_at_desc() {
        let old = post(100, 0, 0, 0, 3_600);
        let fresh = post(0, 0, 0, 0, 60);
        let ranked = engine().rank(vec![old.clone(), fresh.clone()], FeedAlgorithm::Newest, test_now());
        assert_eq!(ranked[0].id, fresh.id);
        assert_eq!(ranked[1].id, old.id);
    }

    #[test]
    fn popular_breaks_upvote_ties_by_recency() {
        let older = post(10, 0, 0, 0, 3_600);
        let newer = post(10, 0, 0, 0, 60);
        let winner = post(11, 0, 0, 0, 7_200);
        let ranked = engine().rank(
            vec![older.clone(), winner.clone(), newer.clone()],
            FeedAlgorithm::Popular,
            test_now(),
        );
        assert_eq!(ranked[0].id, winner.id);
        assert_eq!(ranked[1].id, newer.id);
        assert_eq!(ranked[2].id, older.id);
    }

    #[test]
    fn top_uses_net_score_not_raw_upvotes() {
        let loved_and_hated = post(50, 45, 0, 0, 60);
        let quietly_liked = post(10, 0, 0, 0, 60);
        let ranked = engine().rank(
            vec![loved_and_hated.clone(), quietly_liked.clone()],
            FeedAlgorithm::Top,
            test_now(),
        );
        assert_eq!(ranked[0].id, quietly_liked.id);
        assert_eq!(ranked[0].score(), 10);
        assert_eq!(ranked[1].score(), 5);
    }

    #[test]
    fn trending_window_excludes_posts_older_than_24_hours() {
        let inside = post(5, 0, 0, 0, 24 * 3_600 - 1);
        let outside = post(500, 0, 100, 1_000, 24 * 3_600 + 1);
        let ranked = engine().rank(
            vec![inside.clone(), outside],
            FeedAlgorithm::Trending,
            test_now(),
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, inside.id);
    }

    #[test]
    fn trending_orders_by_upvotes_then_comments_then_views() {
        let a = post(10, 0, 5, 100, 60);
        let b = post(10, 0, 5, 200, 60);
        let c = post(10, 0, 9, 0, 60);
        let d = post(11, 0, 0, 0, 60);
        let ranked = engine().rank(
            vec![a.clone(), b.clone(), c.clone(), d.clone()],
            FeedAlgorithm::Trending,
            test_now(),
        );
        let ids: Vec<_> = ranked.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![d.id, c.id, b.id, a.id]);
    }

    #[test]
    fn hot_window_boundary_is_seven_days() {
        let just_inside = post(1, 0, 0, 0, 7 * 24 * 3_600 - 1);
        let just_outside = post(1_000, 0, 1_000, 0, 7 * 24 * 3_600 + 1);
        let ranked = engine().rank(
            vec![just_inside.clone(), just_outside],
            FeedAlgorithm::Hot,
            test_now(),
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, just_inside.id);
    }

    #[test]
    fn hot_decay_lets_engagement_overcome_age() {
        // One day of decay costs 0.0001 * 86_400_000 = 8_640 weight; an
        // older post needs that much extra engagement to stay on top.
        let fresh_modest = post(10, 0, 0, 0, 60);
        let old_huge = post(10_000, 0, 0, 0, 24 * 3_600);
        let old_modest = post(11, 0, 0, 0, 24 * 3_600);
        let ranked = engine().rank(
            vec![fresh_modest.clone(), old_huge.clone(), old_modest.clone()],
            FeedAlgorithm::Hot,
            test_now(),
        );
        assert_eq!(ranked[0].id, old_huge.id);
        assert_eq!(ranked[1].id, fresh_modest.id);
        assert_eq!(ranked[2].id, old_modest.id);
    }

    #[test]
    fn controversial_prefers_balance_over_volume() {
        let unanimous = post(10, 0, 0, 0, 60);
        let split = post(5, 5, 0, 0, 60);
        assert_eq!(controversy_weight(unanimous.upvotes, unanimous.downvotes), 0);
        assert_eq!(controversy_weight(split.upvotes, split.downvotes), 10);

        let ranked = engine().rank(
            vec![unanimous.clone(), split.clone()],
            FeedAlgorithm::Controversial,
            test_now(),
        );
        assert_eq!(ranked[0].id, split.id);
        assert_eq!(ranked[1].id, unanimous.id);
    }

    #[test]
    fn ranking_is_deterministic_across_calls() {
        let posts: Vec<Post> = (0..50)
            .map(|i| post(i % 7, i % 3, i % 5, i % 11, (i * 97) % 86_400))
            .collect();
        let now = test_now();

        for algorithm in [
            FeedAlgorithm::Newest,
            FeedAlgorithm::Popular,
            FeedAlgorithm::Top,
            FeedAlgorithm::Trending,
            FeedAlgorithm::Hot,
            FeedAlgorithm::Controversial,
        ] {
            let first: Vec<_> = engine()
                .rank(posts.clone(), algorithm, now)
                .iter()
                .map(|p| p.id)
                .collect();
            let second: Vec<_> = engine()
                .rank(posts.clone(), algorithm, now)
                .iter()
                .map(|p| p.id)
                .collect();
            assert_eq!(first, second, "{} must be stable", algorithm.as_str());
        }
    }
}
