//! Integration tests: ranking and thread assembly
//!
//! Exercises the pure read path end to end over constructed snapshots:
//! rank a post snapshot under every algorithm, page through it the way the
//! feed service does, and assemble comment threads. No database required.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use forum_service::config::RankingConfig;
use forum_service::models::{Comment, Pagination, Post};
use forum_service::services::ranking::{FeedAlgorithm, RankingEngine};
use forum_service::services::threads::{build_threads, CommentSort};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn post(name: &str, upvotes: i64, downvotes: i64, comments: i64, views: i64, age_secs: i64) -> Post {
    Post {
        id: Uuid::new_v4(),
        author_id: None,
        author_name: None,
        title: name.to_string(),
        content: format!("body of {name}"),
        content_type: "opinion".to_string(),
        topic_slug: Some("general".to_string()),
        slug: format!("{name}-{}", Uuid::new_v4()),
        status: "published".to_string(),
        is_ai_generated: false,
        upvotes,
        downvotes,
        comment_count: comments,
        views,
        created_at: now() - Duration::seconds(age_secs),
        updated_at: now(),
    }
}

fn comment(byte: u8, parent: Option<Uuid>, upvotes: i64, downvotes: i64, offset: i64) -> Comment {
    Comment {
        id: Uuid::from_bytes([byte; 16]),
        post_id: Uuid::from_bytes([0xFE; 16]),
        author_id: Uuid::from_bytes([0xCD; 16]),
        author_name: None,
        content: "body".to_string(),
        parent_id: parent,
        upvotes,
        downvotes,
        reply_count: 0,
        is_deleted: false,
        created_at: now() + Duration::seconds(offset),
        updated_at: now() + Duration::seconds(offset),
    }
}

/// Paginate the way the feed service slices a ranked snapshot.
fn page_of(ranked: &[Post], page: i64, page_size: i64) -> (Vec<Uuid>, Pagination) {
    let pagination = Pagination::new(page, page_size, ranked.len() as i64);
    let ids = ranked
        .iter()
        .skip(((page - 1) * page_size) as usize)
        .take(page_size as usize)
        .map(|p| p.id)
        .collect();
    (ids, pagination)
}

#[test]
fn pagination_over_a_ranked_snapshot_is_stable_and_complete() {
    let engine = RankingEngine::new(RankingConfig::default());
    let posts: Vec<Post> = (0..47)
        .map(|i| {
            post(
                &format!("p{i}"),
                (i * 13) % 29,
                (i * 7) % 11,
                (i * 3) % 17,
                i * 10,
                (i * 333) % 86_000,
            )
        })
        .collect();

    let ranked = engine.rank(posts.clone(), FeedAlgorithm::Hot, now());
    let ranked_again = engine.rank(posts, FeedAlgorithm::Hot, now());

    // Two rankings of the same snapshot agree, so pages drawn from either
    // never overlap or skip items.
    let mut seen = Vec::new();
    let (_, pagination) = page_of(&ranked, 1, 10);
    for page in 1..=pagination.total_pages {
        let (ids, _) = page_of(&ranked_again, page, 10);
        seen.extend(ids);
    }
    let expected: Vec<Uuid> = ranked.iter().map(|p| p.id).collect();
    assert_eq!(seen, expected);
    assert_eq!(pagination.total, ranked.len() as i64);
    assert_eq!(pagination.total_pages, 5);
}

#[test]
fn each_algorithm_orders_the_shared_fixture_correctly() {
    let engine = RankingEngine::new(RankingConfig::default());

    let fresh_balanced = post("fresh_balanced", 6, 6, 1, 10, 600);
    let fresh_popular = post("fresh_popular", 30, 1, 2, 500, 1_200);
    let old_top = post("old_top", 40, 2, 8, 900, 3 * 86_400);
    let stale = post("stale", 90, 0, 50, 9_000, 10 * 86_400);
    let snapshot = vec![
        fresh_balanced.clone(),
        fresh_popular.clone(),
        old_top.clone(),
        stale.clone(),
    ];

    let titles = |algorithm: FeedAlgorithm| -> Vec<String> {
        engine
            .rank(snapshot.clone(), algorithm, now())
            .into_iter()
            .map(|p| p.title)
            .collect()
    };

    // newest: pure recency, stale item included.
    assert_eq!(
        titles(FeedAlgorithm::Newest),
        vec!["fresh_balanced", "fresh_popular", "old_top", "stale"]
    );

    // popular: raw upvotes, no window.
    assert_eq!(
        titles(FeedAlgorithm::Popular),
        vec!["stale", "old_top", "fresh_popular", "fresh_balanced"]
    );

    // trending: only the two posts inside 24h, by upvotes.
    assert_eq!(
        titles(FeedAlgorithm::Trending),
        vec!["fresh_popular", "fresh_balanced"]
    );

    // hot: stale falls outside the 7-day window; the decay term sinks
    // old_top to the bottom and costs fresh_popular (20 min old) enough
    // that fresh_balanced (10 min old) edges past it.
    assert_eq!(
        titles(FeedAlgorithm::Hot),
        vec!["fresh_balanced", "fresh_popular", "old_top"]
    );

    // controversial: the evenly split post wins.
    assert_eq!(
        titles(FeedAlgorithm::Controversial)[0],
        "fresh_balanced".to_string()
    );
}

#[test]
fn thread_assembly_matches_the_feed_sorts() {
    let a = comment(1, None, 9, 1, 0);
    let b = comment(2, None, 4, 4, 5);
    let c = comment(3, Some(a.id), 0, 0, 60);
    let d = comment(4, Some(a.id), 2, 0, 30);
    let nested = comment(5, Some(c.id), 0, 0, 90);

    let flat = vec![a.clone(), b.clone(), c.clone(), d.clone(), nested.clone()];

    let best = build_threads(flat.clone(), CommentSort::Best);
    assert_eq!(best.len(), 2);
    assert_eq!(best[0].comment.id, a.id);
    // Replies chronological, nested reply flattened under A.
    let reply_ids: Vec<Uuid> = best[0].replies.iter().map(|r| r.comment.id).collect();
    assert_eq!(reply_ids, vec![d.id, c.id, nested.id]);

    let controversial = build_threads(flat, CommentSort::Controversial);
    assert_eq!(controversial[0].comment.id, b.id);
}
