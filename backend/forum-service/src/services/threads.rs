//! Comment thread assembly.
//!
//! Takes the flat comment rows for a post and produces the rendered tree:
//! top-level comments ordered by the requested sort, each carrying its
//! replies in chronological order. Reply chains deeper than one level are
//! flattened under the top-level ancestor, and deleted comments stay in
//! the tree as tombstones so their replies keep an anchor.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Comment, CommentNode};
use crate::services::ranking::controversy_weight;

/// Closed set of thread sort orders. `best` is the engagement sort
/// (upvote-weighted with recency tie-break); `top` is pure net score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSort {
    Best,
    Top,
    New,
    Old,
    Controversial,
}

impl CommentSort {
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "best" => Ok(CommentSort::Best),
            "top" => Ok(CommentSort::Top),
            "new" => Ok(CommentSort::New),
            "old" => Ok(CommentSort::Old),
            "controversial" => Ok(CommentSort::Controversial),
            other => Err(AppError::ValidationError(format!(
                "Unknown comment sort '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommentSort::Best => "best",
            CommentSort::Top => "top",
            CommentSort::New => "new",
            CommentSort::Old => "old",
            CommentSort::Controversial => "controversial",
        }
    }
}

/// Assemble the thread view from flat comment rows.
///
/// Replies are grouped under their nearest top-level ancestor. A reply
/// whose ancestor chain never reaches a known comment (orphaned by data
/// loss) is dropped rather than misfiled.
pub fn build_threads(comments: Vec<Comment>, sort: CommentSort) -> Vec<CommentNode> {
    let top_level_ids: HashSet<Uuid> = comments
        .iter()
        .filter(|c| c.parent_id.is_none())
        .map(|c| c.id)
        .collect();
    let parent_of: HashMap<Uuid, Option<Uuid>> =
        comments.iter().map(|c| (c.id, c.parent_id)).collect();

    let mut top_level: Vec<Comment> = Vec::new();
    let mut replies_by_root: HashMap<Uuid, Vec<Comment>> = HashMap::new();

    for comment in comments {
        match comment.parent_id {
            None => top_level.push(comment),
            Some(parent_id) => {
                if let Some(root) = resolve_root(parent_id, &parent_of, &top_level_ids) {
                    replies_by_root.entry(root).or_default().push(comment);
                } else {
                    tracing::warn!(
                        comment_id = %comment.id,
                        parent_id = %parent_id,
                        "Dropping reply with unresolvable ancestor chain"
                    );
                }
            }
        }
    }

    sort_top_level(&mut top_level, sort);

    top_level
        .into_iter()
        .map(|comment| {
            let mut replies = replies_by_root.remove(&comment.id).unwrap_or_default();
            // Replies are always chronological, regardless of the
            // top-level sort.
            replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));

            let mut node = CommentNode::new(comment);
            node.replies = replies.into_iter().map(CommentNode::new).collect();
            node
        })
        .collect()
}

/// Walk the parent chain up to the top-level ancestor. Bounded by the map
/// size so a corrupted parent cycle terminates instead of spinning.
fn resolve_root(
    start: Uuid,
    parent_of: &HashMap<Uuid, Option<Uuid>>,
    top_level_ids: &HashSet<Uuid>,
) -> Option<Uuid> {
    let mut current = start;
    for _ in 0..=parent_of.len() {
        if top_level_ids.contains(&current) {
            return Some(current);
        }
        match parent_of.get(&current) {
            Some(Some(parent)) => current = *parent,
            _ => return None,
        }
    }
    None
}

fn sort_top_level(comments: &mut [Comment], sort: CommentSort) {
    match sort {
        CommentSort::Best => {
            comments.sort_by(|a, b| {
                b.score()
                    .cmp(&a.score())
                    .then_with(|| b.created_at.cmp(&a.created_at))
            });
        }
        CommentSort::Top => {
            comments.sort_by(|a, b| b.score().cmp(&a.score()));
        }
        CommentSort::New => {
            comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        CommentSort::Old => {
            comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        }
        CommentSort::Controversial => {
            comments.sort_by(|a, b| {
                controversy_weight(b.upvotes, b.downvotes)
                    .cmp(&controversy_weight(a.upvotes, a.downvotes))
                    .then_with(|| b.created_at.cmp(&a.created_at))
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn comment(
        id_byte: u8,
        parent: Option<Uuid>,
        upvotes: i64,
        downvotes: i64,
        offset_secs: i64,
    ) -> Comment {
        Comment {
            id: Uuid::from_bytes([id_byte; 16]),
            post_id: Uuid::from_bytes([0xAA; 16]),
            author_id: Uuid::from_bytes([0xBB; 16]),
            author_name: Some("tester".to_string()),
            content: "body".to_string(),
            parent_id: parent,
            upvotes,
            downvotes,
            reply_count: 0,
            is_deleted: false,
            created_at: base_time() + Duration::seconds(offset_secs),
            updated_at: base_time() + Duration::seconds(offset_secs),
        }
    }

    fn id(byte: u8) -> Uuid {
        Uuid::from_bytes([byte; 16])
    }

    #[test]
    fn groups_replies_under_their_parents() {
        let a = comment(1, None, 0, 0, 0);
        let b = comment(2, None, 0, 0, 10);
        let c = comment(3, Some(a.id), 0, 0, 20);
        let d = comment(4, Some(a.id), 0, 0, 30);

        let threads = build_threads(vec![a, b, c, d], CommentSort::Old);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, id(1));
        assert_eq!(threads[0].replies.len(), 2);
        assert_eq!(threads[0].replies[0].comment.id, id(3));
        assert_eq!(threads[0].replies[1].comment.id, id(4));
        assert!(threads[1].replies.is_empty());
    }

    #[test]
    fn replies_stay_chronological_under_any_top_level_sort() {
        let a = comment(1, None, 0, 0, 0);
        let late_reply = comment(2, Some(a.id), 50, 0, 300);
        let early_reply = comment(3, Some(a.id), 0, 0, 100);

        let threads = build_threads(vec![a, late_reply, early_reply], CommentSort::Best);

        let reply_ids: Vec<_> = threads[0].replies.iter().map(|r| r.comment.id).collect();
        assert_eq!(reply_ids, vec![id(3), id(2)]);
    }

    #[test]
    fn nested_reply_chains_flatten_under_the_top_level_ancestor() {
        let a = comment(1, None, 0, 0, 0);
        let reply = comment(2, Some(a.id), 0, 0, 10);
        let reply_to_reply = comment(3, Some(reply.id), 0, 0, 20);

        let threads = build_threads(vec![a, reply, reply_to_reply], CommentSort::Old);

        assert_eq!(threads.len(), 1);
        let reply_ids: Vec<_> = threads[0].replies.iter().map(|r| r.comment.id).collect();
        assert_eq!(reply_ids, vec![id(2), id(3)]);
        assert!(threads[0].replies.iter().all(|r| r.replies.is_empty()));
    }

    #[test]
    fn deleted_parent_still_anchors_its_replies() {
        let mut tombstone = comment(1, None, 0, 0, 0);
        tombstone.is_deleted = true;
        tombstone.content = crate::models::DELETED_COMMENT_BODY.to_string();
        let reply = comment(2, Some(tombstone.id), 0, 0, 10);

        let threads = build_threads(vec![tombstone, reply], CommentSort::New);

        assert_eq!(threads.len(), 1);
        assert!(threads[0].comment.is_deleted);
        assert_eq!(threads[0].replies.len(), 1);
    }

    #[test]
    fn orphaned_replies_are_dropped() {
        let a = comment(1, None, 0, 0, 0);
        let orphan = comment(2, Some(id(0x99)), 0, 0, 10);

        let threads = build_threads(vec![a, orphan], CommentSort::Old);

        assert_eq!(threads.len(), 1);
        assert!(threads[0].replies.is_empty());
    }

    #[test]
    fn best_sorts_by_score_with_recency_tie_break() {
        let low = comment(1, None, 1, 0, 0);
        let tied_old = comment(2, None, 5, 2, 10);
        let tied_new = comment(3, None, 3, 0, 20);

        let threads = build_threads(vec![low, tied_old, tied_new], CommentSort::Best);

        let ids: Vec<_> = threads.iter().map(|t| t.comment.id).collect();
        assert_eq!(ids, vec![id(3), id(2), id(1)]);
    }

    #[test]
    fn old_sorts_ascending_and_new_descending() {
        let first = comment(1, None, 0, 0, 0);
        let second = comment(2, None, 0, 0, 10);

        let old = build_threads(vec![first.clone(), second.clone()], CommentSort::Old);
        assert_eq!(old[0].comment.id, id(1));

        let new = build_threads(vec![first, second], CommentSort::New);
        assert_eq!(new[0].comment.id, id(2));
    }

    #[test]
    fn controversial_ranks_balanced_comments_first() {
        let unanimous = comment(1, None, 10, 0, 0);
        let split = comment(2, None, 5, 5, 0);

        let threads = build_threads(vec![unanimous, split], CommentSort::Controversial);

        assert_eq!(threads[0].comment.id, id(2));
    }

    #[test]
    fn unknown_sort_name_is_rejected() {
        assert!(CommentSort::parse("best").is_ok());
        assert!(CommentSort::parse("spiciest").is_err());
    }
}
