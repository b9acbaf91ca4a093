/// Data models for forum-service
///
/// This module defines structures for:
/// - Post: forum posts with denormalized engagement counters
/// - Comment: comments on posts, one level of nesting in the rendered thread
/// - Vote: one ledger record per (user, target)
/// - CommentNode: a comment plus its ordered replies, as served to clients
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content a deleted comment's body is replaced with. The row itself stays
/// behind as a tombstone so replies keep a stable parent to attach to.
pub const DELETED_COMMENT_BODY: &str = "[deleted]";

/// Post entity with denormalized counters.
///
/// `author_id` is NULL for AI-generated posts. `upvotes`, `downvotes`,
/// `comment_count` and `views` are mutated only by the counter service;
/// the score is always derived, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub title: String,
    pub content: String,
    pub content_type: String,
    pub topic_slug: Option<String>,
    pub slug: String,
    pub status: String,
    pub is_ai_generated: bool,
    pub upvotes: i64,
    pub downvotes: i64,
    pub comment_count: i64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Net score. Derived from the counters on every read so it can never
    /// drift from them.
    pub fn score(&self) -> i64 {
        self.upvotes - self.downvotes
    }
}

/// Comment entity - represents a comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_name: Option<String>,
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub upvotes: i64,
    pub downvotes: i64,
    pub reply_count: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn score(&self) -> i64 {
        self.upvotes - self.downvotes
    }
}

/// Vote entity - the ledger record for one (user, target) pair.
///
/// A unique index on (user_id, target_id, target_type) guarantees at most
/// one open vote per pair; `vote_type` holds the wire value of [`VoteType`].
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_id: Uuid,
    pub target_type: String,
    pub vote_type: String,
    pub created_at: DateTime<Utc>,
}

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Upvote => "upvote",
            VoteType::Downvote => "downvote",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "upvote" => Some(VoteType::Upvote),
            "downvote" => Some(VoteType::Downvote),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            VoteType::Upvote => VoteType::Downvote,
            VoteType::Downvote => VoteType::Upvote,
        }
    }
}

/// The entity a vote applies to. Exactly one of post or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTarget {
    Post(Uuid),
    Comment(Uuid),
}

impl VoteTarget {
    pub fn id(&self) -> Uuid {
        match self {
            VoteTarget::Post(id) | VoteTarget::Comment(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            VoteTarget::Post(_) => "post",
            VoteTarget::Comment(_) => "comment",
        }
    }
}

/// A comment with its replies, as rendered in a thread view. Reply nodes
/// always carry an empty `replies` list; deeper chains are flattened under
/// the top-level ancestor.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn new(comment: Comment) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }
}

/// Pagination envelope returned alongside feed pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64, total: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size - 1) / page_size
        } else {
            0
        };
        Self {
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_type_round_trips_wire_values() {
        assert_eq!(VoteType::parse("upvote"), Some(VoteType::Upvote));
        assert_eq!(VoteType::parse("downvote"), Some(VoteType::Downvote));
        assert_eq!(VoteType::parse("sideways"), None);
        assert_eq!(VoteType::Upvote.as_str(), "upvote");
        assert_eq!(VoteType::Downvote.opposite(), VoteType::Upvote);
    }

    #[test]
    fn pagination_rounds_up_partial_pages() {
        let p = Pagination::new(1, 20, 41);
        assert_eq!(p.total_pages, 3);
        let empty = Pagination::new(1, 20, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
