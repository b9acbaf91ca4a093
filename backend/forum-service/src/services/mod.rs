/// Business logic layer for forum-service
///
/// This module provides high-level operations:
/// - Vote ledger: the one-vote-per-(user, target) state machine
/// - Counter service: the single mutation path for denormalized counters
/// - Ranking: deterministic feed ordering over a snapshot
/// - Threads: comment tree assembly and thread sorts
pub mod comments;
pub mod counters;
pub mod feed;
pub mod posts;
pub mod ranking;
pub mod threads;
pub mod votes;

// Re-export commonly used services
pub use comments::CommentService;
pub use counters::{CounterService, ReconcileReport, VoteDeltas};
pub use feed::{FeedPage, FeedQuery, FeedService};
pub use posts::PostService;
pub use ranking::{FeedAlgorithm, RankingEngine};
pub use threads::CommentSort;
pub use votes::{VoteReceipt, VoteService, VoteStatus, VoteTransition};
