/// HTTP request handlers for forum-service
pub mod comments;
pub mod feed;
pub mod posts;
pub mod votes;

pub use comments::{create_comment, delete_comment, get_post_comments};
pub use feed::get_feed;
pub use posts::get_post;
pub use votes::{apply_vote, get_vote_status};
