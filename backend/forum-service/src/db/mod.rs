/// Database access layer
///
/// Repositories for posts, comments, and vote records. Read paths take a
/// pool; the conditional vote-record writes take a connection so the vote
/// service can run them inside its transaction.
pub mod comment_repo;
pub mod post_repo;
pub mod vote_repo;
