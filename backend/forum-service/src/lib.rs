/// Forum Service Library
///
/// The vote ledger and ranking engine behind the Tribune forum: records
/// one vote per (user, target) with toggle/switch semantics, keeps the
/// denormalized engagement counters consistent with the ledger, and serves
/// deterministically ranked feeds and comment threads.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Data structures for posts, comments, votes
/// - `services`: Business logic layer (ledger, counters, ranking, threads)
/// - `db`: Database access layer and repositories
/// - `jobs`: Background counter reconciliation
/// - `middleware`: HTTP middleware for authentication and rate limiting
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Observability and metrics collection
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
