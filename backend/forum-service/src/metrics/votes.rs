use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

lazy_static! {
    /// Total vote requests by target kind and outcome (upvoted, downvoted,
    /// removed, error).
    pub static ref VOTE_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "vote_request_total",
        "Total vote requests segmented by target kind and outcome",
        &["target", "outcome"]
    )
    .expect("failed to register vote_request_total");

    /// Conditional-write conflicts retried inside the vote service.
    pub static ref VOTE_CONFLICT_RETRIES_TOTAL: IntCounter = register_int_counter!(
        "vote_conflict_retries_total",
        "Vote conditional-write conflicts that were retried"
    )
    .expect("failed to register vote_conflict_retries_total");

    /// Duration of vote requests by target kind.
    pub static ref VOTE_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "vote_request_duration_seconds",
        "Vote request duration segmented by target kind",
        &["target"]
    )
    .expect("failed to register vote_request_duration_seconds");
}
