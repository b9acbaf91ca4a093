use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

lazy_static! {
    /// Duration of feed requests by algorithm.
    pub static ref FEED_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "feed_request_duration_seconds",
        "Feed request duration segmented by sort algorithm",
        &["algorithm"]
    )
    .expect("failed to register feed_request_duration_seconds");

    /// Total feed requests processed by algorithm.
    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_request_total",
        "Total feed requests segmented by sort algorithm",
        &["algorithm"]
    )
    .expect("failed to register feed_request_total");

    /// Size of the snapshot ranked per request.
    pub static ref FEED_SNAPSHOT_SIZE: HistogramVec = register_histogram_vec!(
        "feed_snapshot_size",
        "Number of posts ranked per feed request segmented by algorithm",
        &["algorithm"]
    )
    .expect("failed to register feed_snapshot_size");
}
