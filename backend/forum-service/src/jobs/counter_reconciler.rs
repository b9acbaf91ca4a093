//! Counter Reconciliation Background Job
//!
//! The denormalized counters on posts and comments are updated in the same
//! transaction as the vote-record and comment writes, but the vote ledger
//! and the comments table remain the source of truth. This job recomputes
//! every counter from those tables on a fixed interval and corrects any
//! drift (crashed deployments, manual data surgery, bugs), so drift is
//! bounded by the interval instead of accumulating forever.

use sqlx::PgPool;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::metrics::reconciler as metrics;
use crate::services::CounterService;

pub struct CounterReconcilerJob {
    counters: CounterService,
    interval: Duration,
}

impl CounterReconcilerJob {
    pub fn new(pool: PgPool, interval_secs: u64) -> Self {
        Self {
            counters: CounterService::new(pool),
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Starting counter reconciler background job"
        );

        loop {
            sleep(self.interval).await;

            let cycle_start = Instant::now();
            match self.counters.reconcile_from_ledger().await {
                Ok(report) => {
                    metrics::RECONCILER_RUNS_TOTAL
                        .with_label_values(&["success"])
                        .inc();
                    metrics::RECONCILER_CORRECTED_TOTAL
                        .with_label_values(&["post_votes"])
                        .inc_by(report.post_vote_rows);
                    metrics::RECONCILER_CORRECTED_TOTAL
                        .with_label_values(&["comment_votes"])
                        .inc_by(report.comment_vote_rows);
                    metrics::RECONCILER_CORRECTED_TOTAL
                        .with_label_values(&["comment_counts"])
                        .inc_by(report.comment_count_rows);
                    metrics::RECONCILER_CORRECTED_TOTAL
                        .with_label_values(&["reply_counts"])
                        .inc_by(report.reply_count_rows);

                    if report.total() > 0 {
                        tracing::warn!(
                            post_vote_rows = report.post_vote_rows,
                            comment_vote_rows = report.comment_vote_rows,
                            comment_count_rows = report.comment_count_rows,
                            reply_count_rows = report.reply_count_rows,
                            duration_ms = cycle_start.elapsed().as_millis(),
                            "Counter reconciliation corrected drifted rows"
                        );
                    } else {
                        tracing::debug!(
                            duration_ms = cycle_start.elapsed().as_millis(),
                            "Counter reconciliation found no drift"
                        );
                    }
                }
                Err(e) => {
                    metrics::RECONCILER_RUNS_TOTAL
                        .with_label_values(&["error"])
                        .inc();
                    tracing::error!(
                        error = %e,
                        duration_ms = cycle_start.elapsed().as_millis(),
                        "Counter reconciliation failed"
                    );
                }
            }
        }
    }
}
