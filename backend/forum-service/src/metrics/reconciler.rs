use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Reconciliation cycles by result (success, error).
    pub static ref RECONCILER_RUNS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "counter_reconciler_runs_total",
        "Counter reconciliation cycles segmented by result",
        &["result"]
    )
    .expect("failed to register counter_reconciler_runs_total");

    /// Rows whose counters drifted and were corrected, by counter family.
    pub static ref RECONCILER_CORRECTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "counter_reconciler_corrected_total",
        "Counter rows corrected by the reconciler segmented by counter family",
        &["counter"]
    )
    .expect("failed to register counter_reconciler_corrected_total");
}
