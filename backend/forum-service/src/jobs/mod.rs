/// Background jobs for forum-service
pub mod counter_reconciler;
