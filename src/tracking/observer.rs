use super::CommitReport;
use crate::core::{ChangeSet, Error};
use tracing::{Level, event};

/// Receives unit-of-work lifecycle notifications.
///
/// Every method has an empty default so implementors pick what they need.
pub trait TrackingObserver: Send + Sync {
    fn entity_tracked(&self, _collection: &str, _identity: &str) {}

    fn entity_patched(&self, _collection: &str, _identity: &str, _changes: &ChangeSet) {}

    fn commit_failed(&self, _collection: &str, _identity: &str, _error: &Error) {}

    fn commit_finished(&self, _report: &CommitReport) {}

    fn registry_reset(&self, _discarded: usize) {}
}

/// Forwards notifications to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TrackingObserver for TracingObserver {
    fn entity_tracked(&self, collection: &str, identity: &str) {
        event!(Level::TRACE, collection, identity, "entity tracked");
    }

    fn entity_patched(&self, collection: &str, identity: &str, changes: &ChangeSet) {
        event!(
            Level::DEBUG,
            collection,
            identity,
            fields = changes.len(),
            "entity patched"
        );
    }

    fn commit_failed(&self, collection: &str, identity: &str, error: &Error) {
        event!(Level::ERROR, collection, identity, error = %error, "commit aborted");
    }

    fn commit_finished(&self, report: &CommitReport) {
        event!(
            Level::INFO,
            inspected = report.inspected,
            patched = report.patched,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "commit finished"
        );
    }

    fn registry_reset(&self, discarded: usize) {
        event!(Level::DEBUG, discarded, "tracking registry reset");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TrackingObserver for NoopObserver {}
