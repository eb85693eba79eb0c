use crate::accessor::CollectionAccessor;
use crate::core::ChangeSet;
use crate::entity::{DynEntity, Snapshot};
use std::sync::Arc;
use std::time::Duration;

/// Registry entry for one live entity.
pub struct TrackingRecord {
    /// State the remote store is believed to hold.
    pub original: Snapshot,
    pub live: DynEntity,
    pub owner: Arc<dyn CollectionAccessor>,
    /// Registration order within the owning unit of work.
    pub sequence: u64,
}

impl TrackingRecord {
    pub fn collection(&self) -> &'static str {
        self.live.collection_name()
    }
}

impl std::fmt::Debug for TrackingRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingRecord")
            .field("collection", &self.collection())
            .field("identity", &self.live.identity().ok())
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Outcome of a successful commit sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReport {
    pub inspected: usize,
    pub patched: usize,
    pub elapsed: Duration,
}

impl CommitReport {
    pub fn is_noop(&self) -> bool {
        self.patched == 0
    }
}

/// Dirty entity as seen by a dry run.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChange {
    pub collection: String,
    pub identity: String,
    pub changes: ChangeSet,
}
