use super::observer::TrackingObserver;
use super::record::{CommitReport, PendingChange, TrackingRecord};
use crate::accessor::AccessorRegistry;
use crate::core::{Error, Result};
use crate::entity::{DynEntity, EntityKey, Trackable};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{Instrument, Level, event, info_span};

#[derive(Default)]
struct RegistryState {
    records: HashMap<EntityKey, TrackingRecord>,
    next_sequence: u64,
}

impl RegistryState {
    fn ordered_keys(&self) -> Vec<EntityKey> {
        let mut keys: Vec<(u64, EntityKey)> = self
            .records
            .iter()
            .map(|(key, record)| (record.sequence, *key))
            .collect();
        keys.sort_unstable();
        keys.into_iter().map(|(_, key)| key).collect()
    }
}

struct Inner {
    state: Mutex<RegistryState>,
    accessors: Arc<AccessorRegistry>,
    observer: Arc<dyn TrackingObserver>,
}

/// Unit of work: tracks every entity reachable from what was loaded and
/// persists only what changed.
///
/// All operations are serialized on one async mutex. Clones share the same
/// registry.
#[derive(Clone)]
pub struct UnitOfWork {
    inner: Arc<Inner>,
}

impl UnitOfWork {
    pub fn new(accessors: Arc<AccessorRegistry>, observer: Arc<dyn TrackingObserver>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(RegistryState::default()),
                accessors,
                observer,
            }),
        }
    }

    pub fn accessors(&self) -> &Arc<AccessorRegistry> {
        &self.inner.accessors
    }

    /// Tracks `root` and everything reachable from it.
    ///
    /// Returns how many entities were newly tracked. Fails with
    /// [`Error::Configuration`] if a reachable entity belongs to a collection
    /// without an accessor, in which case nothing is tracked.
    pub async fn register<E>(&self, root: &E) -> Result<usize>
    where
        E: Trackable + Sync + ?Sized,
    {
        let root = root.as_tracked();
        self.register_all([root]).await
    }

    /// Tracks a batch of roots under a single lock acquisition.
    pub async fn register_all<I>(&self, roots: I) -> Result<usize>
    where
        I: IntoIterator<Item = DynEntity>,
    {
        let roots: Vec<DynEntity> = roots.into_iter().collect();
        let mut state = self.inner.state.lock().await;

        let mut visited: HashMap<EntityKey, DynEntity> = HashMap::new();
        let mut queue: VecDeque<DynEntity> = VecDeque::new();
        for root in roots {
            if visited.insert(EntityKey::of(&root), root.clone()).is_none() {
                queue.push_back(root);
            }
        }

        let mut discovered = Vec::new();
        while let Some(node) = queue.pop_front() {
            let key = EntityKey::of(&node);
            if !state.records.contains_key(&key) {
                let owner = self.inner.accessors.resolve(node.collection_name())?;
                let original = node.deep_copy()?;
                discovered.push((key, node.clone(), owner, original));
            }

            for child in node.traverse()? {
                let child_key = EntityKey::of(&child);
                if !visited.contains_key(&child_key) {
                    visited.insert(child_key, child.clone());
                    queue.push_back(child);
                }
            }
        }

        let added = discovered.len();
        for (key, live, owner, original) in discovered {
            let sequence = state.next_sequence;
            state.next_sequence += 1;
            if let Ok(identity) = live.snapshot_identity(&original) {
                self.inner
                    .observer
                    .entity_tracked(live.collection_name(), &identity);
            }
            state.records.insert(
                key,
                TrackingRecord {
                    original,
                    live,
                    owner,
                    sequence,
                },
            );
        }
        Ok(added)
    }

    /// Patches every dirty entity through its owning accessor.
    ///
    /// Stops at the first failure without rolling back; entities patched
    /// before it keep their advanced snapshot, so calling `commit` again
    /// resumes with what is still dirty. A fully successful sweep clears the
    /// registry.
    pub async fn commit(&self) -> Result<CommitReport> {
        let span = info_span!("tracking.commit");
        self.commit_sweep().instrument(span).await
    }

    async fn commit_sweep(&self) -> Result<CommitReport> {
        let started = Instant::now();
        let mut state = self.inner.state.lock().await;
        let order = state.ordered_keys();
        let mut patched = 0;

        for key in &order {
            let Some(record) = state.records.get_mut(key) else {
                continue;
            };

            // Snapshot before diffing so a concurrent edit is resent, not lost.
            let candidate = record.live.deep_copy()?;
            let changes = record.live.diff(&record.original)?;
            if changes.is_empty() {
                continue;
            }

            // The remote row is addressed by the key it was loaded with.
            let collection = record.collection();
            let identity = record.live.snapshot_identity(&record.original)?;
            match record.owner.patch(&identity, &changes).await {
                Ok(()) => {
                    record.original = candidate;
                    patched += 1;
                    self.inner
                        .observer
                        .entity_patched(collection, &identity, &changes);
                }
                Err(err) => {
                    self.inner.observer.commit_failed(collection, &identity, &err);
                    return Err(Error::Persistence {
                        collection: collection.to_string(),
                        id: identity,
                        source: Box::new(err),
                    });
                }
            }
        }

        state.records.clear();
        let report = CommitReport {
            inspected: order.len(),
            patched,
            elapsed: started.elapsed(),
        };
        self.inner.observer.commit_finished(&report);
        Ok(report)
    }

    /// Drops all tracking state without touching the remote store.
    pub async fn reset(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        let discarded = state.records.len();
        state.records.clear();
        self.inner.observer.registry_reset(discarded);
        discarded
    }

    pub async fn tracked_count(&self) -> usize {
        self.inner.state.lock().await.records.len()
    }

    pub async fn is_tracked<E>(&self, entity: &E) -> bool
    where
        E: Trackable + Sync + ?Sized,
    {
        let key = EntityKey::of(&entity.as_tracked());
        self.inner.state.lock().await.records.contains_key(&key)
    }

    /// Dirty set as it would be committed now, in commit order.
    pub async fn pending_changes(&self) -> Result<Vec<PendingChange>> {
        let state = self.inner.state.lock().await;
        let mut pending = Vec::new();
        for key in state.ordered_keys() {
            let Some(record) = state.records.get(&key) else {
                continue;
            };
            let changes = record.live.diff(&record.original)?;
            if changes.is_empty() {
                continue;
            }
            pending.push(PendingChange {
                collection: record.collection().to_string(),
                identity: record.live.snapshot_identity(&record.original)?,
                changes,
            });
        }
        event!(Level::TRACE, dirty = pending.len(), "pending changes computed");
        Ok(pending)
    }
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("collections", &self.inner.accessors.names())
            .finish_non_exhaustive()
    }
}
