use crate::accessor::{ReadParams, RemoteCollection};
use crate::core::{ChangeSet, Result};
use crate::entity::{Entity, Record};
use crate::query::Query;
use crate::tracking::UnitOfWork;
use std::fmt::Display;
use std::sync::Arc;

/// Collection handle bound to a unit of work.
pub struct Collection<R> {
    remote: Arc<RemoteCollection<R>>,
    tracker: UnitOfWork,
}

impl<R: Record> Collection<R> {
    pub(crate) fn new(remote: Arc<RemoteCollection<R>>, tracker: UnitOfWork) -> Self {
        Self { remote, tracker }
    }

    pub fn name(&self) -> &'static str {
        R::COLLECTION
    }

    /// Fetches one item and tracks it together with its relation graph.
    pub fn load_by_id(&self, id: impl Display) -> impl Future<Output = Result<Entity<R>>> + Send + '_ {
        self.load_tracked(id.to_string(), ReadParams::default())
    }

    /// Like [`Collection::load_by_id`] with explicit field selectors and headers.
    pub fn load_with(
        &self,
        id: impl Display,
        params: ReadParams,
    ) -> impl Future<Output = Result<Entity<R>>> + Send + '_ {
        self.load_tracked(id.to_string(), params)
    }

    async fn load_tracked(&self, id: String, params: ReadParams) -> Result<Entity<R>> {
        let entity = self.remote.fetch_by_id(&id, &params).await?;
        self.tracker.register(&entity).await?;
        Ok(entity)
    }

    pub fn query(&self) -> Query<R> {
        Query::new(self.remote.clone(), self.tracker.clone())
    }

    /// Sends a partial update directly, bypassing change tracking.
    pub async fn patch(&self, id: &str, changes: &ChangeSet) -> Result<()> {
        self.remote.patch_item(id, changes).await
    }
}

impl<R> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            tracker: self.tracker.clone(),
        }
    }
}
