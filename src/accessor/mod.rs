//! Per-collection accessors.
//!
//! One [`RemoteCollection`] exists per registered collection. The tracking
//! registry reaches them through the object-safe [`CollectionAccessor`] so it
//! can persist records of any type with a single `patch` call.

use crate::core::{ChangeSet, Error, Result};
use crate::entity::{Entity, Record};
use crate::transport::{Transport, TransportRequest, envelope};
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, event};

#[async_trait]
pub trait CollectionAccessor: Send + Sync {
    fn collection_name(&self) -> &str;

    /// Sends a partial update for one item.
    async fn patch(&self, id: &str, changes: &ChangeSet) -> Result<()>;
}

/// Request parameters shared by reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadParams {
    pub filter: Option<String>,
    pub fields: Option<String>,
    pub limit: Option<usize>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl ReadParams {
    /// Adds these parameters to a read request.
    pub fn apply(&self, mut request: TransportRequest) -> TransportRequest {
        if let Some(filter) = &self.filter {
            request = request.query("filter", filter.as_str());
        }
        if let Some(fields) = &self.fields {
            request = request.query("fields", fields.as_str());
        }
        if let Some(limit) = self.limit {
            request = request.query("limit", limit.to_string());
        }
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request.timeout(self.timeout)
    }
}

/// Untracked access to one remote collection.
pub struct RemoteCollection<R> {
    transport: Arc<dyn Transport>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> RemoteCollection<R> {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        event!(Level::INFO, collection = R::COLLECTION, "collection accessor created");
        Self {
            transport,
            _record: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        R::COLLECTION
    }

    pub async fn fetch_by_id(&self, id: &str, params: &ReadParams) -> Result<Entity<R>> {
        let request = params.apply(TransportRequest::get(["items", R::COLLECTION, id]));
        let response = self.transport.send(request).await?;
        let record: R = envelope::decode(&response)?;
        Ok(Entity::new(record))
    }

    pub async fn fetch_many(&self, params: &ReadParams) -> Result<Vec<Entity<R>>> {
        let request = params.apply(TransportRequest::get(["items", R::COLLECTION]));
        let response = self.transport.send(request).await?;
        let records: Vec<R> = envelope::decode(&response)?;
        Ok(records.into_iter().map(Entity::new).collect())
    }

    pub async fn patch_item(&self, id: &str, changes: &ChangeSet) -> Result<()> {
        let body = serde_json::to_value(changes)?;
        let request = TransportRequest::patch(["items", R::COLLECTION, id]).json(body);
        let response = self.transport.send(request).await?;
        envelope::acknowledge(&response)
    }
}

#[async_trait]
impl<R: Record> CollectionAccessor for RemoteCollection<R> {
    fn collection_name(&self) -> &str {
        R::COLLECTION
    }

    async fn patch(&self, id: &str, changes: &ChangeSet) -> Result<()> {
        self.patch_item(id, changes).await
    }
}

struct AccessorEntry {
    accessor: Arc<dyn CollectionAccessor>,
    typed: Arc<dyn Any + Send + Sync>,
}

/// Name-keyed accessor table, fixed once the client is built.
#[derive(Default)]
pub struct AccessorRegistry {
    entries: HashMap<String, AccessorEntry>,
}

impl AccessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the accessor for `R`; re-registering replaces the previous one.
    pub fn register<R: Record>(&mut self, transport: Arc<dyn Transport>) {
        let accessor = Arc::new(RemoteCollection::<R>::new(transport));
        self.entries.insert(
            R::COLLECTION.to_string(),
            AccessorEntry {
                accessor: accessor.clone(),
                typed: accessor,
            },
        );
    }

    /// Registers an arbitrary accessor under its own collection name.
    pub fn insert(&mut self, accessor: Arc<dyn CollectionAccessor>) {
        let name = accessor.collection_name().to_string();
        self.entries.insert(
            name,
            AccessorEntry {
                typed: Arc::new(()),
                accessor,
            },
        );
    }

    pub fn get(&self, collection: &str) -> Option<Arc<dyn CollectionAccessor>> {
        self.entries.get(collection).map(|entry| entry.accessor.clone())
    }

    pub fn resolve(&self, collection: &str) -> Result<Arc<dyn CollectionAccessor>> {
        self.get(collection).ok_or_else(|| {
            Error::Configuration(format!(
                "No collection accessor registered for '{}'",
                collection
            ))
        })
    }

    pub fn typed<R: Record>(&self) -> Result<Arc<RemoteCollection<R>>> {
        let entry = self.entries.get(R::COLLECTION).ok_or_else(|| {
            Error::Configuration(format!(
                "No collection accessor registered for '{}'",
                R::COLLECTION
            ))
        })?;
        entry
            .typed
            .clone()
            .downcast::<RemoteCollection<R>>()
            .map_err(|_| {
                Error::Configuration(format!(
                    "Accessor for '{}' is not bound to the requested record type",
                    R::COLLECTION
                ))
            })
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.entries.contains_key(collection)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}
