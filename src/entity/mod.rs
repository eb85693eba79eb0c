//! Entity capability contract.
//!
//! Concrete records implement [`Record`]; the tracking registry only ever sees
//! them through the object-safe [`TrackedEntity`] view of a live [`Entity`]
//! handle.

mod macros;

use crate::core::{ChangeSet, Error, Result};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Typed contract every collection record satisfies.
///
/// Usually generated with [`directus_record!`](crate::directus_record).
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Remote collection the record belongs to.
    const COLLECTION: &'static str;

    /// Primary key rendered as a path segment.
    fn identity(&self) -> String;

    /// Primary key as it appears in a relation payload.
    fn reference(&self) -> Result<Value>;

    /// Builds a stub record from a bare primary key.
    ///
    /// Used when a relation was returned without expansion.
    fn from_reference(reference: Value) -> Result<Self>;

    /// Changed fields of `self` relative to `prior`.
    fn diff(&self, prior: &Self) -> Result<ChangeSet>;

    /// Directly related entities, in field order.
    fn related(&self) -> Vec<DynEntity> {
        Vec::new()
    }
}

/// Type-erased copy of a record taken when tracking starts.
pub struct Snapshot(Box<dyn Any + Send + Sync>);

impl Snapshot {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Snapshot(..)")
    }
}

/// Object-safe view of a live entity used by the tracking registry.
pub trait TrackedEntity: Send + Sync {
    fn identity(&self) -> Result<String>;
    /// Primary key held by `snapshot`, i.e. the row the remote store knows.
    fn snapshot_identity(&self, snapshot: &Snapshot) -> Result<String>;
    fn collection_name(&self) -> &'static str;
    fn deep_copy(&self) -> Result<Snapshot>;
    /// Returns an empty change set when the live value equals `prior`.
    fn diff(&self, prior: &Snapshot) -> Result<ChangeSet>;
    fn traverse(&self) -> Result<Vec<DynEntity>>;
}

pub type DynEntity = Arc<dyn TrackedEntity>;

/// Physical identity of a live entity allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(usize);

impl EntityKey {
    pub fn of(entity: &DynEntity) -> Self {
        Self(Arc::as_ptr(entity) as *const () as usize)
    }
}

fn downcast_snapshot<T: Record>(snapshot: &Snapshot) -> Result<&T> {
    snapshot.downcast_ref::<T>().ok_or_else(|| {
        Error::Configuration(format!(
            "Snapshot type does not match collection '{}'",
            T::COLLECTION
        ))
    })
}

struct EntityCell<T> {
    value: RwLock<T>,
}

impl<T: Record> TrackedEntity for EntityCell<T> {
    fn identity(&self) -> Result<String> {
        Ok(self.value.read()?.identity())
    }

    fn snapshot_identity(&self, snapshot: &Snapshot) -> Result<String> {
        Ok(downcast_snapshot::<T>(snapshot)?.identity())
    }

    fn collection_name(&self) -> &'static str {
        T::COLLECTION
    }

    fn deep_copy(&self) -> Result<Snapshot> {
        let copy = self.value.read()?.clone();
        Ok(Snapshot::new(copy))
    }

    fn diff(&self, prior: &Snapshot) -> Result<ChangeSet> {
        let prior = downcast_snapshot::<T>(prior)?;
        self.value.read()?.diff(prior)
    }

    fn traverse(&self) -> Result<Vec<DynEntity>> {
        Ok(self.value.read()?.related())
    }
}

/// Shared, mutable handle to a live record.
///
/// Clones share the same allocation and therefore the same tracking identity.
pub struct Entity<T> {
    cell: Arc<EntityCell<T>>,
}

impl<T: Record> Entity<T> {
    pub fn new(record: T) -> Self {
        Self {
            cell: Arc::new(EntityCell {
                value: RwLock::new(record),
            }),
        }
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, T>> {
        Ok(self.cell.value.read()?)
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, T>> {
        Ok(self.cell.value.write()?)
    }

    /// Mutates the record in place and returns the closure result.
    pub fn update<O>(&self, mutate: impl FnOnce(&mut T) -> O) -> Result<O> {
        let mut guard = self.write()?;
        Ok(mutate(&mut guard))
    }

    /// Owned copy of the current record.
    pub fn get(&self) -> Result<T> {
        Ok(self.read()?.clone())
    }

    pub fn identity(&self) -> Result<String> {
        Ok(self.read()?.identity())
    }

    pub fn reference(&self) -> Result<Value> {
        self.read()?.reference()
    }

    pub fn key(&self) -> EntityKey {
        EntityKey(Arc::as_ptr(&self.cell) as *const () as usize)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    pub fn as_tracked(&self) -> DynEntity {
        self.cell.clone()
    }
}

impl<T> Clone for Entity<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

// Prints only the identity: relation graphs may be cyclic.
impl<T: Record> fmt::Debug for Entity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.value.read() {
            Ok(record) => write!(f, "Entity({}#{})", T::COLLECTION, record.identity()),
            Err(_) => write!(f, "Entity({}#<poisoned>)", T::COLLECTION),
        }
    }
}

impl<T: Record> Serialize for Entity<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let record = self
            .cell
            .value
            .read()
            .map_err(|err| ser::Error::custom(err.to_string()))?;
        record.serialize(serializer)
    }
}

impl<'de, T: Record> Deserialize<'de> for Entity<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let record = if value.is_object() {
            serde_json::from_value(value).map_err(de::Error::custom)?
        } else {
            T::from_reference(value).map_err(de::Error::custom)?
        };
        Ok(Self::new(record))
    }
}

/// Anything the registry can start a traversal from.
pub trait Trackable {
    fn as_tracked(&self) -> DynEntity;
}

impl<T: Record> Trackable for Entity<T> {
    fn as_tracked(&self) -> DynEntity {
        Entity::as_tracked(self)
    }
}

impl Trackable for DynEntity {
    fn as_tracked(&self) -> DynEntity {
        self.clone()
    }
}
