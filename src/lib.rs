// ============================================================================
// rustdirectus Library
// ============================================================================

pub mod core;
pub mod entity;
pub mod models;
pub mod filter;
pub mod transport;
pub mod accessor;
pub mod tracking;
pub mod query;
pub mod collection;
pub mod client;

// Re-export main types for convenience
pub use core::{ChangeSet, Error, Result};
pub use entity::{DynEntity, Entity, EntityKey, Record, Snapshot, Trackable, TrackedEntity};
pub use filter::{CompareOp, Comparison, Filter};
pub use accessor::{AccessorRegistry, CollectionAccessor, ReadParams, RemoteCollection};
pub use tracking::{
    CommitReport, NoopObserver, PendingChange, TracingObserver, TrackingObserver, UnitOfWork,
};
pub use query::Query;
pub use collection::Collection;

// Re-export client API
pub use client::{AccessContext, Client, ClientBuilder, ClientConfig};

/// Compiles filter expressions into the remote filter object.
///
/// # Examples
///
/// ```
/// let filter = rustdirectus::compile_filter(["price > 10", "location.code == 'de'"]).unwrap();
/// assert_eq!(filter.len(), 2);
/// ```
pub fn compile_filter<I, S>(expressions: I) -> Result<Filter>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Filter::compile(expressions)
}

pub mod prelude;
