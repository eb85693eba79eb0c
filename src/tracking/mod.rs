//! Change-tracking registry.

pub mod observer;
pub mod record;
pub mod registry;

pub use observer::{NoopObserver, TracingObserver, TrackingObserver};
pub use record::{CommitReport, PendingChange, TrackingRecord};
pub use registry::UnitOfWork;
