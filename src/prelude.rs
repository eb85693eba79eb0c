//! Common imports for application code.
//!
//! `use rustdirectus::prelude::*;` brings in the client, the tracked
//! collection handles and the record contract.

pub use crate::{
    ChangeSet, Client, ClientConfig, Collection, Entity, Error, Filter, Query, Record, Result,
    UnitOfWork, directus_record,
};

pub mod advanced {
    //! Lower-level seams for custom transports and observers.
    pub use crate::accessor::{AccessorRegistry, CollectionAccessor, RemoteCollection};
    pub use crate::tracking::{TrackingObserver, TrackingRecord};
    pub use crate::transport::{Transport, TransportRequest, TransportResponse};
}
