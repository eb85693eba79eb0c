//! Client construction and the top-level handle.

pub mod config;

pub use config::{ClientConfig, DEFAULT_BASE_URL};

use crate::accessor::AccessorRegistry;
use crate::collection::Collection;
use crate::core::Result;
use crate::entity::Record;
use crate::tracking::{CommitReport, TracingObserver, TrackingObserver, UnitOfWork};
use crate::transport::{HttpTransport, Transport};
use std::sync::Arc;
use tracing::{Level, event};

type Registration = fn(&mut AccessorRegistry, Arc<dyn Transport>);

fn register_accessor<R: Record>(registry: &mut AccessorRegistry, transport: Arc<dyn Transport>) {
    registry.register::<R>(transport);
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    observer: Arc<dyn TrackingObserver>,
    registrations: Vec<Registration>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            observer: Arc::new(TracingObserver),
            registrations: Vec::new(),
        }
    }

    /// Creates an accessor for `R` when the client connects.
    pub fn register<R: Record>(mut self) -> Self {
        self.registrations.push(register_accessor::<R>);
        self
    }

    /// Registers every record type shipped in [`crate::models`].
    pub fn with_bundled_models(self) -> Self {
        crate::models::register_all(self)
    }

    /// Replaces the HTTP transport, e.g. with an in-memory one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn TrackingObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Validates the configuration, checks the remote is reachable and wires
    /// one accessor per registered collection.
    ///
    /// No client is produced if the health check fails.
    pub async fn connect(self) -> Result<Client> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };

        transport.ping().await.inspect_err(|err| {
            event!(Level::ERROR, base_url = %self.config.base_url, error = %err, "remote unavailable");
        })?;

        let mut accessors = AccessorRegistry::new();
        for registration in &self.registrations {
            registration(&mut accessors, transport.clone());
        }
        let accessors = Arc::new(accessors);

        event!(
            Level::INFO,
            base_url = %self.config.base_url,
            collections = accessors.len(),
            "client connected"
        );

        Ok(Client {
            context: AccessContext::new(accessors, self.observer.clone()),
            observer: self.observer,
            transport,
            config: self.config,
        })
    }
}

/// Collections bound to one independent unit of work.
#[derive(Clone, Debug)]
pub struct AccessContext {
    tracker: UnitOfWork,
}

impl AccessContext {
    fn new(accessors: Arc<AccessorRegistry>, observer: Arc<dyn TrackingObserver>) -> Self {
        Self {
            tracker: UnitOfWork::new(accessors, observer),
        }
    }

    pub fn collection<R: Record>(&self) -> Result<Collection<R>> {
        let remote = self.tracker.accessors().typed::<R>()?;
        Ok(Collection::new(remote, self.tracker.clone()))
    }

    pub async fn commit(&self) -> Result<CommitReport> {
        self.tracker.commit().await
    }

    pub async fn reset(&self) -> usize {
        self.tracker.reset().await
    }

    pub fn tracker(&self) -> &UnitOfWork {
        &self.tracker
    }
}

/// Connected client owning the default unit of work.
///
/// # Examples
///
/// ```no_run
/// use rustdirectus::{Client, ClientConfig};
/// use rustdirectus::models::Product;
///
/// # async fn run() -> rustdirectus::Result<()> {
/// let client = Client::connect(ClientConfig::new("http://localhost:8055").token("secret")).await?;
/// let products = client.collection::<Product>()?;
///
/// let basic = products.query().filter("name == 'Basic'").include("*,location.*").first().await?;
/// basic.update(|p| p.price = 12.0)?;
///
/// let report = client.commit().await?;
/// assert_eq!(report.patched, 1);
/// # Ok(())
/// # }
/// ```
pub struct Client {
    context: AccessContext,
    observer: Arc<dyn TrackingObserver>,
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl Client {
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// Connects with every bundled record type registered.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        ClientBuilder::new(config).with_bundled_models().connect().await
    }

    pub fn collection<R: Record>(&self) -> Result<Collection<R>> {
        self.context.collection::<R>()
    }

    pub async fn commit(&self) -> Result<CommitReport> {
        self.context.commit().await
    }

    pub async fn reset(&self) -> usize {
        self.context.reset().await
    }

    pub fn tracker(&self) -> &UnitOfWork {
        self.context.tracker()
    }

    /// Opens a context with its own tracking registry over the same accessors.
    pub fn new_context(&self) -> AccessContext {
        AccessContext::new(self.context.tracker.accessors().clone(), self.observer.clone())
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn ping(&self) -> Result<()> {
        self.transport.ping().await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("tracker", self.context.tracker())
            .finish_non_exhaustive()
    }
}
