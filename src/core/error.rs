use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error("Health check failed: {0}")]
    HealthCheck(String),

    #[error("Collection '{0}' returned no items")]
    EmptyResult(String),

    #[error("Cannot compile filter '{expression}': {reason}")]
    Compile { expression: String, reason: String },

    #[error("Failed to persist {collection}/{id}: {source}")]
    Persistence {
        collection: String,
        id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn compile(expression: &str, reason: impl Into<String>) -> Self {
        Self::Compile {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` when repeating the failed call may succeed.
    ///
    /// Wiring and input errors are permanent; network, remote and
    /// persistence failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Remote(_) | Self::UnexpectedStatus(_) | Self::HealthCheck(_) => {
                true
            }
            Self::Persistence { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}
