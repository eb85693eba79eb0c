use crate::core::{Error, Result};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8055";

/// Remote store connection configuration
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the remote instance
    pub base_url: String,

    /// Static access token sent as a bearer credential
    pub token: Option<String>,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Whole-request deadline, applied to every call unless overridden
    pub request_timeout: Option<Duration>,

    /// User-Agent header value
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a new configuration for the given base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            token: None,
            connect_timeout: Duration::from_secs(30),
            request_timeout: None,
            user_agent: concat!("rustdirectus/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the access token
    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the User-Agent
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Build from `DIRECTUS_URL`, `DIRECTUS_TOKEN` and `DIRECTUS_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("DIRECTUS_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url);

        if let Ok(token) = std::env::var("DIRECTUS_TOKEN") {
            config = config.token(&token);
        }

        if let Ok(raw) = std::env::var("DIRECTUS_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|_| {
                Error::InvalidConfig(format!("DIRECTUS_TIMEOUT_SECS must be an integer, got '{}'", raw))
            })?;
            config = config.request_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::InvalidConfig("base_url cannot be empty".into()));
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }

        if let Some(token) = &self.token {
            if token.trim().is_empty() {
                return Err(Error::InvalidConfig("token cannot be empty".into()));
            }
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig("request_timeout must be > 0".into()));
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
