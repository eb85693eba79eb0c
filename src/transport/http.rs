use super::{Method, Transport, TransportRequest, TransportResponse};
use crate::client::ClientConfig;
use crate::core::{Error, Result};
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{Level, event};

/// `reqwest`-backed transport with bearer authentication.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| Error::InvalidConfig(format!("invalid base_url '{}': {}", config.base_url, err)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "base_url '{}' cannot carry a path",
                config.base_url
            )));
        }

        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the outgoing request. A caller-supplied `Authorization` header
    /// replaces the configured bearer token.
    fn prepare(&self, request: &TransportRequest) -> Result<reqwest::Request> {
        let url = self.url_for(&request.segments);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        let overrides_auth = request
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION.as_str()));
        if let Some(token) = self.token.as_ref().filter(|_| !overrides_auth) {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }

    fn url_for(&self, segments: &[String]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let prepared = self.prepare(&request)?;
        let response = self.client.execute(prepared).await.inspect_err(|err| {
            event!(Level::ERROR, error = %err, path = %request.path(), "transport request failed");
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        event!(
            Level::DEBUG,
            method = request.method.as_str(),
            path = %request.path(),
            status,
            "transport request completed"
        );
        Ok(TransportResponse { status, body })
    }

    async fn ping(&self) -> Result<()> {
        let url = self.url_for(&["server".to_string(), "ping".to_string()]);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| Error::HealthCheck(err.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            event!(Level::ERROR, status, "health check failed");
            return Err(Error::HealthCheck(format!("unexpected status code: {}", status)));
        }
        Ok(())
    }
}
