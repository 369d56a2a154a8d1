use crate::error::XsdError;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("xsdvalidate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Async HTTP client for downloading remote schemas
///
/// libxml2 would block the calling thread for as long as a remote server
/// takes; fetching here first puts a bound on that wait. Failures are
/// reported as they happen, without retrying.
pub struct AsyncHttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl AsyncHttpClient {
    /// Create a new async HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self, XsdError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Download the schema at `url`
    pub async fn download_schema(&self, url: &str) -> Result<Vec<u8>, XsdError> {
        let response = self.make_request(url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(XsdError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = timeout(self.timeout(), response.bytes())
            .await
            .map_err(|_| self.timeout_error(url))??;
        debug!(url, size = bytes.len(), "schema downloaded");
        Ok(bytes.to_vec())
    }

    /// Make a single HTTP request with timeout
    async fn make_request(&self, url: &str) -> Result<Response, XsdError> {
        let request_future = self.client.get(url).send();

        timeout(self.timeout(), request_future)
            .await
            .map_err(|_| self.timeout_error(url))?
            .map_err(XsdError::from)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds)
    }

    fn timeout_error(&self, url: &str) -> XsdError {
        XsdError::Timeout {
            url: url.to_string(),
            timeout_seconds: self.config.timeout_seconds,
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}
