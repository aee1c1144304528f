//! Prometheus client using the instant-query HTTP API.
//!
//! Each call is a single `GET /api/v1/query` bounded by the configured
//! timeout. There are no retries here; the poll cadence is the retry policy.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use memwatch::source::{PrometheusClient, MEMORY_QUERY};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PrometheusClient::builder()
//!         .endpoint("http://localhost:9090")
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let used = client.query(MEMORY_QUERY).await?;
//!     println!("memory in use: {:.2}%", used);
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::response::QueryResponse;
use super::{MetricSource, QueryError};

/// Path of the instant-query endpoint, relative to the server root.
const QUERY_PATH: &str = "/api/v1/query";

/// Name of the parameter carrying the expression.
const QUERY_PARAM: &str = "query";

/// Physical memory in use on a Windows host, in percent.
pub const MEMORY_QUERY: &str =
    "100 * (1 - (windows_memory_available_bytes / windows_memory_physical_total_bytes))";

/// Client for a Prometheus-compatible query API.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    client: Client,
    query_url: Url,
    timeout: Duration,
    description: String,
}

impl PrometheusClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> PrometheusClientBuilder {
        PrometheusClientBuilder::default()
    }

    /// Full URL of the query endpoint.
    pub fn query_url(&self) -> &Url {
        &self.query_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `expression` as an instant query and reduce it to one value.
    ///
    /// When several series match, the largest value wins. Series whose
    /// value cannot be read as a number are ignored.
    pub async fn query(&self, expression: &str) -> Result<f64, QueryError> {
        debug!(url = %self.query_url, expression, "querying backend");

        // Error envelopes arrive with 4xx/5xx codes; the body still decides.
        let response = self
            .client
            .get(self.query_url.clone())
            .query(&[(QUERY_PARAM, expression)])
            .send()
            .await?;

        let envelope: QueryResponse = response.json().await?;
        let value = envelope.into_value();

        debug!(?value, "query finished");
        value
    }
}

#[async_trait]
impl MetricSource for PrometheusClient {
    async fn sample(&self) -> Result<f64, QueryError> {
        self.query(MEMORY_QUERY).await
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for PrometheusClient.
#[derive(Debug, Default)]
pub struct PrometheusClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl PrometheusClientBuilder {
    /// Set the server base URL (default: "http://localhost:9090").
    ///
    /// Any path on the URL is replaced by the query endpoint path. Query
    /// parameters on the URL (e.g. a tenant selector) are sent with every
    /// request, except `query`, which is always the expression.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the timeout for a whole query, connect through body (default: 5 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PrometheusClient, QueryError> {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(5));
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:9090".to_string());

        let mut query_url = Url::parse(&endpoint)
            .map_err(|e| QueryError::Transport(format!("invalid URL '{}': {}", endpoint, e)))?;
        if query_url.cannot_be_a_base() {
            return Err(QueryError::Transport(format!(
                "invalid URL '{}': not a base URL",
                endpoint
            )));
        }
        query_url.set_path(QUERY_PATH);
        query_url.set_fragment(None);

        let kept: Vec<(String, String)> = query_url
            .query_pairs()
            .filter(|(key, _)| key != QUERY_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        if kept.is_empty() {
            query_url.set_query(None);
        } else {
            query_url.query_pairs_mut().clear().extend_pairs(kept);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(PrometheusClient {
            client,
            description: format!("prometheus: {}", endpoint),
            query_url,
            timeout,
        })
    }
}
