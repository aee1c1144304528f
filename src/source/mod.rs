//! Metric source abstraction for sampling the monitored value.
//!
//! The monitor loop only sees the [`MetricSource`] trait. The production
//! implementation is [`PrometheusClient`]; tests substitute scripted sources.

mod error;
mod prometheus;
mod response;

pub use error::QueryError;
pub use prometheus::{PrometheusClient, PrometheusClientBuilder, MEMORY_QUERY};
pub use response::{max_value, QueryData, QueryResponse, Series};

use std::fmt::Debug;

use async_trait::async_trait;

/// Trait for sampling a single percentage value.
///
/// # Example
///
/// ```no_run
/// use memwatch::{MetricSource, PrometheusClient};
///
/// # tokio_test::block_on(async {
/// let source = PrometheusClient::builder().build().unwrap();
/// match source.sample().await {
///     Ok(value) => println!("{}: {:.2}%", source.description(), value),
///     Err(e) => eprintln!("{}: {}", source.description(), e),
/// }
/// # });
/// ```
#[async_trait]
pub trait MetricSource: Send + Sync + Debug {
    /// Take one sample.
    ///
    /// Each call is a single attempt; implementations must not retry.
    async fn sample(&self) -> Result<f64, QueryError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used in the startup banner.
    fn description(&self) -> &str;
}
