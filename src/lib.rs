//! # memwatch
//!
//! A console watchdog that polls a Prometheus server for a memory usage
//! percentage and exits with a distinguished status once the value has
//! stayed at or above a threshold for too long.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           memwatch                               │
//! │  ┌─────────┐  tick  ┌──────────┐ reading ┌────────┐ event ┌────┐ │
//! │  │ monitor │───────▶│  source  │────────▶│  data  │──────▶│ ui │ │
//! │  │ (loop)  │        │ (query)  │         │(breach)│       │    │ │
//! │  └────┬────┘        └──────────┘         └────────┘       └────┘ │
//! │       │ Escalation                                               │
//! │       ▼                                                          │
//! │   exit code 2                                                    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: The [`MetricSource`] trait and the [`PrometheusClient`]
//!   that implements it over the instant-query HTTP API
//! - **[`data`]**: The breach state machine ([`BreachState`], [`BreachPolicy`])
//!   and duration parsing
//! - **[`monitor`]**: The polling loop ([`Monitor`]) that ties the pieces together
//! - **[`ui`]**: Colored status lines and theme detection
//! - **[`settings`]**: Layered configuration (defaults, file, environment, flags)
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Escalate once memory stays at or above 90% for 30 seconds
//! memwatch --url http://localhost:9090 --threshold 90 --duration 30s
//!
//! # Read settings from a file, override one from the environment
//! MEMWATCH_INTERVAL=2s memwatch --config memwatch.toml
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::time::Duration;
//! use memwatch::{BreachPolicy, Monitor, PrometheusClient, StatusPrinter, Theme};
//!
//! # tokio_test::block_on(async {
//! let client = PrometheusClient::builder()
//!     .endpoint("http://localhost:9090")
//!     .timeout(Duration::from_millis(800))
//!     .build()
//!     .unwrap();
//!
//! let mut monitor = Monitor::new(
//!     Box::new(client),
//!     BreachPolicy::default(),
//!     Duration::from_secs(1),
//!     StatusPrinter::new(std::io::stdout(), Theme::auto_detect()),
//! );
//! let escalation = monitor.run().await.unwrap();
//! println!("breached for {:?}", escalation.elapsed);
//! # });
//! ```
//!
//! ### Driving the state machine directly
//!
//! ```
//! use std::time::Duration;
//! use memwatch::{BreachPolicy, BreachState, Event};
//! use tokio::time::Instant;
//!
//! let policy = BreachPolicy { threshold: 75.0, sustain: Duration::from_secs(2) };
//! let start = Instant::now();
//!
//! let (state, event) = BreachState::Clear.advance(Ok(80.0), start, &policy);
//! assert_eq!(event, Event::Entered { value: 80.0 });
//!
//! let (_, event) = state.advance(Ok(81.0), start + Duration::from_secs(2), &policy);
//! assert!(event.is_escalation());
//! ```

pub mod data;
pub mod monitor;
pub mod settings;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use data::{BreachPolicy, BreachState, Event};
pub use monitor::{Escalation, Monitor, Outcome, EXIT_SUSTAINED_BREACH};
pub use settings::{Overrides, Settings};
pub use source::{MetricSource, PrometheusClient, QueryError, MEMORY_QUERY};
pub use ui::{StatusPrinter, Theme};
