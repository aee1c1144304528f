//! Breach detection and duration handling.
//!
//! ## Submodules
//!
//! - [`breach`]: The sustained-breach state machine ([`BreachState`], [`BreachPolicy`], [`Event`])
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "10s", "1m30s", "500ms")
//!
//! ## Data Flow
//!
//! ```text
//! MetricSource::sample()
//!        │
//!        ▼
//! BreachState::advance(reading, now, &policy)
//!        │
//!        ├──▶ next BreachState (kept by the monitor loop)
//!        │
//!        └──▶ Event (rendered as one status line)
//! ```

pub mod breach;
pub mod duration;

pub use breach::{BreachPolicy, BreachState, Event};
