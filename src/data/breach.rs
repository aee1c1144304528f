//! Sustained threshold breach detection.
//!
//! The state machine is a pure function over `(state, reading, now)`. The
//! caller owns the [`BreachState`] and threads it through successive ticks.
//!
//! ```text
//!            value < threshold
//!        ┌───────────────────────────────┐
//!        ▼                               │
//!   ┌─────────┐  value >= threshold  ┌───────────────┐  elapsed >= sustain
//!   │  Clear  │─────────────────────▶│ Breaching     │───────────────────▶ escalate
//!   └─────────┘                      │ { since }     │
//!                                    └───────────────┘
//! ```
//!
//! A failed query leaves the state exactly as it was.

use std::time::Duration;

use tokio::time::Instant;

use crate::source::QueryError;

/// Threshold and the time a breach must persist before escalation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreachPolicy {
    /// Readings at or above this value are breaches.
    pub threshold: f64,
    /// How long a breach must last before escalating.
    pub sustain: Duration,
}

impl Default for BreachPolicy {
    fn default() -> Self {
        Self {
            threshold: 75.0,
            sustain: Duration::from_secs(10),
        }
    }
}

impl BreachPolicy {
    pub fn is_breach(&self, value: f64) -> bool {
        value >= self.threshold
    }
}

/// Breach state carried from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreachState {
    #[default]
    Clear,
    /// Every reading since `since` (inclusive) was a breach.
    Breaching { since: Instant },
}

/// What a single reading did to the breach state.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The sample could not be taken; state is unchanged.
    QueryFailed(QueryError),
    /// Below threshold; any ongoing breach is cleared.
    Normal { value: f64 },
    /// First breaching reading after a clear state.
    Entered { value: f64 },
    /// Still breaching, not yet for long enough.
    Sustaining {
        value: f64,
        elapsed: Duration,
        required: Duration,
    },
    /// Breached for at least the sustain duration.
    Escalated {
        value: f64,
        elapsed: Duration,
        required: Duration,
    },
}

impl Event {
    pub fn is_escalation(&self) -> bool {
        matches!(self, Event::Escalated { .. })
    }
}

impl BreachState {
    /// Start of the ongoing breach, if any.
    pub fn since(&self) -> Option<Instant> {
        match self {
            BreachState::Clear => None,
            BreachState::Breaching { since } => Some(*since),
        }
    }

    /// Apply one reading taken at `now`.
    ///
    /// On escalation the returned state is still `Breaching`; the caller is
    /// expected to stop.
    pub fn advance(
        self,
        reading: Result<f64, QueryError>,
        now: Instant,
        policy: &BreachPolicy,
    ) -> (BreachState, Event) {
        let value = match reading {
            Ok(value) => value,
            Err(e) => return (self, Event::QueryFailed(e)),
        };

        if !policy.is_breach(value) {
            return (BreachState::Clear, Event::Normal { value });
        }

        match self {
            BreachState::Clear => (BreachState::Breaching { since: now }, Event::Entered { value }),
            BreachState::Breaching { since } => {
                let elapsed = now.saturating_duration_since(since);
                let required = policy.sustain;
                let event = if elapsed >= required {
                    Event::Escalated {
                        value,
                        elapsed,
                        required,
                    }
                } else {
                    Event::Sustaining {
                        value,
                        elapsed,
                        required,
                    }
                };
                (self, event)
            }
        }
    }
}
