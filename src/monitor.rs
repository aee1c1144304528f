//! The polling loop.
//!
//! One task samples the source on every tick, advances the breach state and
//! prints one status line. Ticks never overlap: the next tick is awaited only
//! after the previous sample has finished, and ticks missed during a slow
//! query are skipped rather than replayed.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::data::{BreachPolicy, BreachState, Event};
use crate::source::MetricSource;
use crate::ui::{clock_stamp, StatusPrinter};

/// Process exit status used when a sustained breach is confirmed.
pub const EXIT_SUSTAINED_BREACH: u8 = 2;

/// Terminal outcome of the loop: the breach lasted long enough.
#[derive(Debug, Clone, PartialEq)]
pub struct Escalation {
    /// The reading that confirmed the breach.
    pub value: f64,
    /// How long the breach had lasted at that reading.
    pub elapsed: Duration,
    /// The configured sustain duration.
    pub required: Duration,
}

/// How a monitoring session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Stopped from outside, e.g. Ctrl-C.
    Interrupted,
    /// A sustained breach was confirmed.
    Escalated(Escalation),
}

impl Outcome {
    /// Process exit status for this outcome.
    pub fn exit_status(&self) -> u8 {
        match self {
            Outcome::Interrupted => 0,
            Outcome::Escalated(_) => EXIT_SUSTAINED_BREACH,
        }
    }
}

/// Polls a [`MetricSource`] and tracks sustained breaches.
pub struct Monitor<W> {
    source: Box<dyn MetricSource>,
    policy: BreachPolicy,
    interval: Duration,
    state: BreachState,
    printer: StatusPrinter<W>,
}

impl<W: Write> Monitor<W> {
    /// Create a monitor in the `Clear` state.
    pub fn new(
        source: Box<dyn MetricSource>,
        policy: BreachPolicy,
        interval: Duration,
        printer: StatusPrinter<W>,
    ) -> Self {
        Self {
            source,
            policy,
            interval,
            state: BreachState::Clear,
            printer,
        }
    }

    pub fn state(&self) -> BreachState {
        self.state
    }

    pub fn policy(&self) -> &BreachPolicy {
        &self.policy
    }

    pub fn printer(&self) -> &StatusPrinter<W> {
        &self.printer
    }

    /// Take one sample and apply it.
    ///
    /// Returns `Some` when this reading confirmed a sustained breach.
    pub async fn tick(&mut self) -> Result<Option<Escalation>> {
        let reading = self.source.sample().await;
        let now = Instant::now();

        let (next, event) = self.state.advance(reading, now, &self.policy);
        if next != self.state {
            debug!(from = ?self.state, to = ?next, "breach state changed");
        }
        self.state = next;

        self.printer.print_event(&event, &clock_stamp())?;

        match event {
            Event::QueryFailed(e) => {
                debug!(error = %e, "sample failed, breach state kept");
                Ok(None)
            }
            Event::Escalated {
                value,
                elapsed,
                required,
            } => Ok(Some(Escalation {
                value,
                elapsed,
                required,
            })),
            _ => Ok(None),
        }
    }

    /// Print the banner and poll until a sustained breach is confirmed.
    ///
    /// The first sample is taken one interval after the call. Only I/O
    /// errors on the output stream end the loop early.
    pub async fn run(&mut self) -> Result<Escalation> {
        self.printer
            .print_banner(&self.policy, self.source.description())?;
        info!(
            source = self.source.description(),
            threshold = self.policy.threshold,
            sustain = ?self.policy.sustain,
            interval = ?self.interval,
            "monitor started"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Some(escalation) = self.tick().await? {
                warn!(
                    value = escalation.value,
                    elapsed = ?escalation.elapsed,
                    "sustained breach confirmed"
                );
                return Ok(escalation);
            }
        }
    }
}

impl<W> std::fmt::Debug for Monitor<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("source", &self.source)
            .field("policy", &self.policy)
            .field("interval", &self.interval)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::QueryError;
    use crate::ui::Theme;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Returns queued readings in order, then fails.
    #[derive(Debug)]
    struct ScriptedSource {
        readings: Mutex<VecDeque<Result<f64, QueryError>>>,
    }

    impl ScriptedSource {
        fn new(readings: Vec<Result<f64, QueryError>>) -> Box<Self> {
            Box::new(Self {
                readings: Mutex::new(readings.into()),
            })
        }
    }

    #[async_trait]
    impl MetricSource for ScriptedSource {
        async fn sample(&self) -> Result<f64, QueryError> {
            self.readings
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(QueryError::Transport("script exhausted".to_string())))
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    fn monitor(
        readings: Vec<Result<f64, QueryError>>,
        sustain_secs: u64,
    ) -> Monitor<Vec<u8>> {
        Monitor::new(
            ScriptedSource::new(readings),
            BreachPolicy {
                threshold: 75.0,
                sustain: Duration::from_secs(sustain_secs),
            },
            Duration::from_secs(1),
            StatusPrinter::new(Vec::new(), Theme::plain()),
        )
    }

    fn output_lines(monitor: &Monitor<Vec<u8>>) -> Vec<String> {
        String::from_utf8(monitor.printer().get_ref().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Status lines after the three banner lines.
    fn event_lines(monitor: &Monitor<Vec<u8>>) -> Vec<String> {
        output_lines(monitor).into_iter().skip(3).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalates_on_third_breaching_tick() {
        let start = Instant::now();
        let mut monitor = monitor(vec![Ok(80.0), Ok(80.0), Ok(80.0)], 2);

        let escalation = monitor.run().await.unwrap();

        assert_eq!(
            escalation,
            Escalation {
                value: 80.0,
                elapsed: Duration::from_secs(2),
                required: Duration::from_secs(2),
            }
        );
        assert_eq!(start.elapsed(), Duration::from_secs(3));

        let lines = event_lines(&monitor);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("Memory: 80.00% (above threshold)"));
        assert!(lines[1].ends_with("Memory: 80.00% (1s / 2s)"));
        assert!(lines[2].contains("SUSTAINED BREACH"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalation_exits_with_status_two() {
        let mut monitor = monitor(vec![Ok(99.0), Ok(99.0)], 1);

        let outcome = Outcome::Escalated(monitor.run().await.unwrap());

        assert_eq!(outcome.exit_status(), 2);
        assert_eq!(outcome.exit_status(), EXIT_SUSTAINED_BREACH);
    }

    #[test]
    fn test_interruption_exits_cleanly() {
        assert_eq!(Outcome::Interrupted.exit_status(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_reading_restarts_breach() {
        let start = Instant::now();
        let mut monitor = monitor(
            vec![Ok(80.0), Ok(80.0), Ok(60.0), Ok(80.0), Ok(80.0), Ok(80.0)],
            2,
        );

        let escalation = monitor.run().await.unwrap();

        assert_eq!(escalation.elapsed, Duration::from_secs(2));
        assert_eq!(start.elapsed(), Duration::from_secs(6));

        let lines = event_lines(&monitor);
        assert_eq!(lines.len(), 6);
        assert!(lines[2].ends_with("Memory: 60.00%"));
        assert!(lines[3].ends_with("(above threshold)"));
        assert!(lines[5].contains("SUSTAINED BREACH"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_do_not_interrupt_breach() {
        let start = Instant::now();
        let mut monitor = monitor(
            vec![
                Ok(90.0),
                Err(QueryError::Transport("connection refused".to_string())),
                Err(QueryError::NoData),
                Ok(90.0),
            ],
            3,
        );

        let escalation = monitor.run().await.unwrap();

        assert_eq!(escalation.elapsed, Duration::from_secs(3));
        assert_eq!(start.elapsed(), Duration::from_secs(4));

        let lines = event_lines(&monitor);
        assert!(lines[1].contains("ERROR querying Prometheus: transport error: connection refused"));
        assert!(lines[2].contains("ERROR querying Prometheus: no data returned"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_error_leaves_state() {
        let mut monitor = monitor(vec![Ok(80.0), Err(QueryError::NoValidValue)], 10);

        assert_eq!(monitor.tick().await.unwrap(), None);
        let breaching = monitor.state();
        assert!(breaching.since().is_some());

        time::advance(Duration::from_secs(1)).await;
        assert_eq!(monitor.tick().await.unwrap(), None);
        assert_eq!(monitor.state(), breaching);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_below_threshold_clears() {
        let mut monitor = monitor(vec![Ok(80.0), Ok(10.0)], 10);

        monitor.tick().await.unwrap();
        assert!(matches!(monitor.state(), BreachState::Breaching { .. }));

        monitor.tick().await.unwrap();
        assert_eq!(monitor.state(), BreachState::Clear);
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_is_printed_first() {
        let mut monitor = monitor(vec![Ok(80.0), Ok(80.0)], 1);
        monitor.run().await.unwrap();

        let lines = output_lines(&monitor);
        assert_eq!(lines[0], "Starting memory monitor (scripted)");
        assert_eq!(lines[1], "Threshold: 75.00% for 1s");
        assert_eq!(lines[2], "");
    }
}
