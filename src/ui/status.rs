//! One-line-per-tick console output.

use std::io::{self, Write};

use crate::data::duration::format_duration;
use crate::data::{BreachPolicy, Event};

use super::Theme;

/// Current local time as `HH:MM:SS`.
pub fn clock_stamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Banner lines printed once at startup.
pub fn render_banner(policy: &BreachPolicy, source: &str) -> [String; 2] {
    [
        format!("Starting memory monitor ({})", source),
        format!(
            "Threshold: {:.2}% for {}",
            policy.threshold,
            format_duration(policy.sustain)
        ),
    ]
}

/// Status line for `event`, without color.
pub fn render_event(event: &Event, stamp: &str) -> String {
    match event {
        Event::QueryFailed(e) => format!("[{}] ERROR querying Prometheus: {}", stamp, e),
        Event::Normal { value } => format!("[{}] Memory: {:.2}%", stamp, value),
        Event::Entered { value } => {
            format!("[{}] Memory: {:.2}% (above threshold)", stamp, value)
        }
        Event::Sustaining {
            value,
            elapsed,
            required,
        } => format!(
            "[{}] Memory: {:.2}% ({:.0}s / {:.0}s)",
            stamp,
            value,
            elapsed.as_secs_f64(),
            required.as_secs_f64()
        ),
        Event::Escalated {
            value,
            elapsed,
            required,
        } => format!(
            "[{}] Memory: {:.2}% ({:.0}s / {:.0}s) SUSTAINED BREACH, giving up",
            stamp,
            value,
            elapsed.as_secs_f64(),
            required.as_secs_f64()
        ),
    }
}

/// Writes themed status lines to an output stream.
#[derive(Debug)]
pub struct StatusPrinter<W> {
    out: W,
    theme: Theme,
}

impl<W: Write> StatusPrinter<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self { out, theme }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print_banner(&mut self, policy: &BreachPolicy, source: &str) -> io::Result<()> {
        let [title, threshold] = render_banner(policy, source);
        writeln!(self.out, "{}", self.theme.paint(self.theme.banner, &title))?;
        writeln!(self.out, "{}", threshold)?;
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn print_event(&mut self, event: &Event, stamp: &str) -> io::Result<()> {
        let line = render_event(event, stamp);
        let style = self.theme.event_style(event);
        writeln!(self.out, "{}", self.theme.paint(style, &line))?;
        self.out.flush()
    }
}
