//! Theme configuration for the status lines.
//!
//! Supports light and dark themes with automatic terminal detection, and a
//! plain theme for pipes, log files and `NO_COLOR`.

use std::io::IsTerminal;

use crossterm::style::{Attribute, Attributes, Color, ContentStyle};

use crate::data::Event;

/// Color theme for console output.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Startup banner.
    pub banner: ContentStyle,
    /// Readings below the threshold.
    pub normal: ContentStyle,
    /// Readings in breach that have not escalated yet.
    pub breaching: ContentStyle,
    /// Failed queries.
    pub error: ContentStyle,
    /// The escalation line.
    pub escalation: ContentStyle,
    /// When false, text is written without escape sequences.
    pub colored: bool,
}

fn fg(color: Color) -> ContentStyle {
    ContentStyle {
        foreground_color: Some(color),
        ..ContentStyle::default()
    }
}

fn bold(color: Color) -> ContentStyle {
    ContentStyle {
        attributes: Attributes::from(Attribute::Bold),
        ..fg(color)
    }
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            banner: fg(Color::DarkGrey),
            normal: fg(Color::Green),
            breaching: fg(Color::Yellow),
            error: fg(Color::Red),
            escalation: bold(Color::Red),
            colored: true,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            banner: fg(Color::DarkGrey),
            normal: fg(Color::DarkGreen),
            breaching: fg(Color::DarkYellow),
            error: fg(Color::DarkRed),
            escalation: bold(Color::DarkRed),
            colored: true,
        }
    }

    /// No colors at all.
    pub fn plain() -> Self {
        Self {
            colored: false,
            ..Self::dark()
        }
    }

    /// Auto-detect based on stdout and terminal background
    pub fn auto_detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if no_color || !std::io::stdout().is_terminal() {
            return Self::plain();
        }

        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for a breach event
    pub fn event_style(&self, event: &Event) -> ContentStyle {
        match event {
            Event::Normal { .. } => self.normal,
            Event::Entered { .. } | Event::Sustaining { .. } => self.breaching,
            Event::QueryFailed(_) => self.error,
            Event::Escalated { .. } => self.escalation,
        }
    }

    /// Apply `style` to `text` if this theme is colored.
    pub fn paint(&self, style: ContentStyle, text: &str) -> String {
        if self.colored {
            style.apply(text).to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_theme_leaves_text_alone() {
        let theme = Theme::plain();
        assert_eq!(theme.paint(theme.error, "ERROR"), "ERROR");
    }

    #[test]
    fn test_event_styles() {
        let theme = Theme::dark();
        assert_eq!(
            theme.event_style(&Event::Normal { value: 1.0 }).foreground_color,
            Some(Color::Green)
        );
        assert_eq!(
            theme.event_style(&Event::Entered { value: 80.0 }).foreground_color,
            Some(Color::Yellow)
        );
        assert_eq!(
            theme.event_style(&Event::QueryFailed(crate::QueryError::NoData)).foreground_color,
            Some(Color::Red)
        );
        let escalation = theme.event_style(&Event::Escalated {
            value: 90.0,
            elapsed: std::time::Duration::from_secs(10),
            required: std::time::Duration::from_secs(10),
        });
        assert!(escalation.attributes.has(Attribute::Bold));
    }
}
