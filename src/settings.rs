//! Runtime configuration.
//!
//! Settings are layered, lowest priority first:
//!
//! 1. built-in defaults
//! 2. an optional config file (`--config memwatch.toml`, format from extension)
//! 3. `MEMWATCH_*` environment variables (e.g. `MEMWATCH_THRESHOLD=90`)
//! 4. command-line flags
//!
//! Settings are fixed once loaded.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::warn;

use crate::data::duration::parse_duration;
use crate::data::BreachPolicy;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "MEMWATCH";

pub const DEFAULT_URL: &str = "http://localhost:9090";

/// Settings as they appear in files and the environment.
#[derive(Debug, Deserialize)]
struct RawSettings {
    url: String,
    threshold: f64,
    duration: String,
    interval: String,
    timeout: String,
}

/// Validated monitor settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Base URL of the Prometheus server.
    pub url: String,
    /// Percentage at or above which a reading is a breach.
    pub threshold: f64,
    /// How long a breach must last before escalating.
    pub duration: Duration,
    /// Time between samples.
    pub interval: Duration,
    /// Upper bound for a single query.
    pub timeout: Duration,
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub threshold: Option<f64>,
    pub duration: Option<Duration>,
    pub interval: Option<Duration>,
    pub timeout: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            threshold: 75.0,
            duration: Duration::from_secs(10),
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
        }
    }
}

impl Settings {
    /// Load settings from defaults, `config_path`, the environment and `overrides`.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(config_path, Environment::with_prefix(ENV_PREFIX), overrides)
    }

    fn load_with_env(
        config_path: Option<&Path>,
        env: Environment,
        overrides: &Overrides,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("url", DEFAULT_URL)?
            .set_default("threshold", 75.0)?
            .set_default("duration", "10s")?
            .set_default("interval", "1s")?
            .set_default("timeout", "5s")?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path));
        }

        let raw: RawSettings = builder
            .add_source(env)
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        let mut settings = Self {
            url: raw.url,
            threshold: raw.threshold,
            duration: parse_duration(&raw.duration).context("Invalid 'duration' setting")?,
            interval: parse_duration(&raw.interval).context("Invalid 'interval' setting")?,
            timeout: parse_duration(&raw.timeout).context("Invalid 'timeout' setting")?,
        };
        settings.apply(overrides);
        settings.validate()?;
        Ok(settings)
    }

    fn apply(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.url {
            self.url = url.clone();
        }
        if let Some(threshold) = overrides.threshold {
            self.threshold = threshold;
        }
        if let Some(duration) = overrides.duration {
            self.duration = duration;
        }
        if let Some(interval) = overrides.interval {
            self.interval = interval;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
    }

    /// Reject settings the monitor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            bail!("'url' must not be empty");
        }
        if !self.threshold.is_finite() {
            bail!("'threshold' must be a finite number, got {}", self.threshold);
        }
        if self.interval.is_zero() {
            bail!("'interval' must be greater than zero");
        }
        if self.timeout.is_zero() {
            bail!("'timeout' must be greater than zero");
        }
        if self.timeout >= self.interval {
            // Ticks are sequential, so a slow query delays the next tick
            // instead of overlapping with it.
            warn!(
                timeout = ?self.timeout,
                interval = ?self.interval,
                "query timeout is not shorter than the poll interval; slow queries will skip ticks"
            );
        }
        Ok(())
    }

    /// Breach policy derived from these settings.
    pub fn policy(&self) -> BreachPolicy {
        BreachPolicy {
            threshold: self.threshold,
            sustain: self.duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "{}", contents).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_env(None, env(&[]), &Overrides::default()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.policy(), BreachPolicy::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = config_file(
            r#"
            url = "http://prometheus.internal:9090"
            threshold = 90
            duration = "1m"
            "#,
        );

        let settings =
            Settings::load_with_env(Some(file.path()), env(&[]), &Overrides::default()).unwrap();

        assert_eq!(settings.url, "http://prometheus.internal:9090");
        assert_eq!(settings.threshold, 90.0);
        assert_eq!(settings.duration, Duration::from_secs(60));
        assert_eq!(settings.interval, Duration::from_secs(1));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = config_file("threshold = 90\n");

        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[("MEMWATCH_THRESHOLD", "60.5"), ("MEMWATCH_INTERVAL", "250ms")]),
            &Overrides::default(),
        )
        .unwrap();

        assert_eq!(settings.threshold, 60.5);
        assert_eq!(settings.interval, Duration::from_millis(250));
    }

    #[test]
    fn test_flags_override_env() {
        let overrides = Overrides {
            threshold: Some(80.0),
            timeout: Some(Duration::from_millis(500)),
            ..Overrides::default()
        };

        let settings =
            Settings::load_with_env(None, env(&[("MEMWATCH_THRESHOLD", "60")]), &overrides)
                .unwrap();

        assert_eq!(settings.threshold, 80.0);
        assert_eq!(settings.timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_duration_in_file() {
        let file = config_file("duration = \"ten seconds\"\n");

        let err = Settings::load_with_env(Some(file.path()), env(&[]), &Overrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("duration"));
    }

    #[test]
    fn test_missing_config_file() {
        let result = Settings::load_with_env(
            Some(Path::new("/nonexistent/memwatch.toml")),
            env(&[]),
            &Overrides::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validation() {
        let zero_interval = Settings {
            interval: Duration::ZERO,
            ..Settings::default()
        };
        assert!(zero_interval.validate().is_err());

        let zero_timeout = Settings {
            timeout: Duration::ZERO,
            ..Settings::default()
        };
        assert!(zero_timeout.validate().is_err());

        let nan = Settings {
            threshold: f64::NAN,
            ..Settings::default()
        };
        assert!(nan.validate().is_err());

        // Allowed, only warned about.
        let slow = Settings {
            timeout: Duration::from_secs(5),
            interval: Duration::from_secs(1),
            ..Settings::default()
        };
        assert!(slow.validate().is_ok());
    }
}
