//! Declarative retry policies.
//!
//! A [`RetryConfig`] describes a schedule, a classifier and a deadline in
//! plain data, so a policy can live in a TOML file or in environment
//! variables and be turned into a [`Retry`] executor at startup.
//!
//! ```toml
//! max_retries = 5
//! timeout_ms = 10000
//! jitter = 0.1
//!
//! [cadence]
//! kind = "exponential"
//! base_ms = 200
//! factor = 2.0
//!
//! [classify]
//! retryable_codes = [429]
//! ```

use crate::error::ConfigError;
use crate::executor::Retry;
use crate::failure::{Failure, FailurePolicy};
use crate::schedule::{BoxSchedule, ScheduleExt, exponential, fixed, forever, recurs, spaced};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BASE_MS: u64 = 100;
const DEFAULT_FACTOR: f64 = 2.0;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_MAX_DELAY_MS: u64 = 60_000;

fn default_base_ms() -> u64 {
    DEFAULT_BASE_MS
}

fn default_factor() -> f64 {
    DEFAULT_FACTOR
}

/// How delays between attempts are spaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CadenceConfig {
    /// Retry without waiting.
    Immediate,
    /// Retry on an absolute grid of `interval_ms` ticks.
    Fixed {
        /// Grid interval in milliseconds
        interval_ms: u64,
    },
    /// Wait `interval_ms` after each failed attempt.
    Spaced {
        /// Pause in milliseconds
        interval_ms: u64,
    },
    /// Wait `base_ms * factor^k` before retry `k + 1`.
    Exponential {
        /// First delay in milliseconds
        #[serde(default = "default_base_ms")]
        base_ms: u64,
        /// Growth per retry
        #[serde(default = "default_factor")]
        factor: f64,
    },
}

impl Default for CadenceConfig {
    fn default() -> Self {
        CadenceConfig::Exponential {
            base_ms: DEFAULT_BASE_MS,
            factor: DEFAULT_FACTOR,
        }
    }
}

impl CadenceConfig {
    /// Cadence of the given kind with default timing.
    pub fn named(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "immediate" => Some(CadenceConfig::Immediate),
            "fixed" => Some(CadenceConfig::Fixed {
                interval_ms: DEFAULT_BASE_MS,
            }),
            "spaced" => Some(CadenceConfig::Spaced {
                interval_ms: DEFAULT_BASE_MS,
            }),
            "exponential" => Some(CadenceConfig::default()),
            _ => None,
        }
    }

    /// Replace the interval (fixed, spaced) or base delay (exponential).
    fn with_base_ms(self, millis: u64) -> Self {
        match self {
            CadenceConfig::Immediate => CadenceConfig::Immediate,
            CadenceConfig::Fixed { .. } => CadenceConfig::Fixed {
                interval_ms: millis,
            },
            CadenceConfig::Spaced { .. } => CadenceConfig::Spaced {
                interval_ms: millis,
            },
            CadenceConfig::Exponential { factor, .. } => CadenceConfig::Exponential {
                base_ms: millis,
                factor,
            },
        }
    }

    fn with_factor(self, factor: f64) -> Self {
        match self {
            CadenceConfig::Exponential { base_ms, .. } => {
                CadenceConfig::Exponential { base_ms, factor }
            }
            other => other,
        }
    }

    fn schedule<I: 'static>(&self) -> BoxSchedule<I> {
        match *self {
            CadenceConfig::Immediate => forever().boxed(),
            CadenceConfig::Fixed { interval_ms } => {
                fixed(Duration::from_millis(interval_ms)).boxed()
            }
            CadenceConfig::Spaced { interval_ms } => {
                spaced(Duration::from_millis(interval_ms)).boxed()
            }
            CadenceConfig::Exponential { base_ms, factor } => {
                exponential(Duration::from_millis(base_ms), factor).boxed()
            }
        }
    }
}

/// A complete retry policy as data.
///
/// Missing fields take their defaults: exponential backoff from 100ms with
/// factor 2.0, at most 3 retries, delays capped at 60s, no jitter, no
/// deadline, and 4xx status codes treated as terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt; `None` retries without limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Overall deadline for a run, waits included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Upper bound on any single delay.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,

    /// Stop retrying once a run has been going this long.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_elapsed_ms: Option<u64>,

    /// Random spread applied to each delay, within `0.0..=1.0`.
    pub jitter: f64,

    /// Delay pattern.
    pub cadence: CadenceConfig,

    /// Which failures are terminal.
    pub classify: FailurePolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: Some(DEFAULT_MAX_RETRIES),
            timeout_ms: None,
            max_delay_ms: Some(DEFAULT_MAX_DELAY_MS),
            max_elapsed_ms: None,
            jitter: 0.0,
            cadence: CadenceConfig::default(),
            classify: FailurePolicy::default(),
        }
    }
}

impl RetryConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    ///
    /// TOML has no way to spell "no limit", and a missing key reads back as
    /// the default, so configs with `max_retries` or `max_delay_ms` set to
    /// `None` are rejected rather than rendered as a different policy.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        if self.max_retries.is_none() {
            return Err(ConfigError::invalid(
                "an unlimited max_retries cannot be written as TOML",
            ));
        }
        if self.max_delay_ms.is_none() {
            return Err(ConfigError::invalid(
                "an uncapped max_delay_ms cannot be written as TOML",
            ));
        }
        Ok(toml::to_string(self)?)
    }

    /// Create a config from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// Recognized variables:
    /// - `RECUR_MAX_RETRIES`
    /// - `RECUR_TIMEOUT_MS`
    /// - `RECUR_MAX_DELAY_MS`
    /// - `RECUR_MAX_ELAPSED_MS`
    /// - `RECUR_JITTER`
    /// - `RECUR_CADENCE` (`immediate`, `fixed`, `spaced` or `exponential`)
    /// - `RECUR_BASE_MS` (interval for fixed and spaced, base for exponential)
    /// - `RECUR_FACTOR`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(max_retries) = env_parse("RECUR_MAX_RETRIES")? {
            config.max_retries = Some(max_retries);
        }

        if let Some(timeout_ms) = env_parse("RECUR_TIMEOUT_MS")? {
            config.timeout_ms = Some(timeout_ms);
        }

        if let Some(max_delay_ms) = env_parse("RECUR_MAX_DELAY_MS")? {
            config.max_delay_ms = Some(max_delay_ms);
        }

        if let Some(max_elapsed_ms) = env_parse("RECUR_MAX_ELAPSED_MS")? {
            config.max_elapsed_ms = Some(max_elapsed_ms);
        }

        if let Some(jitter) = env_parse("RECUR_JITTER")? {
            config.jitter = jitter;
        }

        // Cadence kind first, so the timing variables refine it
        if let Ok(kind) = env::var("RECUR_CADENCE") {
            config.cadence = CadenceConfig::named(&kind).ok_or(ConfigError::Env {
                var: "RECUR_CADENCE",
                value: kind,
            })?;
        }

        if let Some(base_ms) = env_parse("RECUR_BASE_MS")? {
            config.cadence = config.cadence.with_base_ms(base_ms);
        }

        if let Some(factor) = env_parse("RECUR_FACTOR")? {
            config.cadence = config.cadence.with_factor(factor);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the policy is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::invalid(format!(
                "jitter must be within 0.0..=1.0, got {}",
                self.jitter
            )));
        }

        match self.cadence {
            CadenceConfig::Fixed { interval_ms: 0 } | CadenceConfig::Spaced { interval_ms: 0 } => {
                Err(ConfigError::invalid("cadence interval_ms must be positive"))
            }
            CadenceConfig::Exponential { factor, .. } if !factor.is_finite() || factor < 0.0 => {
                Err(ConfigError::invalid(format!(
                    "exponential factor must be finite and non-negative, got {factor}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// The overall deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Build the schedule this config describes.
    ///
    /// Layers, innermost first: cadence, jitter, delay cap, elapsed budget,
    /// retry limit.
    pub fn schedule<I: 'static>(&self) -> Result<BoxSchedule<I>, ConfigError> {
        self.validate()?;

        let mut schedule = self.cadence.schedule();
        if self.jitter > 0.0 {
            schedule = schedule.jittered(self.jitter).boxed();
        }
        if let Some(max_delay_ms) = self.max_delay_ms {
            schedule = schedule.capped(Duration::from_millis(max_delay_ms)).boxed();
        }
        if let Some(max_elapsed_ms) = self.max_elapsed_ms {
            schedule = schedule.within(Duration::from_millis(max_elapsed_ms)).boxed();
        }
        if let Some(max_retries) = self.max_retries {
            schedule = schedule.intersect(recurs(max_retries)).boxed();
        }
        Ok(schedule)
    }

    /// Build a real-time executor for [`Failure`]-returning operations.
    pub fn executor(&self) -> Result<Retry<BoxSchedule<Failure>, FailurePolicy>, ConfigError> {
        let retry = Retry::new(self.schedule()?).classifier(self.classify.clone());
        Ok(match self.timeout() {
            Some(deadline) => retry.timeout(deadline),
            None => retry,
        })
    }
}

/// Read and parse `var`. Unset is `None`; set but unparsable is an error.
fn env_parse<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
        Err(_) => Ok(None),
    }
}
