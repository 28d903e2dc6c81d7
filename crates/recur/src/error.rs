//! Error types for retry runs and configuration.

use std::time::Duration;
use thiserror::Error;

/// Final failure of a retry or repeat run.
///
/// Exactly one of these (or the success value) crosses the engine boundary;
/// intermediate failures are consumed by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError<E> {
    /// The classifier marked the failure as non-retryable.
    #[error("terminal failure on attempt {attempts}: {failure}")]
    Terminal {
        /// The failure that ended the run
        #[source]
        failure: E,
        /// Operation invocations made, including the failing one
        attempts: u32,
    },

    /// The schedule stopped while the operation was still failing. Carries
    /// the last attempt's failure; earlier ones are discarded.
    #[error("retries exhausted after {attempts} attempts: {failure}")]
    Exhausted {
        /// The last failure
        #[source]
        failure: E,
        /// Operation invocations made
        attempts: u32,
    },

    /// The overall deadline elapsed before the run finished.
    #[error("operation timed out after {after:?}")]
    Timeout {
        /// The deadline that elapsed
        after: Duration,
    },
}

impl<E> RetryError<E> {
    /// The operation failure carried by `Terminal` and `Exhausted`.
    pub fn failure(&self) -> Option<&E> {
        match self {
            RetryError::Terminal { failure, .. } | RetryError::Exhausted { failure, .. } => {
                Some(failure)
            }
            RetryError::Timeout { .. } => None,
        }
    }

    /// Take the operation failure out, if any.
    pub fn into_failure(self) -> Option<E> {
        match self {
            RetryError::Terminal { failure, .. } | RetryError::Exhausted { failure, .. } => {
                Some(failure)
            }
            RetryError::Timeout { .. } => None,
        }
    }

    /// Operation invocations made before giving up. `None` for timeouts,
    /// where the in-flight attempt was cancelled.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::Terminal { attempts, .. } | RetryError::Exhausted { attempts, .. } => {
                Some(*attempts)
            }
            RetryError::Timeout { .. } => None,
        }
    }

    /// Check if the classifier ended the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RetryError::Terminal { .. })
    }

    /// Check if the schedule ran out.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Check if the deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RetryError::Timeout { .. })
    }
}

/// Errors raised while loading or validating a [`RetryConfig`](crate::config::RetryConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("invalid retry config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be rendered as TOML.
    #[error("cannot serialize retry config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An environment variable held a value that does not parse.
    #[error("invalid value for {var}: {value:?}")]
    Env {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// The config parsed but describes an unusable policy.
    #[error("invalid retry config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create a new `Invalid` error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
