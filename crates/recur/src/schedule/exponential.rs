//! Exponential backoff.

use super::{Decision, Input, Schedule, scale};
use std::time::Duration;

/// Exponential backoff schedule.
///
/// Delays grow geometrically and the schedule never stops on its own; bound
/// it with [`recurs`](super::recurs), [`capped`](super::ScheduleExt::capped)
/// or [`within`](super::ScheduleExt::within).
///
/// # Mathematical Formula
///
/// For step `k` (0-indexed, i.e. `k = 0` is the wait after the first
/// failure):
/// ```text
/// delay(k) = base * factor ^ k
/// ```
///
/// Results that overflow saturate at `Duration::MAX`; negative or NaN
/// results become zero.
///
/// # Examples
///
/// ```rust
/// use recur::schedule::Exponential;
/// use std::time::Duration;
///
/// let backoff = Exponential::new(Duration::from_millis(100), 2.0);
/// assert_eq!(backoff.delay_for(0), Duration::from_millis(100));
/// assert_eq!(backoff.delay_for(3), Duration::from_millis(800));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    base: Duration,
    factor: f64,
}

impl Exponential {
    /// Start at `base`, multiplying by `factor` each step.
    pub fn new(base: Duration, factor: f64) -> Self {
        Self { base, factor }
    }

    /// Initial delay.
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Growth factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Delay for step `step` (0-indexed).
    pub fn delay_for(&self, step: u32) -> Duration {
        let exponent = i32::try_from(step).unwrap_or(i32::MAX);
        scale(self.base, self.factor.powi(exponent))
    }
}

impl Default for Exponential {
    /// 100ms, doubling each step.
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100),
            factor: 2.0,
        }
    }
}

impl<I> Schedule<I> for Exponential {
    /// Steps taken so far.
    type State = u32;

    fn initial(&self) -> u32 {
        0
    }

    fn next(&self, step: u32, _input: &Input<'_, I>) -> (u32, Decision) {
        (step.saturating_add(1), Decision::Continue(self.delay_for(step)))
    }
}
