//! Composable descriptions of when, and how often, to run an operation again.
//!
//! A [`Schedule`] is a pure decision function. Every run starts from
//! [`Schedule::initial`], and each decision consumes the previous state token
//! and hands back the next one, so a single schedule value can drive any
//! number of concurrent runs without interference.
//!
//! # Key Types
//!
//! - [`Schedule`] - core trait
//! - [`Decision`] - continue after a delay, or stop
//! - [`Input`] - what a schedule sees at each step
//! - [`ScheduleExt`] - combinators (`intersect`, `union`, `tap`, ...)
//!
//! # Examples
//!
//! ```rust
//! use recur::schedule::{exponential, recurs, ScheduleExt};
//! use std::time::Duration;
//!
//! // Back off 100ms, 200ms, 400ms, ... but never more than 3 retries.
//! let schedule = exponential(Duration::from_millis(100), 2.0).intersect(recurs(3));
//! # let _ = schedule;
//! ```

mod boxed;
mod combinators;
mod exponential;
mod fixed;
mod recurrence;

pub use boxed::{BoxSchedule, BoxState};
pub use combinators::{Capped, Intersect, Jittered, Tap, Union, Within};
pub use exponential::Exponential;
pub use fixed::{Fixed, FixedState};
pub use recurrence::{Forever, Recurs, Spaced};

use std::time::Duration;

/// Outcome of a single schedule step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run again after waiting this long.
    Continue(Duration),
    /// Do not run again.
    Stop,
}

impl Decision {
    /// The delay, if the schedule continues.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            Decision::Continue(delay) => Some(*delay),
            Decision::Stop => None,
        }
    }

    /// Whether the schedule stopped.
    pub fn is_stop(&self) -> bool {
        matches!(self, Decision::Stop)
    }
}

/// What a schedule is told at each step.
#[derive(Debug)]
pub struct Input<'a, I> {
    /// 1-based number of the attempt that just finished.
    pub attempt: u32,
    /// Current time on the run's clock.
    pub now: Duration,
    /// Time since the run began.
    pub elapsed: Duration,
    /// The failure (when retrying) or the success value (when repeating)
    /// produced by the attempt that just finished.
    pub value: &'a I,
}

impl<I> Clone for Input<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for Input<'_, I> {}

/// A policy deciding whether to run again and how long to wait first.
///
/// `I` is the type of value the schedule is fed: the operation's failure for
/// retries, its success value for repeats. Most schedules ignore it and are
/// implemented for every `I`.
///
/// Implementations must be deterministic in `state` and `input` (jittered
/// schedules excepted) and must never panic for valid inputs; a panic here is
/// an engine defect and is not caught by the executors.
pub trait Schedule<I>: Send + Sync {
    /// Per-run state token.
    type State: Send;

    /// State for a fresh run.
    fn initial(&self) -> Self::State;

    /// Decide the next step.
    fn next(&self, state: Self::State, input: &Input<'_, I>) -> (Self::State, Decision);
}

/// Continue exactly once, immediately.
pub fn once() -> Recurs {
    Recurs::new(1)
}

/// Always continue, immediately.
pub fn forever() -> Forever {
    Forever
}

/// Continue `times` times, immediately, then stop.
pub fn recurs(times: u32) -> Recurs {
    Recurs::new(times)
}

/// Continue on an absolute grid of `interval` ticks.
pub fn fixed(interval: Duration) -> Fixed {
    Fixed::new(interval)
}

/// Continue after `interval`, counted from the end of each attempt.
pub fn spaced(interval: Duration) -> Spaced {
    Spaced::new(interval)
}

/// Continue after `base * factor^k` on step `k` (0-indexed).
pub fn exponential(base: Duration, factor: f64) -> Exponential {
    Exponential::new(base, factor)
}

/// Combinators available on every schedule.
pub trait ScheduleExt: Sized {
    /// Continue only while both schedules continue, waiting the longer of
    /// the two delays.
    fn intersect<B>(self, other: B) -> Intersect<Self, B> {
        Intersect::new(self, other)
    }

    /// Continue while either schedule continues, waiting the shorter of the
    /// delays among those that continue.
    fn union<B>(self, other: B) -> Union<Self, B> {
        Union::new(self, other)
    }

    /// Call `f` with every delay the schedule produces, without changing it.
    fn tap<F>(self, f: F) -> Tap<Self, F>
    where
        F: Fn(Duration) + Send + Sync,
    {
        Tap::new(self, f)
    }

    /// Clamp every delay to at most `max`.
    fn capped(self, max: Duration) -> Capped<Self> {
        Capped::new(self, max)
    }

    /// Scale every delay by a random factor in `[1 - jitter, 1 + jitter]`.
    fn jittered(self, jitter: f64) -> Jittered<Self> {
        Jittered::new(self, jitter)
    }

    /// Stop once the run has been going for `budget`.
    fn within(self, budget: Duration) -> Within<Self> {
        Within::new(self, budget)
    }

    /// Erase the schedule's type.
    fn boxed<I>(self) -> BoxSchedule<I>
    where
        Self: Schedule<I> + 'static,
        I: 'static,
    {
        BoxSchedule::new(self)
    }
}

impl<S> ScheduleExt for S {}

/// Multiply `duration` by `factor`, saturating instead of overflowing.
///
/// Negative and NaN factors yield zero.
pub(crate) fn scale(duration: Duration, factor: f64) -> Duration {
    let nanos = duration.as_nanos() as f64 * factor;
    if nanos.is_nan() || nanos <= 0.0 {
        Duration::ZERO
    } else if nanos >= u64::MAX as f64 {
        Duration::MAX
    } else {
        Duration::from_nanos(nanos.round() as u64)
    }
}
