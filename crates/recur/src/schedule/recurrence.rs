//! Count-bounded and constant-delay schedules.

use super::{Decision, Input, Schedule};
use std::time::Duration;

/// Always continue with no delay. See [`forever`](super::forever).
#[derive(Debug, Clone, Copy, Default)]
pub struct Forever;

impl<I> Schedule<I> for Forever {
    type State = ();

    fn initial(&self) {}

    fn next(&self, state: (), _input: &Input<'_, I>) -> ((), Decision) {
        (state, Decision::Continue(Duration::ZERO))
    }
}

/// Continue a bounded number of times with no delay.
///
/// `Recurs::new(3)` against an always-failing operation yields four attempts:
/// the unconditional first one plus three retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurs {
    times: u32,
}

impl Recurs {
    /// Continue `times` times.
    pub fn new(times: u32) -> Self {
        Self { times }
    }

    /// The configured number of continuations.
    pub fn times(&self) -> u32 {
        self.times
    }
}

impl<I> Schedule<I> for Recurs {
    /// Steps taken so far.
    type State = u32;

    fn initial(&self) -> u32 {
        0
    }

    fn next(&self, taken: u32, _input: &Input<'_, I>) -> (u32, Decision) {
        if taken < self.times {
            (taken + 1, Decision::Continue(Duration::ZERO))
        } else {
            (taken, Decision::Stop)
        }
    }
}

/// Continue indefinitely, always waiting the same `interval` after the
/// previous attempt finished.
///
/// Unlike [`Fixed`](super::Fixed), a slow attempt pushes every later attempt
/// out by its own duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spaced {
    interval: Duration,
}

impl Spaced {
    /// Wait `interval` between attempts.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl<I> Schedule<I> for Spaced {
    type State = ();

    fn initial(&self) {}

    fn next(&self, state: (), _input: &Input<'_, I>) -> ((), Decision) {
        (state, Decision::Continue(self.interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::test_support::{drive, ms};

    #[test]
    fn test_recurs_counts_continuations() {
        let decisions = drive(&Recurs::new(3), &[ms(0); 5]);
        assert_eq!(
            decisions,
            vec![
                Decision::Continue(Duration::ZERO),
                Decision::Continue(Duration::ZERO),
                Decision::Continue(Duration::ZERO),
                Decision::Stop,
                Decision::Stop,
            ]
        );
    }

    #[test]
    fn test_recurs_zero_stops_immediately() {
        assert_eq!(drive(&Recurs::new(0), &[ms(0)]), vec![Decision::Stop]);
    }

    #[test]
    fn test_spaced_ignores_time() {
        let decisions = drive(&Spaced::new(ms(100)), &[ms(0), ms(350), ms(10_000)]);
        assert!(
            decisions
                .iter()
                .all(|decision| *decision == Decision::Continue(ms(100)))
        );
    }
}
