//! Fixed-rate schedule aligned to an absolute grid.

use super::{Decision, Input, Schedule};
use std::time::Duration;

/// Continue indefinitely on a grid of `interval` ticks.
///
/// The grid is anchored at the time of the first step: the first retry runs
/// at `anchor + interval`, the next at `anchor + 2 * interval`, and so on,
/// however long each attempt takes. When an attempt overruns its next tick,
/// the following attempt starts immediately and the grid realigns to the
/// latest tick not after the current time. Ticks missed during the overrun
/// are dropped; they are never fired back to back. A step that arrives before
/// the pending tick (for example through [`union`](super::ScheduleExt::union))
/// waits out the remainder of that tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixed {
    interval: Duration,
}

/// Grid position of a [`Fixed`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedState {
    anchor: Duration,
    /// Tick the upcoming attempt was scheduled for.
    last_tick: Duration,
}

impl Fixed {
    /// Tick every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Latest tick not after `now`.
    fn tick_at_or_before(&self, anchor: Duration, now: Duration) -> Duration {
        let behind = now.saturating_sub(anchor).as_nanos();
        let into_period = behind % self.interval.as_nanos();
        let into_period = u64::try_from(into_period).unwrap_or(u64::MAX);
        now.saturating_sub(Duration::from_nanos(into_period))
    }
}

impl<I> Schedule<I> for Fixed {
    type State = Option<FixedState>;

    fn initial(&self) -> Option<FixedState> {
        None
    }

    fn next(
        &self,
        state: Option<FixedState>,
        input: &Input<'_, I>,
    ) -> (Option<FixedState>, Decision) {
        if self.interval.is_zero() {
            return (state, Decision::Continue(Duration::ZERO));
        }

        let now = input.now;
        match state {
            None => {
                let next = FixedState {
                    anchor: now,
                    last_tick: now.saturating_add(self.interval),
                };
                (Some(next), Decision::Continue(self.interval))
            }
            // Stepped before the pending tick: keep waiting for it.
            Some(FixedState { last_tick, .. }) if now < last_tick => {
                (state, Decision::Continue(last_tick - now))
            }
            Some(FixedState { anchor, last_tick }) => {
                let scheduled = last_tick.saturating_add(self.interval);
                if now <= scheduled {
                    let next = FixedState {
                        anchor,
                        last_tick: scheduled,
                    };
                    (Some(next), Decision::Continue(scheduled - now))
                } else {
                    let next = FixedState {
                        anchor,
                        last_tick: self.tick_at_or_before(anchor, now),
                    };
                    (Some(next), Decision::Continue(Duration::ZERO))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::test_support::{drive, ms};
    use crate::schedule::{ScheduleExt, Spaced};

    #[test]
    fn test_fast_attempts_keep_the_period() {
        // Attempts that fail instantly or after 30ms both land on 100ms ticks.
        let decisions = drive(&Fixed::new(ms(100)), &[ms(0), ms(100), ms(230), ms(300)]);
        assert_eq!(
            decisions,
            vec![
                Decision::Continue(ms(100)),
                Decision::Continue(ms(100)),
                Decision::Continue(ms(70)),
                Decision::Continue(ms(100)),
            ]
        );
    }

    #[test]
    fn test_overrun_fires_immediately_and_realigns() {
        // 200ms attempts against a 100ms grid anchored at 200ms.
        let decisions = drive(&Fixed::new(ms(100)), &[ms(200), ms(500), ms(700), ms(900)]);
        assert_eq!(
            decisions,
            vec![
                Decision::Continue(ms(100)),
                Decision::Continue(Duration::ZERO),
                Decision::Continue(Duration::ZERO),
                Decision::Continue(Duration::ZERO),
            ]
        );
    }

    #[test]
    fn test_overrun_off_grid_realigns_to_anchor_grid() {
        // The retry at 100 overruns to 250; it restarts at once, and the next
        // attempt waits for the 300 tick rather than 350.
        let decisions = drive(&Fixed::new(ms(100)), &[ms(0), ms(250), ms(260)]);
        assert_eq!(
            decisions,
            vec![
                Decision::Continue(ms(100)),
                Decision::Continue(Duration::ZERO),
                Decision::Continue(ms(40)),
            ]
        );
    }

    #[test]
    fn test_early_step_waits_for_pending_tick() {
        let decisions = drive(&Fixed::new(ms(100)), &[ms(0), ms(10), ms(60), ms(100)]);
        assert_eq!(
            decisions,
            vec![
                Decision::Continue(ms(100)),
                Decision::Continue(ms(90)),
                Decision::Continue(ms(40)),
                Decision::Continue(ms(100)),
            ]
        );
    }

    #[test]
    fn test_union_with_shorter_schedule_keeps_grid() {
        // The spaced side wakes the run every 30ms; fixed still targets 100.
        let schedule = Fixed::new(ms(100)).union(Spaced::new(ms(30)));
        let decisions = drive(&schedule, &[ms(0), ms(30), ms(60), ms(90), ms(100)]);
        assert_eq!(
            decisions,
            vec![
                Decision::Continue(ms(30)),
                Decision::Continue(ms(30)),
                Decision::Continue(ms(30)),
                Decision::Continue(ms(10)),
                Decision::Continue(ms(30)),
            ]
        );
    }

    #[test]
    fn test_zero_interval_never_waits() {
        let decisions = drive(&Fixed::new(Duration::ZERO), &[ms(0), ms(5), ms(10)]);
        assert!(
            decisions
                .iter()
                .all(|decision| *decision == Decision::Continue(Duration::ZERO))
        );
    }
}
