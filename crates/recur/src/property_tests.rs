//! Property-based tests for schedules
//!
//! This module uses proptest to generate random schedule parameters and step
//! times, and verifies invariants that must hold for every combination.

#[cfg(test)]
mod tests {
    use crate::schedule::test_support::drive;
    use crate::schedule::*;
    use proptest::prelude::*;
    use std::time::Duration;

    // ===== Strategy Generators =====

    fn arb_millis() -> impl Strategy<Value = Duration> {
        (1u64..5_000u64).prop_map(Duration::from_millis)
    }

    /// Monotonic step times, as a real run would produce.
    fn arb_times() -> impl Strategy<Value = Vec<Duration>> {
        prop::collection::vec(0u64..2_000u64, 1..40).prop_map(|gaps| {
            let mut now = 0;
            gaps.into_iter()
                .map(|gap| {
                    now += gap;
                    Duration::from_millis(now)
                })
                .collect()
        })
    }

    /// Attempt durations.
    fn arb_work() -> impl Strategy<Value = Vec<Duration>> {
        prop::collection::vec((0u64..3_000u64).prop_map(Duration::from_millis), 1..40)
    }

    fn arb_factor() -> impl Strategy<Value = f64> {
        0.0f64..8.0f64
    }

    /// Step a fixed schedule the way an executor would: each attempt takes
    /// its `work` time and starts once the previous delay has passed.
    fn run_fixed(interval: Duration, work: &[Duration]) -> Vec<(Duration, Decision)> {
        let schedule = fixed(interval);
        let mut state = Schedule::<()>::initial(&schedule);
        let mut now = Duration::ZERO;
        let mut steps = Vec::with_capacity(work.len());
        for (index, took) in work.iter().enumerate() {
            now += *took;
            let input = Input {
                attempt: index as u32 + 1,
                now,
                elapsed: now,
                value: &(),
            };
            let (next, decision) = schedule.next(state, &input);
            state = next;
            now += decision.delay().unwrap_or_default();
            steps.push((input.now, decision));
        }
        steps
    }

    // ===== Recurrence Properties =====

    proptest! {
        /// Property: recurs(n) continues exactly n times
        /// Invariant: then every later step stops
        #[test]
        fn prop_recurs_continues_n_times(times in 0u32..50) {
            let steps = vec![Duration::ZERO; times as usize + 5];
            let decisions = drive(&recurs(times), &steps);

            let continues = decisions.iter().take_while(|d| !d.is_stop()).count();
            prop_assert_eq!(continues, times as usize);
            prop_assert!(decisions[times as usize..].iter().all(Decision::is_stop));
        }

        /// Property: once a schedule stops it never resumes
        /// Invariant: holds through intersect with a finite schedule
        #[test]
        fn prop_stop_is_final(times in 0u32..20, interval in arb_millis(), steps in arb_times()) {
            let schedule = spaced(interval).intersect(recurs(times));
            let decisions = drive(&schedule, &steps);

            if let Some(first_stop) = decisions.iter().position(Decision::is_stop) {
                prop_assert!(decisions[first_stop..].iter().all(Decision::is_stop));
            }
        }
    }

    // ===== Delay Properties =====

    proptest! {
        /// Property: fixed delays never exceed the interval
        /// Invariant: the next attempt is always at or before the next tick
        #[test]
        fn prop_fixed_delay_bounded_by_interval(interval in arb_millis(), work in arb_work()) {
            for (_, decision) in run_fixed(interval, &work) {
                let delay = decision.delay().unwrap_or_default();
                prop_assert!(delay <= interval, "delay {:?} > interval {:?}", delay, interval);
            }
        }

        /// Property: fixed ticks land on the grid
        /// Invariant: now + delay is a whole number of intervals after the anchor
        #[test]
        fn prop_fixed_wakeups_on_grid(interval in arb_millis(), work in arb_work()) {
            let steps = run_fixed(interval, &work);
            let anchor = steps[0].0;
            for (now, decision) in steps {
                let delay = decision.delay().unwrap_or_default();
                if delay.is_zero() {
                    continue;
                }
                let offset = (now + delay - anchor).as_nanos();
                prop_assert_eq!(offset % interval.as_nanos(), 0);
            }
        }

        /// Property: exponential delays are non-decreasing for factor >= 1
        /// Invariant: and start at the base delay
        #[test]
        fn prop_exponential_monotonic(base in arb_millis(), factor in 1.0f64..4.0f64) {
            let decisions = drive(&exponential(base, factor), &[Duration::ZERO; 12]);
            let delays: Vec<_> = decisions.iter().filter_map(Decision::delay).collect();

            prop_assert_eq!(delays[0], base);
            for pair in delays.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }

        /// Property: capping bounds every delay
        /// Invariant: regardless of growth factor
        #[test]
        fn prop_capped_delays_bounded(
            base in arb_millis(),
            factor in arb_factor(),
            max in arb_millis(),
        ) {
            let decisions = drive(&exponential(base, factor).capped(max), &[Duration::ZERO; 20]);
            prop_assert!(decisions.iter().filter_map(Decision::delay).all(|d| d <= max));
        }

        /// Property: jitter stays within its band
        /// Invariant: delay in [base * (1 - j), base * (1 + j)]
        #[test]
        fn prop_jitter_within_band(interval in arb_millis(), jitter in 0.0f64..1.0f64) {
            let decisions = drive(&spaced(interval).jittered(jitter), &[Duration::ZERO; 20]);
            let low = interval.as_secs_f64() * (1.0 - jitter) - 1e-6;
            let high = interval.as_secs_f64() * (1.0 + jitter) + 1e-6;
            for delay in decisions.iter().filter_map(Decision::delay) {
                let secs = delay.as_secs_f64();
                prop_assert!(secs >= low && secs <= high, "{} not in [{}, {}]", secs, low, high);
            }
        }
    }

    // ===== Combinator Properties =====

    proptest! {
        /// Property: intersect waits for the longer delay
        /// Invariant: and stops when either side stops
        #[test]
        fn prop_intersect_takes_max(a in arb_millis(), b in arb_millis(), times in 0u32..10) {
            let steps = vec![Duration::ZERO; 12];
            let left = drive(&spaced(a).intersect(recurs(times)), &steps);
            let combined = drive(&spaced(a).intersect(spaced(b)).intersect(recurs(times)), &steps);

            for (single, both) in left.iter().zip(&combined) {
                match single {
                    Decision::Continue(_) => prop_assert_eq!(*both, Decision::Continue(a.max(b))),
                    Decision::Stop => prop_assert_eq!(*both, Decision::Stop),
                }
            }
        }

        /// Property: union waits for the shorter delay
        /// Invariant: and keeps going while either side does
        #[test]
        fn prop_union_takes_min(a in arb_millis(), b in arb_millis(), times in 0u32..10) {
            let steps = vec![Duration::ZERO; 12];
            let decisions = drive(&spaced(a).intersect(recurs(times)).union(spaced(b)), &steps);

            for (index, decision) in decisions.iter().enumerate() {
                let expected = if (index as u32) < times { a.min(b) } else { b };
                prop_assert_eq!(*decision, Decision::Continue(expected));
            }
        }

        /// Property: schedules are deterministic
        /// Invariant: same inputs, same decisions, no state shared across runs
        #[test]
        fn prop_deterministic(interval in arb_millis(), times in 0u32..20, steps in arb_times()) {
            let schedule = fixed(interval).intersect(recurs(times));
            let expected = drive(&schedule, &steps);
            prop_assert_eq!(drive(&schedule, &steps), expected.clone());

            let boxed: BoxSchedule<()> = schedule.boxed();
            prop_assert_eq!(drive(&boxed, &steps), expected);
        }
    }
}
