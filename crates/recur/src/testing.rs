//! Deterministic time for tests.
//!
//! [`TestClock`] is a virtual [`Clock`]: time stands still until the test
//! moves it with [`TestClock::adjust`] or [`TestClock::set_time`]. Retry
//! timing can then be asserted exactly, without real waits.
//!
//! The clock is meant for tokio's current-thread runtime (the default for
//! `#[tokio::test]`). Advancing yields to the runtime so that tasks woken by
//! the advance run, and register their next sleep, before the advance
//! returns.
//!
//! # Examples
//!
//! ```rust
//! use recur::clock::Clock;
//! use recur::testing::TestClock;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let clock = TestClock::new();
//! let sleeper = {
//!     let clock = clock.clone();
//!     tokio::spawn(async move { clock.sleep(Duration::from_millis(100)).await })
//! };
//!
//! clock.adjust(Duration::from_millis(99)).await;
//! assert!(!sleeper.is_finished());
//!
//! clock.adjust(Duration::from_millis(1)).await;
//! assert!(sleeper.is_finished());
//! # }
//! ```

use crate::clock::{Clock, Sleep};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::Duration;
use tracing::trace;

/// Yields granted to runnable tasks before and after every firing.
const SETTLE_YIELDS: usize = 8;

/// Upper bound on extra yields spent waiting for woken sleepers to observe
/// their wakeup.
const MAX_SETTLE_SPINS: usize = 1024;

/// A manually advanced clock.
///
/// Clones share the same timeline.
#[derive(Clone, Default)]
pub struct TestClock {
    inner: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    now: Duration,
    next_id: u64,
    // Keyed by registration id, so iteration order breaks deadline ties.
    sleepers: BTreeMap<u64, Sleeper>,
}

struct Sleeper {
    deadline: Duration,
    fired: bool,
    waker: Option<Waker>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TestClock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `duration`, waking every sleeper whose deadline
    /// falls inside the window, in deadline order.
    pub async fn adjust(&self, duration: Duration) {
        let target = self.now().saturating_add(duration);
        self.advance_to(target).await;
    }

    /// Move time forward to `time`. Setting a time in the past only lets
    /// runnable tasks settle; the clock never goes backwards.
    pub async fn set_time(&self, time: Duration) {
        self.advance_to(time).await;
    }

    /// Number of registered sleeps that have not fired yet.
    pub fn pending_sleepers(&self) -> usize {
        self.inner
            .lock()
            .sleepers
            .values()
            .filter(|sleeper| !sleeper.fired)
            .count()
    }

    /// Deadline of the earliest pending sleep, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner
            .lock()
            .sleepers
            .values()
            .filter(|sleeper| !sleeper.fired)
            .map(|sleeper| sleeper.deadline)
            .min()
    }

    async fn advance_to(&self, target: Duration) {
        self.settle().await;

        while let Some(deadline) = self.fire_next(target) {
            trace!(deadline_ms = deadline.as_millis() as u64, "test clock fired sleepers");
            self.settle().await;
        }

        {
            let mut state = self.inner.lock();
            if state.now < target {
                state.now = target;
            }
        }
        trace!(now_ms = target.as_millis() as u64, "test clock advanced");
        self.settle().await;
    }

    /// Fire every sleeper sharing the earliest deadline not after `target`.
    fn fire_next(&self, target: Duration) -> Option<Duration> {
        let (deadline, wakers) = {
            let mut state = self.inner.lock();
            let deadline = state
                .sleepers
                .values()
                .filter(|sleeper| !sleeper.fired && sleeper.deadline <= target)
                .map(|sleeper| sleeper.deadline)
                .min()?;

            if state.now < deadline {
                state.now = deadline;
            }

            let mut wakers = Vec::new();
            for sleeper in state.sleepers.values_mut() {
                if !sleeper.fired && sleeper.deadline == deadline {
                    sleeper.fired = true;
                    wakers.extend(sleeper.waker.take());
                }
            }
            (deadline, wakers)
        };

        for waker in wakers {
            waker.wake();
        }
        Some(deadline)
    }

    fn has_unobserved_wakeups(&self) -> bool {
        self.inner.lock().sleepers.values().any(|sleeper| sleeper.fired)
    }

    async fn settle(&self) {
        for _ in 0..SETTLE_YIELDS {
            tokio::task::yield_now().await;
        }

        let mut spins = 0;
        while self.has_unobserved_wakeups() && spins < MAX_SETTLE_SPINS {
            tokio::task::yield_now().await;
            spins += 1;
        }
    }
}

impl std::fmt::Debug for TestClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("TestClock")
            .field("now", &state.now)
            .field("sleepers", &state.sleepers.len())
            .finish()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Duration {
        self.inner.lock().now
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        if duration.is_zero() {
            return Box::pin(std::future::ready(()));
        }

        let id = {
            let mut state = self.inner.lock();
            let id = state.next_id;
            state.next_id += 1;
            let deadline = state.now.saturating_add(duration);
            state.sleepers.insert(
                id,
                Sleeper {
                    deadline,
                    fired: false,
                    waker: None,
                },
            );
            id
        };

        Box::pin(VirtualSleep {
            clock: Arc::clone(&self.inner),
            id,
            done: false,
        })
    }
}

struct VirtualSleep {
    clock: Arc<Shared>,
    id: u64,
    done: bool,
}

impl Future for VirtualSleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut state = self.clock.lock();
        let fired = match state.sleepers.get_mut(&self.id) {
            Some(sleeper) if sleeper.fired => true,
            Some(sleeper) => {
                sleeper.waker = Some(cx.waker().clone());
                false
            }
            None => true,
        };

        if fired {
            state.sleepers.remove(&self.id);
            drop(state);
            self.done = true;
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

impl Drop for VirtualSleep {
    fn drop(&mut self) {
        if !self.done {
            self.clock.lock().sleepers.remove(&self.id);
        }
    }
}
