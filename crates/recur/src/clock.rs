//! Time sources that schedules and executors measure delays against.
//!
//! Two implementations ship with the crate:
//!
//! - [`TokioClock`] - real time, backed by `tokio::time`
//! - [`TestClock`](crate::testing::TestClock) - virtual time that only moves
//!   when a test advances it
//!
//! # Examples
//!
//! ```rust
//! use recur::clock::{Clock, TokioClock};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let clock = TokioClock::new();
//! let before = clock.now();
//! clock.sleep(Duration::from_millis(5)).await;
//! assert!(clock.now() >= before + Duration::from_millis(5));
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Future returned by [`Clock::sleep`].
pub type Sleep = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A source of scheduling time.
///
/// `now` is monotonic and measured from the clock's own origin, so values are
/// only comparable when they come from the same clock.
///
/// The deadline of a [`sleep`](Clock::sleep) is fixed when `sleep` is called,
/// not when the returned future is first polled. Dropping the future cancels
/// the wait.
pub trait Clock: Send + Sync {
    /// Current time, relative to the clock's origin.
    fn now(&self) -> Duration;

    /// Suspend for `duration`.
    fn sleep(&self, duration: Duration) -> Sleep;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        (**self).sleep(duration)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        (**self).sleep(duration)
    }
}

/// Real-time clock backed by `tokio::time`.
///
/// Honors tokio's paused time (`tokio::time::pause`), so it is also usable
/// under `#[tokio::test(start_paused = true)]`.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    /// Create a clock whose origin is the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        Box::pin(tokio::time::sleep(duration))
    }
}
