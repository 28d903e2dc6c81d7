//! Deadline races measured on a [`Clock`].

use crate::clock::Clock;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// The deadline passed before the future completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {deadline:?} elapsed")]
pub struct Elapsed {
    deadline: Duration,
}

impl Elapsed {
    /// The deadline that passed.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Run `future` for at most `deadline` on `clock`.
///
/// The deadline starts counting when this function is called. If it passes
/// first, `future` is dropped, which cancels whatever it was waiting on. When
/// both are ready on the same poll the deadline wins.
///
/// # Examples
///
/// ```rust
/// use recur::clock::{Clock, TokioClock};
/// use recur::timeout::timeout;
/// use std::time::Duration;
///
/// # async fn example() {
/// let clock = TokioClock::new();
/// let slow = clock.sleep(Duration::from_secs(10));
/// let result = timeout(&clock, Duration::from_millis(10), slow).await;
/// assert!(result.is_err());
/// # }
/// ```
pub async fn timeout<K, F>(clock: &K, deadline: Duration, future: F) -> Result<F::Output, Elapsed>
where
    K: Clock + ?Sized,
    F: Future,
{
    let expiry = clock.sleep(deadline);
    tokio::select! {
        biased;
        () = expiry => Err(Elapsed { deadline }),
        output = future => Ok(output),
    }
}
