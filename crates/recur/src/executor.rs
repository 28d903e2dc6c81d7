//! Drivers that run an operation according to a schedule.
//!
//! - [`Retry`] re-runs a failing operation until it succeeds, the classifier
//!   marks a failure terminal, or the schedule stops.
//! - [`Repeat`] re-runs a succeeding operation until the schedule stops or
//!   an attempt fails.
//!
//! Both make the first attempt unconditionally, run attempts strictly one
//! after another, and only suspend between attempts. An optional overall
//! timeout races the whole run against a deadline on the same clock.
//!
//! # Examples
//!
//! ```rust
//! use recur::executor::Retry;
//! use recur::schedule::{exponential, recurs, ScheduleExt};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retry = Retry::new(exponential(Duration::from_millis(10), 2.0).intersect(recurs(3)))
//!     .timeout(Duration::from_secs(5));
//!
//! let value = retry.run(|| async { Ok::<_, std::io::Error>(42) }).await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use crate::classify::{Classify, NeverTerminal};
use crate::clock::{Clock, TokioClock};
use crate::error::RetryError;
use crate::schedule::{Decision, Input, Schedule};
use crate::timeout::timeout;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A zero-argument asynchronous unit of work.
///
/// Implemented for every `Fn() -> impl Future<Output = Result<T, E>>`
/// closure. The executors invoke it once per attempt and never run two
/// invocations at the same time.
pub trait Operation: Send + Sync {
    /// Success value.
    type Output: Send;
    /// Failure value.
    type Failure: Send;

    /// Run one attempt.
    fn invoke(&self) -> impl Future<Output = Result<Self::Output, Self::Failure>> + Send;
}

impl<F, Fut, T, E> Operation for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Send,
{
    type Output = T;
    type Failure = E;

    fn invoke(&self) -> impl Future<Output = Result<T, E>> + Send {
        self()
    }
}

/// Retries an operation according to a schedule and a classifier.
///
/// ```text
/// Idle -> Attempting -> Succeeded
///                    -> Classifying -> Terminal
///                                   -> Scheduling -> Exhausted
///                                                 -> Suspended -> Attempting
/// ```
#[derive(Debug, Clone)]
pub struct Retry<S, C = NeverTerminal, K = TokioClock> {
    schedule: S,
    classifier: C,
    clock: K,
    timeout: Option<Duration>,
}

impl<S> Retry<S> {
    /// Retry according to `schedule`, retrying every failure, on real time.
    pub fn new(schedule: S) -> Self {
        Self {
            schedule,
            classifier: NeverTerminal,
            clock: TokioClock::new(),
            timeout: None,
        }
    }
}

impl<S, C, K> Retry<S, C, K> {
    /// Use `classifier` to decide which failures are terminal.
    pub fn classifier<C2>(self, classifier: C2) -> Retry<S, C2, K> {
        Retry {
            schedule: self.schedule,
            classifier,
            clock: self.clock,
            timeout: self.timeout,
        }
    }

    /// Measure delays and the timeout on `clock`.
    pub fn clock<K2: Clock>(self, clock: K2) -> Retry<S, C, K2> {
        Retry {
            schedule: self.schedule,
            classifier: self.classifier,
            clock,
            timeout: self.timeout,
        }
    }

    /// Bound the whole run, waits included, by `deadline`.
    pub fn timeout(mut self, deadline: Duration) -> Self {
        self.timeout = Some(deadline);
        self
    }

    /// The schedule driving this executor.
    pub fn schedule(&self) -> &S {
        &self.schedule
    }

    /// The configured overall deadline.
    pub fn deadline(&self) -> Option<Duration> {
        self.timeout
    }
}

impl<S, C, K: Clock> Retry<S, C, K> {
    /// Run `operation` to completion.
    ///
    /// Returns the first success, or the failure that ended the run. The
    /// schedule state is fresh for every call.
    pub async fn run<O>(&self, operation: O) -> Result<O::Output, RetryError<O::Failure>>
    where
        O: Operation,
        O::Failure: Display,
        S: Schedule<O::Failure>,
        C: Classify<O::Failure>,
    {
        match self.timeout {
            Some(deadline) => match timeout(&self.clock, deadline, self.drive(&operation)).await {
                Ok(outcome) => outcome,
                Err(elapsed) => {
                    warn!(
                        deadline_ms = elapsed.deadline().as_millis() as u64,
                        "retry run timed out"
                    );
                    Err(RetryError::Timeout {
                        after: elapsed.deadline(),
                    })
                }
            },
            None => self.drive(&operation).await,
        }
    }

    async fn drive<O>(&self, operation: &O) -> Result<O::Output, RetryError<O::Failure>>
    where
        O: Operation,
        O::Failure: Display,
        S: Schedule<O::Failure>,
        C: Classify<O::Failure>,
    {
        let started = self.clock.now();
        let mut state = self.schedule.initial();
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            debug!(attempt, "starting attempt");

            let failure = match operation.invoke().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(attempts = attempt, "operation succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if self.classifier.is_terminal(&failure) {
                warn!(attempt, error = %failure, "terminal failure, not retrying");
                return Err(RetryError::Terminal {
                    failure,
                    attempts: attempt,
                });
            }

            let decision = {
                let now = self.clock.now();
                let input = Input {
                    attempt,
                    now,
                    elapsed: now.saturating_sub(started),
                    value: &failure,
                };
                let (next, decision) = self.schedule.next(state, &input);
                state = next;
                decision
            };

            match decision {
                Decision::Stop => {
                    warn!(attempts = attempt, error = %failure, "retries exhausted");
                    return Err(RetryError::Exhausted {
                        failure,
                        attempts: attempt,
                    });
                }
                Decision::Continue(delay) => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "attempt failed, retrying"
                    );
                    drop(failure);
                    pause(&self.clock, delay).await;
                }
            }
        }
    }
}

/// Repeats a succeeding operation according to a schedule.
///
/// The schedule is fed each success value. The run ends with the last
/// success once the schedule stops, or with
/// [`RetryError::Terminal`] as soon as an attempt fails.
#[derive(Debug, Clone)]
pub struct Repeat<S, K = TokioClock> {
    schedule: S,
    clock: K,
    timeout: Option<Duration>,
}

impl<S> Repeat<S> {
    /// Repeat according to `schedule`, on real time.
    pub fn new(schedule: S) -> Self {
        Self {
            schedule,
            clock: TokioClock::new(),
            timeout: None,
        }
    }
}

impl<S, K> Repeat<S, K> {
    /// Measure delays and the timeout on `clock`.
    pub fn clock<K2: Clock>(self, clock: K2) -> Repeat<S, K2> {
        Repeat {
            schedule: self.schedule,
            clock,
            timeout: self.timeout,
        }
    }

    /// Bound the whole run, waits included, by `deadline`.
    pub fn timeout(mut self, deadline: Duration) -> Self {
        self.timeout = Some(deadline);
        self
    }
}

impl<S, K: Clock> Repeat<S, K> {
    /// Run `operation` until the schedule stops.
    pub async fn run<O>(&self, operation: O) -> Result<O::Output, RetryError<O::Failure>>
    where
        O: Operation,
        O::Failure: Display,
        S: Schedule<O::Output>,
    {
        match self.timeout {
            Some(deadline) => match timeout(&self.clock, deadline, self.drive(&operation)).await {
                Ok(outcome) => outcome,
                Err(elapsed) => {
                    warn!(
                        deadline_ms = elapsed.deadline().as_millis() as u64,
                        "repeat run timed out"
                    );
                    Err(RetryError::Timeout {
                        after: elapsed.deadline(),
                    })
                }
            },
            None => self.drive(&operation).await,
        }
    }

    async fn drive<O>(&self, operation: &O) -> Result<O::Output, RetryError<O::Failure>>
    where
        O: Operation,
        O::Failure: Display,
        S: Schedule<O::Output>,
    {
        let started = self.clock.now();
        let mut state = self.schedule.initial();
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            debug!(attempt, "starting repetition");

            let value = match operation.invoke().await {
                Ok(value) => value,
                Err(failure) => {
                    warn!(attempt, error = %failure, "repetition failed");
                    return Err(RetryError::Terminal {
                        failure,
                        attempts: attempt,
                    });
                }
            };

            let decision = {
                let now = self.clock.now();
                let input = Input {
                    attempt,
                    now,
                    elapsed: now.saturating_sub(started),
                    value: &value,
                };
                let (next, decision) = self.schedule.next(state, &input);
                state = next;
                decision
            };

            match decision {
                Decision::Stop => {
                    debug!(repetitions = attempt, "schedule complete");
                    return Ok(value);
                }
                Decision::Continue(delay) => {
                    drop(value);
                    pause(&self.clock, delay).await;
                }
            }
        }
    }
}

/// Wait out an inter-attempt delay.
///
/// A zero delay still yields once, so a deadline racing the run gets polled
/// even when the schedule never waits.
async fn pause<K: Clock + ?Sized>(clock: &K, delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        clock.sleep(delay).await;
    }
}
