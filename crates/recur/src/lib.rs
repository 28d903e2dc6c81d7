#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Composable retry and repeat policies for async Rust.
//!
//! This crate separates *when* to run an operation again from *whether* a
//! failure deserves another attempt:
//!
//! - **Schedules** decide whether to continue and how long to wait, and
//!   compose with `intersect`, `union`, `capped`, `jittered` and friends
//! - **Classifiers** mark failures terminal so no schedule can retry them
//! - **Executors** ([`Retry`](executor::Retry), [`Repeat`](executor::Repeat))
//!   drive an operation through a schedule, with an optional overall timeout
//! - **Clocks** abstract time, so [`TestClock`](testing::TestClock) can make
//!   every timing assertion exact and instant
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use recur::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retry = Retry::new(exponential(Duration::from_millis(100), 2.0).intersect(recurs(3)))
//!     .classifier(FailurePolicy::default().retryable_code(429))
//!     .timeout(Duration::from_secs(10));
//!
//! let body = retry
//!     .run(|| async { Ok::<_, Failure>("hello") })
//!     .await?;
//! # let _ = body;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod executor;
pub mod failure;
pub mod schedule;
pub mod testing;
pub mod timeout;

mod property_tests;

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use recur::prelude::*;
/// ```
pub mod prelude {
    pub use crate::classify::{Classify, NeverTerminal};
    pub use crate::clock::{Clock, TokioClock};
    pub use crate::config::{CadenceConfig, RetryConfig};
    pub use crate::error::{ConfigError, RetryError};
    pub use crate::executor::{Operation, Repeat, Retry};
    pub use crate::failure::{Failure, FailurePolicy};
    pub use crate::schedule::{
        BoxSchedule, Decision, Input, Schedule, ScheduleExt, exponential, fixed, forever, once,
        recurs, spaced,
    };
    pub use crate::timeout::{Elapsed, timeout};
}
