//! Outcome classification: which failures end a run immediately.
//!
//! Classification is opt-in. The default classifier, [`NeverTerminal`],
//! lets the schedule decide on every failure. Any `Fn(&E) -> bool` closure
//! is a classifier, and [`FailurePolicy`](crate::failure::FailurePolicy)
//! classifies the crate's own [`Failure`](crate::failure::Failure) taxonomy.
//!
//! # Examples
//!
//! ```rust
//! use recur::classify::Classify;
//!
//! #[derive(Debug)]
//! enum FetchError {
//!     NotFound,
//!     Unavailable,
//! }
//!
//! // Exhaustive: adding a variant to FetchError breaks this classifier at
//! // compile time instead of silently defaulting.
//! let classifier = |error: &FetchError| match error {
//!     FetchError::NotFound => true,
//!     FetchError::Unavailable => false,
//! };
//!
//! assert!(classifier.is_terminal(&FetchError::NotFound));
//! assert!(!classifier.is_terminal(&FetchError::Unavailable));
//! ```

/// Decides whether a failure is terminal (must not be retried).
///
/// Implementations must be pure. A panic inside `is_terminal` is an engine
/// defect and propagates out of the executor unchanged.
pub trait Classify<E>: Send + Sync {
    /// `true` if `failure` must not be retried.
    fn is_terminal(&self, failure: &E) -> bool;
}

/// Classifier that treats every failure as retryable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverTerminal;

impl<E> Classify<E> for NeverTerminal {
    fn is_terminal(&self, _failure: &E) -> bool {
        false
    }
}

impl<E, F> Classify<E> for F
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn is_terminal(&self, failure: &E) -> bool {
        self(failure)
    }
}
