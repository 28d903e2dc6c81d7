//! Schedule combinators. Constructed through [`ScheduleExt`](super::ScheduleExt).

use super::{Decision, Input, Schedule, scale};
use rand::Rng;
use std::fmt;
use std::time::Duration;

/// Continue while both sides continue; wait the longer delay.
#[derive(Debug, Clone, Copy)]
pub struct Intersect<A, B> {
    left: A,
    right: B,
}

impl<A, B> Intersect<A, B> {
    pub(crate) fn new(left: A, right: B) -> Self {
        Self { left, right }
    }
}

impl<I, A, B> Schedule<I> for Intersect<A, B>
where
    A: Schedule<I>,
    B: Schedule<I>,
{
    type State = (A::State, B::State);

    fn initial(&self) -> Self::State {
        (self.left.initial(), self.right.initial())
    }

    fn next(&self, (left, right): Self::State, input: &Input<'_, I>) -> (Self::State, Decision) {
        let (left, left_decision) = self.left.next(left, input);
        let (right, right_decision) = self.right.next(right, input);

        let decision = match (left_decision, right_decision) {
            (Decision::Continue(a), Decision::Continue(b)) => Decision::Continue(a.max(b)),
            _ => Decision::Stop,
        };
        ((left, right), decision)
    }
}

/// Continue while either side continues; wait the shorter delay among the
/// sides that continue.
#[derive(Debug, Clone, Copy)]
pub struct Union<A, B> {
    left: A,
    right: B,
}

impl<A, B> Union<A, B> {
    pub(crate) fn new(left: A, right: B) -> Self {
        Self { left, right }
    }
}

impl<I, A, B> Schedule<I> for Union<A, B>
where
    A: Schedule<I>,
    B: Schedule<I>,
{
    type State = (A::State, B::State);

    fn initial(&self) -> Self::State {
        (self.left.initial(), self.right.initial())
    }

    fn next(&self, (left, right): Self::State, input: &Input<'_, I>) -> (Self::State, Decision) {
        let (left, left_decision) = self.left.next(left, input);
        let (right, right_decision) = self.right.next(right, input);

        let decision = match (left_decision, right_decision) {
            (Decision::Continue(a), Decision::Continue(b)) => Decision::Continue(a.min(b)),
            (Decision::Continue(delay), Decision::Stop)
            | (Decision::Stop, Decision::Continue(delay)) => Decision::Continue(delay),
            (Decision::Stop, Decision::Stop) => Decision::Stop,
        };
        ((left, right), decision)
    }
}

/// Observe every delay without changing it.
#[derive(Clone, Copy)]
pub struct Tap<S, F> {
    inner: S,
    f: F,
}

impl<S, F> Tap<S, F> {
    pub(crate) fn new(inner: S, f: F) -> Self {
        Self { inner, f }
    }
}

impl<S: fmt::Debug, F> fmt::Debug for Tap<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tap")
            .field("inner", &self.inner)
            .field("f", &"<callback>")
            .finish()
    }
}

impl<I, S, F> Schedule<I> for Tap<S, F>
where
    S: Schedule<I>,
    F: Fn(Duration) + Send + Sync,
{
    type State = S::State;

    fn initial(&self) -> S::State {
        self.inner.initial()
    }

    fn next(&self, state: S::State, input: &Input<'_, I>) -> (S::State, Decision) {
        let (state, decision) = self.inner.next(state, input);
        if let Decision::Continue(delay) = decision {
            (self.f)(delay);
        }
        (state, decision)
    }
}

/// Clamp every delay to a maximum.
#[derive(Debug, Clone, Copy)]
pub struct Capped<S> {
    inner: S,
    max: Duration,
}

impl<S> Capped<S> {
    pub(crate) fn new(inner: S, max: Duration) -> Self {
        Self { inner, max }
    }
}

impl<I, S: Schedule<I>> Schedule<I> for Capped<S> {
    type State = S::State;

    fn initial(&self) -> S::State {
        self.inner.initial()
    }

    fn next(&self, state: S::State, input: &Input<'_, I>) -> (S::State, Decision) {
        let (state, decision) = self.inner.next(state, input);
        let decision = match decision {
            Decision::Continue(delay) => Decision::Continue(delay.min(self.max)),
            Decision::Stop => Decision::Stop,
        };
        (state, decision)
    }
}

/// Randomize every delay.
///
/// A jitter of 0.1 scales each delay by a uniformly drawn factor in
/// `[0.9, 1.1]`. Jitter is clamped to `[0.0, 1.0]`; zero leaves delays
/// untouched and keeps the schedule deterministic.
#[derive(Debug, Clone, Copy)]
pub struct Jittered<S> {
    inner: S,
    jitter: f64,
}

impl<S> Jittered<S> {
    pub(crate) fn new(inner: S, jitter: f64) -> Self {
        let jitter = if jitter.is_nan() {
            0.0
        } else {
            jitter.clamp(0.0, 1.0)
        };
        Self { inner, jitter }
    }
}

impl<I, S: Schedule<I>> Schedule<I> for Jittered<S> {
    type State = S::State;

    fn initial(&self) -> S::State {
        self.inner.initial()
    }

    fn next(&self, state: S::State, input: &Input<'_, I>) -> (S::State, Decision) {
        let (state, decision) = self.inner.next(state, input);
        let decision = match decision {
            Decision::Continue(delay) if self.jitter > 0.0 => {
                let factor = rand::thread_rng().gen_range(1.0 - self.jitter..=1.0 + self.jitter);
                Decision::Continue(scale(delay, factor))
            }
            other => other,
        };
        (state, decision)
    }
}

/// Stop once the run's elapsed time reaches a budget.
#[derive(Debug, Clone, Copy)]
pub struct Within<S> {
    inner: S,
    budget: Duration,
}

impl<S> Within<S> {
    pub(crate) fn new(inner: S, budget: Duration) -> Self {
        Self { inner, budget }
    }
}

impl<I, S: Schedule<I>> Schedule<I> for Within<S> {
    type State = S::State;

    fn initial(&self) -> S::State {
        self.inner.initial()
    }

    fn next(&self, state: S::State, input: &Input<'_, I>) -> (S::State, Decision) {
        let (state, decision) = self.inner.next(state, input);
        if input.elapsed >= self.budget {
            (state, Decision::Stop)
        } else {
            (state, decision)
        }
    }
}
