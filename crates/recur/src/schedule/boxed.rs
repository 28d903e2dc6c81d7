//! Type-erased schedules, for policies chosen at runtime.

use super::{Decision, Input, Schedule};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A schedule whose concrete type has been erased.
///
/// Cloning is cheap and clones share the underlying schedule; each run still
/// gets its own state from [`Schedule::initial`].
pub struct BoxSchedule<I> {
    inner: Arc<dyn Erased<I>>,
}

/// State token of a [`BoxSchedule`] run.
pub struct BoxState<I> {
    run: Box<dyn Run<I>>,
}

trait Erased<I>: Send + Sync {
    fn start(self: Arc<Self>) -> Box<dyn Run<I>>;
}

trait Run<I>: Send {
    fn step(&mut self, input: &Input<'_, I>) -> Decision;
}

struct Running<S: Schedule<I>, I> {
    schedule: Arc<S>,
    state: Option<S::State>,
    _input: PhantomData<fn(&I)>,
}

impl<I, S> Erased<I> for S
where
    S: Schedule<I> + 'static,
    I: 'static,
{
    fn start(self: Arc<Self>) -> Box<dyn Run<I>> {
        let state = Schedule::<I>::initial(&*self);
        Box::new(Running {
            schedule: self,
            state: Some(state),
            _input: PhantomData,
        })
    }
}

impl<I, S: Schedule<I>> Run<I> for Running<S, I> {
    fn step(&mut self, input: &Input<'_, I>) -> Decision {
        // Only empty if a previous step panicked mid-way.
        let Some(state) = self.state.take() else {
            return Decision::Stop;
        };
        let (state, decision) = self.schedule.next(state, input);
        self.state = Some(state);
        decision
    }
}

impl<I: 'static> BoxSchedule<I> {
    /// Erase `schedule`.
    pub fn new<S>(schedule: S) -> Self
    where
        S: Schedule<I> + 'static,
    {
        Self {
            inner: Arc::new(schedule),
        }
    }
}

impl<I> Clone for BoxSchedule<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I> fmt::Debug for BoxSchedule<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxSchedule").finish_non_exhaustive()
    }
}

impl<I> fmt::Debug for BoxState<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxState").finish_non_exhaustive()
    }
}

impl<I> Schedule<I> for BoxSchedule<I> {
    type State = BoxState<I>;

    fn initial(&self) -> BoxState<I> {
        BoxState {
            run: Arc::clone(&self.inner).start(),
        }
    }

    fn next(&self, mut state: BoxState<I>, input: &Input<'_, I>) -> (BoxState<I>, Decision) {
        let decision = state.run.step(input);
        (state, decision)
    }
}

#[cfg(test)]
mod tests {
    use crate::schedule::test_support::{drive, ms};
    use crate::schedule::*;

    #[test]
    fn test_boxed_matches_concrete() {
        let concrete = exponential(ms(100), 2.0).intersect(recurs(2));
        let boxed: BoxSchedule<()> = concrete.boxed();

        let times = [ms(0); 3];
        assert_eq!(drive(&concrete, &times), drive(&boxed, &times));
    }

    #[test]
    fn test_clones_run_independently() {
        let boxed: BoxSchedule<()> = recurs(1).boxed();
        let clone = boxed.clone();

        assert_eq!(drive(&boxed, &[ms(0); 2])[1], Decision::Stop);
        assert_eq!(
            drive(&clone, &[ms(0)]),
            vec![Decision::Continue(std::time::Duration::ZERO)]
        );
    }

    #[test]
    fn test_boxed_composes_further() {
        let boxed: BoxSchedule<()> = spaced(ms(10)).boxed();
        let bounded = boxed.intersect(recurs(1)).boxed();
        assert_eq!(
            drive(&bounded, &[ms(0); 2]),
            vec![Decision::Continue(ms(10)), Decision::Stop]
        );
    }
}
