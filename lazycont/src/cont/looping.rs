use super::trampoline::{Flow, Trampoline};
use super::{Cont, guarded};
use crate::error::ContError;
use crate::outcome::Outcome;

use std::convert::Infallible;
use std::sync::Arc;

/// Verdict of a loop over one iteration's outcome.
pub(crate) enum Decision<B> {
    /// Run another iteration.
    Again,

    /// Stop with this outcome.
    Stop(Outcome<B>),
}

impl<E, A> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Repeats `self` on a trampoline.
    ///
    /// `first` runs the first iteration, `again` every following one.
    /// `decide` is created per execution, so it may carry state such as an
    /// attempt counter.
    pub(crate) fn looped<B, M, D>(first: Cont<E, A>, again: Cont<E, A>, make_decide: M) -> Cont<E, B>
    where
        B: Send + 'static,
        M: Fn() -> D + Send + Sync + 'static,
        D: FnMut(Outcome<A>) -> Decision<B> + Send + 'static,
    {
        Cont::raw(move |runtime, observer| {
            let first = first.clone();
            let again = again.clone();
            let mut decide = make_decide();

            Trampoline::start(runtime.clone(), move |last| match last {
                None => Flow::Run(first.clone()),
                Some(outcome) => match guarded(|| decide(outcome)) {
                    Ok(Decision::Again) => {
                        tracing::trace!("loop iteration");
                        Flow::Run(again.clone())
                    }
                    Ok(Decision::Stop(outcome)) => Flow::settle(&observer, outcome),
                    Err(err) => Flow::settle(&observer, Outcome::Failure(vec![err])),
                },
            });
        })
    }

    /// Re-runs `self` while `predicate` holds for its value.
    ///
    /// Settles with the first value for which `predicate` is `false`. A
    /// termination ends the loop and propagates.
    ///
    /// The loop is stack-safe: synchronous iterations do not grow the
    /// stack.
    pub fn as_long_as<P>(self, predicate: P) -> Cont<E, A>
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);

        Cont::looped(self.clone(), self, move || {
            let predicate = predicate.clone();

            move |outcome: Outcome<A>| match outcome {
                Outcome::Success(value) if predicate(&value) => Decision::Again,
                outcome => Decision::Stop(outcome),
            }
        })
    }

    /// Re-runs `self` until `predicate` holds for its value.
    pub fn until<P>(self, predicate: P) -> Cont<E, A>
    where
        P: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.as_long_as(move |value| !predicate(value))
    }

    /// Re-runs `self` while `predicate` holds for its termination errors.
    ///
    /// This is the retry loop of the failure channel. Settles with the
    /// first value, or terminates with the first errors for which
    /// `predicate` is `false`.
    pub fn else_while<P>(self, predicate: P) -> Cont<E, A>
    where
        P: Fn(&[ContError]) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);

        Cont::looped(self.clone(), self, move || {
            let predicate = predicate.clone();

            move |outcome: Outcome<A>| match outcome {
                Outcome::Failure(errors) if predicate(&errors) => Decision::Again,
                outcome => Decision::Stop(outcome),
            }
        })
    }

    /// Re-runs `self` until `predicate` holds for its termination errors.
    pub fn else_until<P>(self, predicate: P) -> Cont<E, A>
    where
        P: Fn(&[ContError]) -> bool + Send + Sync + 'static,
    {
        self.else_while(move |errors| !predicate(errors))
    }

    /// Re-runs `self` for as long as it succeeds.
    ///
    /// The result admits no value: the loop can only be observed through
    /// its termination channel (or by cancelling it).
    pub fn forever(self) -> Cont<E, Infallible> {
        Cont::looped(self.clone(), self, || {
            |outcome: Outcome<A>| match outcome {
                Outcome::Success(_) => Decision::Again,
                Outcome::Failure(errors) => Decision::Stop(Outcome::Failure(errors)),
            }
        })
    }
}
