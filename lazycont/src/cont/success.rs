use super::{Cont, guarded};
use crate::error::ContError;
use crate::observer::Observer;
use crate::outcome::Outcome;

use std::sync::Arc;

impl<E, A> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Transforms the value with a pure function.
    ///
    /// A panic inside `f` terminates the chain with an error.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// Cont::<(), i32>::of(5).map(|x| x + 1); // settles with 6
    /// ```
    pub fn map<B, F>(self, f: F) -> Cont<E, B>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        self.transform(move |_, outcome, observer| match outcome {
            Outcome::Success(value) => {
                observer.settle(guarded(|| f(value)).into());
            }
            Outcome::Failure(errors) => observer.on_terminate(errors),
        })
    }

    /// Transforms the value with a function that may fail explicitly.
    pub fn try_map<B, F>(self, f: F) -> Cont<E, B>
    where
        B: Send + 'static,
        F: Fn(A) -> Result<B, ContError> + Send + Sync + 'static,
    {
        self.transform(move |_, outcome, observer| match outcome {
            Outcome::Success(value) => {
                let result = guarded(|| f(value)).and_then(|result| result);
                observer.settle(result.into());
            }
            Outcome::Failure(errors) => observer.on_terminate(errors),
        })
    }

    /// Discards the value.
    pub fn as_unit(self) -> Cont<E, ()> {
        self.map(|_| ())
    }

    /// Binds the value to the next continuation and runs it.
    pub fn then<B, F>(self, f: F) -> Cont<E, B>
    where
        B: Send + 'static,
        F: Fn(A) -> Cont<E, B> + Send + Sync + 'static,
    {
        self.transform(move |runtime, outcome, observer| match outcome {
            Outcome::Success(value) => match guarded(|| f(value)) {
                Ok(next) => next.run_with(runtime, observer),
                Err(err) => observer.on_terminate(vec![err]),
            },
            Outcome::Failure(errors) => observer.on_terminate(errors),
        })
    }

    /// Alias of [`then`](Self::then).
    pub fn chain<B, F>(self, f: F) -> Cont<E, B>
    where
        B: Send + 'static,
        F: Fn(A) -> Cont<E, B> + Send + Sync + 'static,
    {
        self.then(f)
    }

    /// Runs a side-effect continuation and keeps the upstream value.
    ///
    /// The chain waits for the side effect. Its termination propagates;
    /// its value is discarded.
    pub fn tap<B, F>(self, f: F) -> Cont<E, A>
    where
        B: Send + 'static,
        F: Fn(&A) -> Cont<E, B> + Send + Sync + 'static,
    {
        self.transform(move |runtime, outcome, observer| match outcome {
            Outcome::Success(value) => match guarded(|| f(&value)) {
                Ok(side) => side.run_with(
                    runtime,
                    Observer::new(move |side_outcome| match side_outcome {
                        Outcome::Success(_) => observer.on_value(value),
                        Outcome::Failure(errors) => observer.on_terminate(errors),
                    }),
                ),
                Err(err) => observer.on_terminate(vec![err]),
            },
            Outcome::Failure(errors) => observer.on_terminate(errors),
        })
    }

    /// Starts a side-effect continuation without waiting for it.
    ///
    /// The upstream value is delivered right after the side effect has been
    /// started. The side effect's outcome, errors included, is never
    /// observed.
    pub fn fork<B, F>(self, f: F) -> Cont<E, A>
    where
        B: Send + 'static,
        F: Fn(&A) -> Cont<E, B> + Send + Sync + 'static,
    {
        self.transform(move |runtime, outcome, observer| match outcome {
            Outcome::Success(value) => {
                match guarded(|| f(&value)) {
                    Ok(side) => side.run_with(runtime, Observer::ignore()),
                    Err(err) => tracing::debug!(%err, "forked side effect failed to start"),
                }
                observer.on_value(value);
            }
            Outcome::Failure(errors) => observer.on_terminate(errors),
        })
    }

    /// Runs a continuation derived from the value, then combines both
    /// values.
    pub fn zip<B, C, F, G>(self, f: F, combine: G) -> Cont<E, C>
    where
        B: Send + 'static,
        C: Send + 'static,
        F: Fn(&A) -> Cont<E, B> + Send + Sync + 'static,
        G: Fn(A, B) -> C + Send + Sync + 'static,
    {
        let combine = Arc::new(combine);

        self.transform(move |runtime, outcome, observer| match outcome {
            Outcome::Success(first) => match guarded(|| f(&first)) {
                Ok(next) => {
                    let combine = combine.clone();

                    next.run_with(
                        runtime,
                        Observer::new(move |second| match second {
                            Outcome::Success(second) => {
                                observer.settle(guarded(|| combine(first, second)).into());
                            }
                            Outcome::Failure(errors) => {
                                observer.on_terminate(errors);
                            }
                        }),
                    );
                }
                Err(err) => observer.on_terminate(vec![err]),
            },
            Outcome::Failure(errors) => observer.on_terminate(errors),
        })
    }

    /// Keeps the value only if `predicate` holds.
    ///
    /// A `false` answer is a clean termination: the error list is empty.
    pub fn then_if<F>(self, predicate: F) -> Cont<E, A>
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.transform(move |_, outcome, observer| match outcome {
            Outcome::Success(value) => match guarded(|| predicate(&value)) {
                Ok(true) => observer.on_value(value),
                Ok(false) => observer.on_terminate(Vec::new()),
                Err(err) => observer.on_terminate(vec![err]),
            },
            Outcome::Failure(errors) => observer.on_terminate(errors),
        })
    }
}
