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
    /// Transforms the error list. The chain stays terminated.
    pub fn else_map<F>(self, f: F) -> Cont<E, A>
    where
        F: Fn(Vec<ContError>) -> Vec<ContError> + Send + Sync + 'static,
    {
        self.transform(move |_, outcome, observer| match outcome {
            Outcome::Success(value) => observer.on_value(value),
            Outcome::Failure(errors) => match guarded(|| f(errors)) {
                Ok(errors) => observer.on_terminate(errors),
                Err(err) => observer.on_terminate(vec![err]),
            },
        })
    }

    /// Recovers from a termination with a fallback continuation.
    ///
    /// If the fallback terminates too, only its errors propagate; the
    /// original errors are discarded.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// Cont::<(), i32>::terminate().else_do(|_| Cont::of(42)); // settles with 42
    /// ```
    pub fn else_do<F>(self, f: F) -> Cont<E, A>
    where
        F: Fn(Vec<ContError>) -> Cont<E, A> + Send + Sync + 'static,
    {
        self.transform(move |runtime, outcome, observer| match outcome {
            Outcome::Success(value) => observer.on_value(value),
            Outcome::Failure(errors) => match guarded(|| f(errors)) {
                Ok(fallback) => fallback.run_with(runtime, observer),
                Err(err) => observer.on_terminate(vec![err]),
            },
        })
    }

    /// Like [`else_do`](Self::else_do), but on double failure both error
    /// lists are merged with `combine(original, fallback)`.
    pub fn else_zip<F, G>(self, f: F, combine: G) -> Cont<E, A>
    where
        F: Fn(&[ContError]) -> Cont<E, A> + Send + Sync + 'static,
        G: Fn(Vec<ContError>, Vec<ContError>) -> Vec<ContError> + Send + Sync + 'static,
    {
        let combine = Arc::new(combine);

        self.transform(move |runtime, outcome, observer| match outcome {
            Outcome::Success(value) => observer.on_value(value),
            Outcome::Failure(original) => match guarded(|| f(&original)) {
                Ok(fallback) => {
                    let combine = combine.clone();

                    fallback.run_with(
                        runtime,
                        Observer::new(move |second| match second {
                            Outcome::Success(value) => observer.on_value(value),
                            Outcome::Failure(errors) => {
                                match guarded(|| combine(original, errors)) {
                                    Ok(merged) => observer.on_terminate(merged),
                                    Err(err) => observer.on_terminate(vec![err]),
                                }
                            }
                        }),
                    );
                }
                Err(err) => observer.on_terminate(vec![err]),
            },
        })
    }

    /// Runs a side-effect continuation on termination.
    ///
    /// If the side effect succeeds, the whole chain recovers with its
    /// value. If it terminates, the original errors propagate unchanged.
    /// Compare [`else_fork`](Self::else_fork), which can never recover.
    pub fn else_tap<F>(self, f: F) -> Cont<E, A>
    where
        F: Fn(&[ContError]) -> Cont<E, A> + Send + Sync + 'static,
    {
        self.transform(move |runtime, outcome, observer| match outcome {
            Outcome::Success(value) => observer.on_value(value),
            Outcome::Failure(original) => match guarded(|| f(&original)) {
                Ok(side) => side.run_with(
                    runtime,
                    Observer::new(move |side_outcome| match side_outcome {
                        Outcome::Success(value) => observer.on_value(value),
                        Outcome::Failure(_) => observer.on_terminate(original),
                    }),
                ),
                Err(_) => observer.on_terminate(original),
            },
        })
    }

    /// Starts a failure handler without waiting for it, then propagates the
    /// original termination unchanged.
    pub fn else_fork<B, F>(self, f: F) -> Cont<E, A>
    where
        B: Send + 'static,
        F: Fn(&[ContError]) -> Cont<E, B> + Send + Sync + 'static,
    {
        self.transform(move |runtime, outcome, observer| match outcome {
            Outcome::Success(value) => observer.on_value(value),
            Outcome::Failure(errors) => {
                match guarded(|| f(&errors)) {
                    Ok(side) => side.run_with(runtime, Observer::ignore()),
                    Err(err) => tracing::debug!(%err, "forked failure handler failed to start"),
                }
                observer.on_terminate(errors);
            }
        })
    }

    /// Recovers with `fallback()` when `predicate` holds for the errors;
    /// otherwise forwards the termination unchanged.
    pub fn else_if<P, F>(self, predicate: P, fallback: F) -> Cont<E, A>
    where
        P: Fn(&[ContError]) -> bool + Send + Sync + 'static,
        F: Fn() -> A + Send + Sync + 'static,
    {
        self.transform(move |_, outcome, observer| match outcome {
            Outcome::Success(value) => observer.on_value(value),
            Outcome::Failure(errors) => match guarded(|| predicate(&errors)) {
                Ok(true) => match guarded(&fallback) {
                    Ok(value) => observer.on_value(value),
                    Err(err) => observer.on_terminate(vec![err]),
                },
                Ok(false) => observer.on_terminate(errors),
                Err(err) => observer.on_terminate(vec![err]),
            },
        })
    }
}
