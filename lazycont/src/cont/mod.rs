//! The continuation type and its base constructors.
//!
//! A [`Cont<E, A>`] is a cold description of work: a single function over
//! a [`Runtime<E>`] and an [`Observer<A>`]. Building one has no effect;
//! every [`run`](Cont::run) starts an independent execution.
//!
//! The combinators live in the submodules:
//! - [`success`]: value-channel transforms (`map`, `then`, `tap`, ...),
//! - [`failure`]: termination-channel mirror (`else_map`, `else_do`, ...),
//! - [`looping`]: stack-safe repetition built on [`trampoline`],
//! - [`env`]: environment access and dependency injection,
//! - [`bracket`]: acquire/use/release with guaranteed cleanup,
//! - [`scheduling`]: moving work onto a [`Scheduler`](crate::scheduler::Scheduler).

mod bracket;
mod env;
mod failure;
pub(crate) mod looping;
mod scheduling;
mod success;

pub(crate) mod trampoline;

pub use env::ask;

use crate::cancel::CancelToken;
use crate::error::{ContError, Panic};
use crate::observer::Observer;
use crate::outcome::Outcome;
use crate::runtime::Runtime;
use crate::runtime::builder::Runner;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

type RunFn<E, A> = dyn Fn(&Runtime<E>, Observer<A>) + Send + Sync;

/// A cold, lazy, reusable continuation.
///
/// `E` is the environment the continuation reads, `A` the value it settles
/// with on success. Cloning is cheap: clones share the same underlying
/// function.
pub struct Cont<E, A> {
    run: Arc<RunFn<E, A>>,
}

impl<E, A> Clone for Cont<E, A> {
    fn clone(&self) -> Self {
        Self {
            run: self.run.clone(),
        }
    }
}

/// Runs a user-supplied closure, turning a panic into a termination error.
pub(crate) fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, ContError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(ContError::from_panic)
}

impl<E, A> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Wraps a run function without a panic guard. Only for combinators
    /// that guard every user closure themselves.
    pub(crate) fn raw<F>(f: F) -> Self
    where
        F: Fn(&Runtime<E>, Observer<A>) + Send + Sync + 'static,
    {
        Self { run: Arc::new(f) }
    }

    /// Builds a continuation from a run function.
    ///
    /// `f` receives the runtime of the execution and the observer to
    /// settle, synchronously or later from another callback. If `f` panics
    /// the observer is terminated with an error describing the panic.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let cont = Cont::<(), u32>::from_run(|_runtime, observer| {
    ///     observer.on_value(7);
    /// });
    /// ```
    pub fn from_run<F>(f: F) -> Self
    where
        F: Fn(&Runtime<E>, Observer<A>) + Send + Sync + 'static,
    {
        Self::raw(move |runtime, observer| {
            let guard = observer.clone();

            if let Err(err) = guarded(|| f(runtime, observer)) {
                guard.on_terminate(vec![err]);
            }
        })
    }

    /// Settles with `value` synchronously within `run`.
    pub fn of(value: A) -> Self
    where
        A: Clone + Sync,
    {
        Self::raw(move |_, observer| observer.on_value(value.clone()))
    }

    /// Terminates synchronously with `errors`.
    ///
    /// Every run delivers its own copy of the list.
    pub fn stop(errors: Vec<ContError>) -> Self {
        Self::raw(move |_, observer| observer.on_terminate(errors.clone()))
    }

    /// Terminates with a single error.
    pub fn error(error: impl Into<ContError>) -> Self {
        Self::stop(vec![error.into()])
    }

    /// Terminates cleanly, with an empty error list.
    pub fn terminate() -> Self {
        Self::stop(Vec::new())
    }

    /// Defers building the continuation until run time.
    ///
    /// `thunk` is called once per run, so any state it creates is fresh for
    /// every execution.
    pub fn from_deferred<F>(thunk: F) -> Self
    where
        F: Fn() -> Cont<E, A> + Send + Sync + 'static,
    {
        Self::raw(move |runtime, observer| match guarded(&thunk) {
            Ok(cont) => cont.run_with(runtime, observer),
            Err(err) => observer.on_terminate(vec![err]),
        })
    }

    /// Executes the continuation inside an existing execution.
    ///
    /// This is the building block for custom combinators: the nested
    /// execution shares the runtime (environment, cancellation, panic
    /// handler) of the caller.
    pub fn run_with(&self, runtime: &Runtime<E>, observer: Observer<A>) {
        (self.run)(runtime, observer)
    }

    /// Configures an execution; see [`Runner`].
    pub fn runner(&self, env: impl Into<Arc<E>>) -> Runner<E, A> {
        Runner::new(self.clone(), env.into())
    }

    /// Starts an execution with the given terminal callbacks.
    ///
    /// # Returns
    ///
    /// A [`CancelToken`] for this execution.
    pub fn run<V, T>(&self, env: impl Into<Arc<E>>, on_value: V, on_terminate: T) -> CancelToken
    where
        V: FnOnce(A) + Send + 'static,
        T: FnOnce(Vec<ContError>) + Send + 'static,
    {
        self.runner(env)
            .on_value(on_value)
            .on_terminate(on_terminate)
            .run()
    }

    /// Fire-and-forget: runs the continuation and discards both channels.
    pub fn ff(&self, env: impl Into<Arc<E>>) {
        let _ = self.runner(env).run();
    }

    /// Fire-and-forget with a custom panic handler.
    pub fn ff_with_panic<P>(&self, env: impl Into<Arc<E>>, on_panic: P)
    where
        P: Fn(Panic) + Send + Sync + 'static,
    {
        let _ = self.runner(env).on_panic(on_panic).run();
    }

    /// Builds a continuation that feeds this one's outcome to `step`.
    ///
    /// The outcome is dropped when the execution has been cancelled, so
    /// `step` never starts downstream work after cancellation.
    pub(crate) fn transform<B, F>(self, step: F) -> Cont<E, B>
    where
        B: Send + 'static,
        F: Fn(&Runtime<E>, Outcome<A>, Observer<B>) + Send + Sync + 'static,
    {
        let step = Arc::new(step);

        Cont::raw(move |runtime, observer| {
            let step = step.clone();
            let current = runtime.clone();

            self.run_with(
                runtime,
                Observer::new(move |outcome| {
                    if current.is_cancelled() {
                        tracing::trace!("cancelled; transform skipped");
                        return;
                    }

                    step(&current, outcome, observer);
                }),
            );
        })
    }
}
