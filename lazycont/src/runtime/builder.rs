use super::panic::rethrow_async;
use super::{Cancellation, PanicHandler, Runtime};
use crate::cancel::{CancelSource, CancelToken};
use crate::cont::Cont;
use crate::error::{ContError, Panic};
use crate::observer::Observer;
use crate::outcome::Outcome;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

type Terminal<A> = Box<dyn FnOnce(Outcome<A>) + Send>;

/// Builder for configuring and starting one execution of a continuation.
///
/// `Runner` collects the terminal callbacks and the panic handler before
/// starting the execution. Callbacks that are not configured default to
/// no-ops; in particular a termination with no `on_terminate` handler is
/// silently dropped. The panic handler defaults to logging and re-raising
/// the panic asynchronously.
///
/// # Examples
///
/// ```rust,ignore
/// let token = Cont::<(), i32>::of(1)
///     .runner(())
///     .on_value(|v| println!("value: {v}"))
///     .on_terminate(|errors| eprintln!("terminated: {errors:?}"))
///     .run();
/// ```
pub struct Runner<E, A> {
    /// Continuation to execute.
    cont: Cont<E, A>,

    /// Environment of the execution.
    env: Arc<E>,

    on_value: Option<Box<dyn FnOnce(A) + Send>>,
    on_terminate: Option<Box<dyn FnOnce(Vec<ContError>) + Send>>,

    /// Replaces both `on_value` and `on_terminate` when set.
    on_outcome: Option<Terminal<A>>,

    on_panic: Option<PanicHandler>,
}

impl<E, A> Runner<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    pub(crate) fn new(cont: Cont<E, A>, env: Arc<E>) -> Self {
        Self {
            cont,
            env,
            on_value: None,
            on_terminate: None,
            on_outcome: None,
            on_panic: None,
        }
    }

    /// Sets the callback receiving a successful value.
    pub fn on_value(mut self, f: impl FnOnce(A) + Send + 'static) -> Self {
        self.on_value = Some(Box::new(f));
        self
    }

    /// Sets the callback receiving a termination.
    pub fn on_terminate(mut self, f: impl FnOnce(Vec<ContError>) + Send + 'static) -> Self {
        self.on_terminate = Some(Box::new(f));
        self
    }

    /// Sets a single callback receiving either outcome.
    ///
    /// Overrides [`on_value`](Self::on_value) and
    /// [`on_terminate`](Self::on_terminate).
    pub fn on_outcome(mut self, f: impl FnOnce(Outcome<A>) + Send + 'static) -> Self {
        self.on_outcome = Some(Box::new(f));
        self
    }

    /// Sets the handler receiving panics raised by the terminal callbacks.
    pub fn on_panic(mut self, f: impl Fn(Panic) + Send + Sync + 'static) -> Self {
        self.on_panic = Some(Arc::new(f));
        self
    }

    /// Starts the execution and returns its cancellation token.
    ///
    /// Synchronous continuations settle before this method returns.
    pub fn run(self) -> CancelToken {
        let source = CancelSource::new();
        let panic_handler = self.on_panic.clone().unwrap_or_else(rethrow_async);
        let runtime = Runtime::new(
            self.env.clone(),
            Cancellation::Source(source.clone()),
            panic_handler,
        );

        let cont = self.cont.clone();
        let terminal = self.into_terminal();
        let guard = runtime.clone();

        let observer = Observer::new(move |outcome| {
            if guard.is_cancelled() {
                tracing::debug!("execution cancelled; outcome dropped");
                return;
            }

            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || terminal(outcome))) {
                guard.on_panic(Panic::new(payload));
            }
        });

        tracing::trace!("starting continuation");
        cont.run_with(&runtime, observer);

        CancelToken::new(source)
    }

    fn into_terminal(self) -> Terminal<A> {
        if let Some(on_outcome) = self.on_outcome {
            return on_outcome;
        }

        let on_value = self.on_value;
        let on_terminate = self.on_terminate;

        Box::new(move |outcome| match outcome {
            Outcome::Success(value) => {
                if let Some(f) = on_value {
                    f(value);
                }
            }
            Outcome::Failure(errors) => {
                if let Some(f) = on_terminate {
                    f(errors);
                }
            }
        })
    }
}
