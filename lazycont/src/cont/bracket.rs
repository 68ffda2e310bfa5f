//! Acquire / use / release with guaranteed cleanup.

use super::{Cont, guarded};
use crate::cancel::Registration;
use crate::observer::Observer;
use crate::outcome::Outcome;
use crate::runtime::Runtime;

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type Release<E, R> = Arc<dyn Fn(&R) -> Cont<E, ()> + Send + Sync>;
type Use<E, R, A> = Arc<dyn Fn(&R) -> Cont<E, A> + Send + Sync>;

impl<E, A> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Acquires a resource, uses it, and always releases it.
    ///
    /// 1. `acquire` runs first. If it terminates, its errors propagate and
    ///    neither `use_` nor `release` ever runs.
    /// 2. On success, `use_` runs with the resource, unless the execution is
    ///    already cancelled.
    /// 3. `release` then runs exactly once, on a runtime that never reports
    ///    cancellation. It also runs when a `use_` in flight is abandoned
    ///    because the execution got cancelled.
    ///
    /// Outcomes combine as follows:
    ///
    /// | use       | release   | result                           |
    /// |-----------|-----------|----------------------------------|
    /// | value     | value     | use's value                      |
    /// | value     | errors    | release's errors                 |
    /// | errors    | value     | use's errors                     |
    /// | errors    | errors    | use's errors, then release's     |
    ///
    /// A panic in `use_` or `release` counts as a termination.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let read = Cont::bracket(
    ///     open_file(),
    ///     |file| close_file(file),
    ///     |file| read_all(file),
    /// );
    /// ```
    pub fn bracket<R, Rel, U>(acquire: Cont<E, R>, release: Rel, use_: U) -> Cont<E, A>
    where
        R: Send + Sync + 'static,
        Rel: Fn(&R) -> Cont<E, ()> + Send + Sync + 'static,
        U: Fn(&R) -> Cont<E, A> + Send + Sync + 'static,
    {
        let release: Release<E, R> = Arc::new(release);
        let use_: Use<E, R, A> = Arc::new(use_);

        Cont::raw(move |runtime, observer| {
            let release = release.clone();
            let use_ = use_.clone();
            let current = runtime.clone();

            acquire.run_with(
                runtime,
                Observer::new(move |acquired| match acquired {
                    Outcome::Failure(errors) => {
                        if !current.is_cancelled() {
                            observer.on_terminate(errors);
                        }
                    }
                    Outcome::Success(resource) => {
                        let lifecycle = Arc::new(Lifecycle {
                            runtime: current,
                            resource: Arc::new(resource),
                            release,
                            observer,
                            released: AtomicBool::new(false),
                            registration: Mutex::new(None),
                        });

                        lifecycle.start(use_);
                    }
                }),
            );
        })
    }
}

/// State of one bracket execution after a successful acquire.
struct Lifecycle<E, R, A> {
    runtime: Runtime<E>,
    resource: Arc<R>,
    release: Release<E, R>,
    observer: Observer<A>,

    /// Release latch: the first finisher runs `release`.
    released: AtomicBool,

    /// Cancellation hook releasing the resource if `use` is abandoned.
    registration: Mutex<Option<Registration>>,
}

impl<E, R, A> Lifecycle<E, R, A>
where
    E: Send + Sync + 'static,
    R: Send + Sync + 'static,
    A: Send + 'static,
{
    fn start(self: Arc<Self>, use_: Use<E, R, A>) {
        if self.runtime.is_cancelled() {
            tracing::debug!("bracket cancelled before use; releasing");
            self.finish(None);
            return;
        }

        let on_cancel = self.clone();
        let registration = self
            .runtime
            .on_cancel(Box::new(move || on_cancel.finish(None)));
        *self.registration.lock() = Some(registration);

        // The hook may already have fired.
        if self.released.load(Ordering::Acquire) {
            self.forget_hook();
            return;
        }

        match guarded(|| use_(&*self.resource)) {
            Ok(cont) => {
                let this = self.clone();
                cont.run_with(
                    &self.runtime,
                    Observer::new(move |used| this.finish(Some(used))),
                );
            }
            Err(err) => self.finish(Some(Outcome::Failure(vec![err]))),
        }
    }

    /// Runs `release` once; `used` is `None` when use was skipped or
    /// abandoned.
    fn finish(self: Arc<Self>, used: Option<Outcome<A>>) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }

        self.forget_hook();

        let release = match guarded(|| (self.release)(&*self.resource)) {
            Ok(cont) => cont,
            Err(err) => Cont::stop(vec![err]),
        };

        let this = self.clone();
        release.run_with(
            &self.runtime.uncancellable(),
            Observer::new(move |released| {
                if let Outcome::Failure(errors) = &released {
                    tracing::debug!(errors = errors.len(), "bracket release terminated");
                }

                let Some(used) = used else {
                    return;
                };

                if this.runtime.is_cancelled() {
                    tracing::debug!("bracket cancelled; outcome dropped after release");
                    return;
                }

                this.observer.settle(combine(used, released));
            }),
        );
    }

    fn forget_hook(&self) {
        let registration = self.registration.lock().take();
        if let Some(registration) = registration {
            registration.forget();
        }
    }
}

fn combine<A>(used: Outcome<A>, released: Outcome<()>) -> Outcome<A> {
    match (used, released) {
        (Outcome::Success(value), Outcome::Success(())) => Outcome::Success(value),
        (Outcome::Success(_), Outcome::Failure(errors)) => Outcome::Failure(errors),
        (Outcome::Failure(errors), Outcome::Success(())) => Outcome::Failure(errors),
        (Outcome::Failure(mut errors), Outcome::Failure(more)) => {
            errors.extend(more);
            Outcome::Failure(errors)
        }
    }
}
