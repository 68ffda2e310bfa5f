use super::Cont;
use crate::observer::Observer;
use crate::scheduler::Scheduler;

use std::sync::Arc;

impl<E, A> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Defers the start of every execution to `scheduler`.
    ///
    /// Cancellation is polled again when the job runs; a cancelled
    /// execution never starts.
    pub fn subscribe_on<S>(self, scheduler: S) -> Cont<E, A>
    where
        S: Scheduler + 'static,
    {
        let scheduler = Arc::new(scheduler);

        Cont::raw(move |runtime, observer| {
            let source = self.clone();
            let runtime = runtime.clone();

            scheduler.schedule(Box::new(move || {
                if runtime.is_cancelled() {
                    tracing::trace!("cancelled before scheduled start");
                    return;
                }
                source.run_with(&runtime, observer);
            }));
        })
    }

    /// Delivers the outcome of every execution through `scheduler`.
    ///
    /// Cancellation is polled again right before delivery.
    pub fn observe_on<S>(self, scheduler: S) -> Cont<E, A>
    where
        S: Scheduler + 'static,
    {
        let scheduler = Arc::new(scheduler);

        Cont::raw(move |runtime, observer| {
            let scheduler = scheduler.clone();
            let current = runtime.clone();

            self.run_with(
                runtime,
                Observer::new(move |outcome| {
                    scheduler.schedule(Box::new(move || {
                        if current.is_cancelled() {
                            tracing::trace!("cancelled before scheduled delivery");
                            return;
                        }
                        observer.settle(outcome);
                    }));
                }),
            );
        })
    }
}
