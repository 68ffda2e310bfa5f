//! The driving loop behind every repeating combinator.
//!
//! A chain may settle synchronously inside `run`, so re-running a
//! continuation from its own completion callback would add a stack frame
//! per iteration. The [`Trampoline`] instead hands synchronous outcomes back
//! to an outer `loop` through a phase latch:
//!
//! - the iteration's observer stores the outcome, then tries
//!   `RUNNING -> SYNC`; on success the outer loop picks the outcome up,
//! - after `run_with` returns, the loop tries `RUNNING -> ASYNC`; on success
//!   the iteration is still pending and the loop returns. The late callback
//!   then restarts the loop from its own (fresh) stack.
//!
//! Stack depth is therefore constant in the number of iterations.

use super::Cont;
use crate::observer::Observer;
use crate::outcome::Outcome;
use crate::runtime::Runtime;

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// The iteration is running and has not settled yet.
const RUNNING: u8 = 0;

/// The iteration settled before `run_with` returned.
const SYNC: u8 = 1;

/// `run_with` returned first; the callback resumes the loop.
const ASYNC: u8 = 2;

/// What the loop does next.
pub(crate) enum Flow<E, A> {
    /// Run this continuation as the next iteration.
    Run(Cont<E, A>),

    /// Stop looping and perform the final delivery.
    Done(Box<dyn FnOnce() + Send>),
}

impl<E, A> Flow<E, A> {
    /// Stops the loop, settling `observer` with `outcome`.
    pub(crate) fn settle<B: Send + 'static>(observer: &Observer<B>, outcome: Outcome<B>) -> Self {
        let observer = observer.clone();
        Flow::Done(Box::new(move || {
            observer.settle(outcome);
        }))
    }
}

type Step<E, A> = Box<dyn FnMut(Option<Outcome<A>>) -> Flow<E, A> + Send>;

pub(crate) struct Trampoline<E, A> {
    runtime: Runtime<E>,

    /// Receives the previous iteration's outcome (`None` on the first
    /// call) and decides the next move.
    step: Mutex<Step<E, A>>,
}

impl<E, A> Trampoline<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Starts a loop on `runtime`.
    pub(crate) fn start<S>(runtime: Runtime<E>, step: S)
    where
        S: FnMut(Option<Outcome<A>>) -> Flow<E, A> + Send + 'static,
    {
        let trampoline = Arc::new(Self {
            runtime,
            step: Mutex::new(Box::new(step)),
        });

        trampoline.drive(None);
    }

    fn drive(self: Arc<Self>, mut last: Option<Outcome<A>>) {
        loop {
            if self.runtime.is_cancelled() {
                tracing::debug!("loop abandoned after cancellation");
                return;
            }

            let flow = {
                let mut step = self.step.lock();
                step(last.take())
            };

            let cont = match flow {
                Flow::Run(cont) => cont,
                Flow::Done(deliver) => {
                    deliver();
                    return;
                }
            };

            let phase = Arc::new(AtomicU8::new(RUNNING));
            let slot: Arc<Mutex<Option<Outcome<A>>>> = Arc::new(Mutex::new(None));

            let observer = {
                let phase = phase.clone();
                let slot = slot.clone();
                let this = self.clone();

                Observer::new(move |outcome| {
                    *slot.lock() = Some(outcome);

                    if phase
                        .compare_exchange(RUNNING, SYNC, Ordering::AcqRel, Ordering::Acquire)
                        .is_err()
                    {
                        let outcome = slot.lock().take();
                        this.drive(outcome);
                    }
                })
            };

            cont.run_with(&self.runtime, observer);

            if phase
                .compare_exchange(RUNNING, ASYNC, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return;
            }

            last = slot.lock().take();
        }
    }
}
