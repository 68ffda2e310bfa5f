use super::state::{CANCELLED, COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use crate::cancel::Registration;
use crate::cont::{Cont, guarded};
use crate::error::ContError;
use crate::observer::Observer;
use crate::outcome::Outcome;
use crate::runtime::Runtime;
use crate::scheduler::Scheduler;

use parking_lot::Mutex;
use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, Wake, Waker};

type BoxFuture<A> = Pin<Box<dyn Future<Output = Result<A, ContError>> + Send>>;

thread_local! {
    /// Address of the task being polled on this thread, `0` if none.
    static POLLING: Cell<usize> = const { Cell::new(0) };
}

/// Marks a task as polled by the current thread until dropped.
struct PollingGuard {
    previous: usize,
}

impl PollingGuard {
    fn enter(task: usize) -> Self {
        Self {
            previous: POLLING.with(|polling| polling.replace(task)),
        }
    }
}

impl Drop for PollingGuard {
    fn drop(&mut self) {
        POLLING.with(|polling| polling.set(self.previous));
    }
}

/// One execution of [`Cont::from_future`]: a future polled on a scheduler
/// until it settles the observer.
struct FutureTask<E, A> {
    /// Dropped on completion or cancellation.
    future: Mutex<Option<BoxFuture<A>>>,

    /// Lifecycle state (`IDLE`, `QUEUED`, `RUNNING`, ...).
    state: AtomicUsize,

    runtime: Runtime<E>,
    scheduler: Arc<dyn Scheduler>,
    observer: Observer<A>,

    /// Cancellation hook, forgotten once the task is done.
    registration: Mutex<Option<Registration>>,

    /// Set when a re-queued poll came back inline, on the poller's own stack.
    repoll: AtomicBool,
}

impl<E, A> FutureTask<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Creates the task and queues its first poll.
    fn spawn(
        runtime: Runtime<E>,
        scheduler: Arc<dyn Scheduler>,
        future: BoxFuture<A>,
        observer: Observer<A>,
    ) {
        let task = Arc::new(Self {
            future: Mutex::new(Some(future)),
            state: AtomicUsize::new(QUEUED),
            runtime,
            scheduler,
            observer,
            registration: Mutex::new(None),
            repoll: AtomicBool::new(false),
        });

        let weak: Weak<Self> = Arc::downgrade(&task);
        let registration = task.runtime.on_cancel(Box::new(move || {
            if let Some(task) = weak.upgrade() {
                task.abort();
            }
        }));
        *task.registration.lock() = Some(registration);

        task.schedule();
    }

    fn schedule(self: &Arc<Self>) {
        let task = self.clone();
        self.scheduler.schedule(Box::new(move || task.run()));
    }

    fn key(&self) -> usize {
        self as *const Self as *const () as usize
    }

    /// Polls the future until it stops asking to be polled again.
    ///
    /// A scheduler that runs the re-queued job inline lands back here while
    /// the previous poll is still on the stack. That nested call only flags
    /// the poll and the outer loop performs it.
    fn run(self: Arc<Self>) {
        if POLLING.with(Cell::get) == self.key() {
            self.repoll.store(true, Ordering::Release);
            return;
        }

        let _polling = PollingGuard::enter(self.key());
        while self.poll_once() {}
    }

    /// Polls the future once. Returns `true` when the next poll is due on
    /// this stack.
    ///
    /// - `Poll::Pending`: back to `IDLE`, or re-queued if woken meanwhile.
    /// - `Poll::Ready`: the future is dropped and the observer settled.
    fn poll_once(self: &Arc<Self>) -> bool {
        let current = self.state.load(Ordering::Acquire);

        if current != QUEUED {
            return false;
        }

        if self
            .state
            .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        if self.runtime.is_cancelled() {
            self.state.store(CANCELLED, Ordering::Release);
            self.discard();
            return false;
        }

        let waker = Waker::from(self.clone());
        let mut cx = Context::from_waker(&waker);

        let poll = {
            let mut slot = self.future.lock();
            match slot.as_mut() {
                Some(future) => guarded(|| future.as_mut().poll(&mut cx)),
                None => return false,
            }
        };

        match poll {
            Ok(Poll::Pending) => {
                match self
                    .state
                    .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
                {
                    Ok(_) => false,
                    Err(NOTIFIED) => {
                        if self
                            .state
                            .compare_exchange(NOTIFIED, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                            .is_ok()
                        {
                            self.repoll.store(false, Ordering::Release);
                            self.schedule();
                            self.repoll.swap(false, Ordering::AcqRel)
                        } else {
                            self.discard();
                            false
                        }
                    }
                    // Aborted while polling.
                    Err(_) => {
                        self.discard();
                        false
                    }
                }
            }
            Ok(Poll::Ready(result)) => {
                self.complete(Outcome::from(result));
                false
            }
            Err(err) => {
                self.complete(Outcome::Failure(vec![err]));
                false
            }
        }
    }

    fn complete(&self, outcome: Outcome<A>) {
        self.state.store(COMPLETED, Ordering::Release);
        self.discard();

        if self.runtime.is_cancelled() {
            tracing::trace!("future settled after cancellation; outcome dropped");
            return;
        }

        self.observer.settle(outcome);
    }

    /// Drops the future and the cancellation hook.
    fn discard(&self) {
        let future = self.future.lock().take();
        drop(future);

        if let Some(registration) = self.registration.lock().take() {
            registration.forget();
        }
    }

    /// Signals the task to be polled again.
    ///
    /// An `IDLE` task is queued on the scheduler; a `RUNNING` one is marked
    /// `NOTIFIED` and re-queued by its poller.
    fn notify(self: &Arc<Self>) {
        loop {
            let state = self.state.load(Ordering::Acquire);

            match state {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.schedule();
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    /// Moves the task to `CANCELLED`.
    ///
    /// A task being polled keeps its future until the poll returns; any
    /// other task drops it right away.
    fn abort(&self) {
        loop {
            let state = self.state.load(Ordering::Acquire);

            if state == COMPLETED || state == CANCELLED {
                return;
            }

            if self
                .state
                .compare_exchange(state, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                tracing::debug!("future task cancelled");

                if state != RUNNING && state != NOTIFIED {
                    self.discard();
                }
                return;
            }
        }
    }
}

impl<E, A> Wake for FutureTask<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    fn wake(self: Arc<Self>) {
        self.notify();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.notify();
    }
}

impl<E, A> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Builds a continuation from a future.
    ///
    /// Every execution calls `factory` with the environment and polls the
    /// returned future as a task on `scheduler`. Wake-ups re-queue the task
    /// on the same scheduler. `Ok` settles the value channel, `Err` the
    /// termination channel; a panic while polling becomes a termination.
    ///
    /// Cancelling the execution drops the future without polling it again.
    ///
    /// # Arguments
    ///
    /// * `scheduler` - Where polls run.
    /// * `factory` - Produces a fresh future per execution.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let fetch = Cont::<Config, String>::from_future(ThreadScheduler::new(), |config| {
    ///     let url = config.url.clone();
    ///     async move { download(&url).await.map_err(ContError::new) }
    /// });
    /// ```
    pub fn from_future<S, F, Fut>(scheduler: S, factory: F) -> Cont<E, A>
    where
        S: Scheduler + 'static,
        F: Fn(&E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<A, ContError>> + Send + 'static,
    {
        let scheduler: Arc<dyn Scheduler> = Arc::new(scheduler);

        Cont::raw(move |runtime, observer| {
            let future = match guarded(|| factory(runtime.env())) {
                Ok(future) => future,
                Err(err) => {
                    observer.on_terminate(vec![err]);
                    return;
                }
            };

            FutureTask::spawn(
                runtime.clone(),
                scheduler.clone(),
                Box::pin(future),
                observer,
            );
        })
    }
}
