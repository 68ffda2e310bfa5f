use crate::cancel::CancelToken;
use crate::cont::Cont;
use crate::outcome::Outcome;

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};

type Start<A> = Box<dyn FnOnce(Arc<Shared<A>>) -> CancelToken + Send>;

/// A future resolving to the [`Outcome`] of one execution of a
/// continuation.
///
/// Created by [`Cont::into_future`]. The execution starts on the first
/// poll, not on creation. Dropping the future before it resolves cancels
/// the execution.
pub struct ContFuture<A> {
    /// Taken on the first poll.
    start: Option<Start<A>>,

    /// Token of the running execution.
    token: Option<CancelToken>,

    shared: Arc<Shared<A>>,
}

/// Completion slot written by the terminal callback.
struct Shared<A> {
    completed: AtomicBool,
    outcome: Mutex<Option<Outcome<A>>>,

    /// Wakers of the pollers waiting for the outcome.
    waiters: Mutex<Vec<Waker>>,
}

impl<A> Shared<A> {
    fn complete(&self, outcome: Outcome<A>) {
        *self.outcome.lock() = Some(outcome);
        self.completed.store(true, Ordering::Release);

        let waiters = std::mem::take(&mut *self.waiters.lock());
        for waker in waiters {
            waker.wake();
        }
    }

    fn take(&self) -> Option<Outcome<A>> {
        if self.completed.load(Ordering::Acquire) {
            self.outcome.lock().take()
        } else {
            None
        }
    }
}

impl<A> Future for ContFuture<A> {
    type Output = Outcome<A>;

    /// Polls the execution, starting it if needed.
    ///
    /// The waker is registered before the completion flag is checked a
    /// second time, so a settlement racing with this poll is not missed.
    ///
    /// # Panics
    ///
    /// Panics if polled again after returning `Poll::Ready`.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome<A>> {
        if let Some(start) = self.start.take() {
            let token = start(self.shared.clone());
            self.token = Some(token);
        }

        if self.shared.completed.load(Ordering::Acquire) {
            return Poll::Ready(self.resolved());
        }

        self.shared.waiters.lock().push(cx.waker().clone());

        if self.shared.completed.load(Ordering::Acquire) {
            return Poll::Ready(self.resolved());
        }

        Poll::Pending
    }
}

impl<A> ContFuture<A> {
    fn resolved(&self) -> Outcome<A> {
        match self.shared.take() {
            Some(outcome) => outcome,
            None => panic!("ContFuture polled after completion"),
        }
    }
}

impl<A> Drop for ContFuture<A> {
    fn drop(&mut self) {
        if let Some(token) = &self.token
            && !self.shared.completed.load(Ordering::Acquire)
        {
            tracing::debug!("ContFuture dropped before completion; cancelling");
            token.cancel();
        }
    }
}

impl<E, A> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Converts one execution of this continuation into a [`Future`].
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// match Cont::<(), i32>::of(1).into_future(()).await {
    ///     Outcome::Success(v) => println!("{v}"),
    ///     Outcome::Failure(errors) => eprintln!("{errors:?}"),
    /// }
    /// ```
    pub fn into_future(&self, env: impl Into<Arc<E>>) -> ContFuture<A> {
        let runner = self.runner(env);

        ContFuture {
            start: Some(Box::new(move |shared: Arc<Shared<A>>| {
                runner.on_outcome(move |outcome| shared.complete(outcome)).run()
            })),
            token: None,
            shared: Arc::new(Shared {
                completed: AtomicBool::new(false),
                outcome: Mutex::new(None),
                waiters: Mutex::new(Vec::new()),
            }),
        }
    }
}
