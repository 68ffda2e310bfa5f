//! The settlement side of the protocol.
//!
//! An [`Observer`] receives the outcome of one execution. Several logical
//! branches may hold clones of the same observer (a racing participant, a
//! cancellation hook, a late asynchronous callback), so settlement goes
//! through a single atomic latch: the first caller wins and every later
//! call, from any clone, is silently dropped.

use crate::error::ContError;
use crate::outcome::Outcome;

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

type Sink<A> = Box<dyn FnOnce(Outcome<A>) + Send>;

/// A settle-once callback pair.
pub struct Observer<A> {
    inner: Arc<Inner<A>>,
}

struct Inner<A> {
    /// Flipped by the first settlement.
    settled: AtomicBool,

    /// Taken exactly once, by the winner of `settled`.
    sink: Mutex<Option<Sink<A>>>,
}

impl<A> Clone for Observer<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: Send + 'static> Observer<A> {
    /// Creates an observer delivering to `sink`.
    pub fn new<F>(sink: F) -> Self
    where
        F: FnOnce(Outcome<A>) + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                settled: AtomicBool::new(false),
                sink: Mutex::new(Some(Box::new(sink))),
            }),
        }
    }

    /// Creates an observer that ignores its outcome.
    pub fn ignore() -> Self {
        Self::new(|_| {})
    }

    /// Settles on the value channel.
    pub fn on_value(&self, value: A) {
        self.settle(Outcome::Success(value));
    }

    /// Settles on the termination channel.
    pub fn on_terminate(&self, errors: Vec<ContError>) {
        self.settle(Outcome::Failure(errors));
    }

    /// Settles with `outcome`.
    ///
    /// Returns `true` if this call won the latch and delivered the outcome,
    /// `false` if the observer had already been settled.
    pub fn settle(&self, outcome: Outcome<A>) -> bool {
        if self.inner.settled.swap(true, Ordering::AcqRel) {
            return false;
        }

        let sink = self.inner.sink.lock().take();
        if let Some(sink) = sink {
            sink(outcome);
        }

        true
    }

    /// Returns `true` once any clone of this observer has been settled.
    pub fn is_settled(&self) -> bool {
        self.inner.settled.load(Ordering::Acquire)
    }
}
