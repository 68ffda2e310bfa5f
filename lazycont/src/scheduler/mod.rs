//! Scheduling backends.
//!
//! The continuation core never decides *when* a deferred callback runs; it
//! hands a [`Job`] to a [`Scheduler`]. This module defines that interface
//! and a few reference implementations:
//!
//! - [`Immediate`] runs jobs inline,
//! - [`ManualScheduler`] queues jobs until the caller drains them, which
//!   makes completion order fully controllable in tests,
//! - [`ThreadScheduler`] runs every job on its own thread, optionally after
//!   a delay.

mod immediate;
mod manual;
mod thread;

pub use immediate::Immediate;
pub use manual::ManualScheduler;
pub use thread::ThreadScheduler;

use std::sync::Arc;

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce() + Send>;

/// Decides when a deferred job runs.
pub trait Scheduler: Send + Sync {
    /// Queues `job` for execution.
    fn schedule(&self, job: Job);
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule(&self, job: Job) {
        (**self).schedule(job)
    }
}
