//! Per-execution context.
//!
//! Every execution of a continuation receives a [`Runtime`]: the
//! environment value, the cancellation query and the panic handler. The
//! runtime is created by [`Runner::run`](builder::Runner::run) and threaded
//! explicitly through every combinator; there is no ambient or thread-local
//! state.
//!
//! It is composed of:
//! - [`builder`]: the [`Runner`](builder::Runner) configuring one execution,
//! - [`panic`]: the default panic handler.

pub(crate) mod builder;
pub(crate) mod panic;

use crate::cancel::{CancelSource, Hook, Registration};
use crate::error::Panic;

use std::sync::Arc;

/// Callback receiving unrecoverable panics.
pub type PanicHandler = Arc<dyn Fn(Panic) + Send + Sync>;

/// How an execution answers the cancellation query.
#[derive(Clone)]
pub(crate) enum Cancellation {
    /// Always reports "not cancelled" (used for `bracket` release).
    Never,

    /// Backed by a token or a parallel group.
    Source(CancelSource),
}

/// The context of one execution.
///
/// Cloning a runtime is cheap; clones share the environment, the
/// cancellation state and the panic handler.
pub struct Runtime<E> {
    /// Environment, shared by reference and never copied.
    env: Arc<E>,

    cancellation: Cancellation,

    panic_handler: PanicHandler,
}

impl<E> Clone for Runtime<E> {
    fn clone(&self) -> Self {
        Self {
            env: self.env.clone(),
            cancellation: self.cancellation.clone(),
            panic_handler: self.panic_handler.clone(),
        }
    }
}

impl<E> Runtime<E> {
    pub(crate) fn new(env: Arc<E>, cancellation: Cancellation, panic_handler: PanicHandler) -> Self {
        Self {
            env,
            cancellation,
            panic_handler,
        }
    }

    /// The environment of this execution.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// The environment as the shared handle it is stored in.
    ///
    /// Every call returns a clone of the same `Arc`, so
    /// [`Arc::ptr_eq`] holds between the environment passed to `run` and
    /// the one observed here.
    pub fn env_arc(&self) -> Arc<E> {
        self.env.clone()
    }

    /// Polls the cancellation state.
    ///
    /// Combinators call this before every observable effect. A `true`
    /// answer means: stop and deliver nothing.
    pub fn is_cancelled(&self) -> bool {
        match &self.cancellation {
            Cancellation::Never => false,
            Cancellation::Source(source) => source.is_cancelled(),
        }
    }

    /// Hands an unrecoverable panic to the handler configured for this
    /// execution.
    pub fn on_panic(&self, panic: Panic) {
        (self.panic_handler)(panic)
    }

    /// Derives a runtime presenting a different environment.
    ///
    /// The derived runtime shares the cancellation state and the panic
    /// handler with `self`.
    pub fn copy_update_env<E2>(&self, env: impl Into<Arc<E2>>) -> Runtime<E2> {
        Runtime {
            env: env.into(),
            cancellation: self.cancellation.clone(),
            panic_handler: self.panic_handler.clone(),
        }
    }

    /// Derives a runtime whose cancellation query always answers `false`.
    pub fn uncancellable(&self) -> Runtime<E> {
        Runtime {
            env: self.env.clone(),
            cancellation: Cancellation::Never,
            panic_handler: self.panic_handler.clone(),
        }
    }

    /// Derives a runtime for a group of participants that can be cancelled
    /// together without cancelling `self`.
    pub(crate) fn group(&self) -> (Runtime<E>, CancelSource) {
        let source = match &self.cancellation {
            Cancellation::Never => CancelSource::new(),
            Cancellation::Source(parent) => parent.child(),
        };

        let runtime = Runtime {
            env: self.env.clone(),
            cancellation: Cancellation::Source(source.clone()),
            panic_handler: self.panic_handler.clone(),
        };

        (runtime, source)
    }

    /// Runs `hook` once if this execution gets cancelled.
    pub(crate) fn on_cancel(&self, hook: Hook) -> Registration {
        match &self.cancellation {
            Cancellation::Never => Registration::empty(),
            Cancellation::Source(source) => source.on_cancel(hook),
        }
    }
}
