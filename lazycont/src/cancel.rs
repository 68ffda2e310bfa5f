//! Cooperative cancellation.
//!
//! A [`CancelToken`] is handed out by every [`run`](crate::Cont::run). Its
//! flag is monotonic: once set it never resets. Combinators poll the flag at
//! their checkpoints; nothing is interrupted preemptively.
//!
//! Internally a token wraps a [`CancelSource`]. Sources can be linked into a
//! parent/child chain (a child observes its ancestors' flags) and can carry
//! one-shot hooks that fire when the source is cancelled.

use crate::utils::Slab;

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) type Hook = Box<dyn FnOnce() + Send>;

/// Handle used to cancel one execution of a continuation.
///
/// Cancelling is idempotent. Clones share the same flag.
#[derive(Clone)]
pub struct CancelToken {
    source: CancelSource,
}

impl CancelToken {
    pub(crate) fn new(source: CancelSource) -> Self {
        Self { source }
    }

    /// Requests cancellation of the execution.
    ///
    /// Pending combinators observe the request at their next checkpoint and
    /// deliver nothing from then on.
    pub fn cancel(&self) {
        self.source.cancel();
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.source.is_cancelled()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Shared cancellation state behind a token or a parallel group.
#[derive(Clone)]
pub(crate) struct CancelSource {
    inner: Arc<Inner>,
}

struct Inner {
    /// Set once, never cleared.
    cancelled: AtomicBool,

    /// Hooks waiting for this source to be cancelled.
    hooks: Mutex<Slab<Hook>>,

    /// Ancestors also cancel this source.
    parent: Option<CancelSource>,
}

impl CancelSource {
    /// Creates a root source.
    pub(crate) fn new() -> Self {
        Self::with_parent(None)
    }

    /// Creates a source that is cancelled when `self` is, and can also be
    /// cancelled on its own.
    pub(crate) fn child(&self) -> Self {
        Self::with_parent(Some(self.clone()))
    }

    fn with_parent(parent: Option<CancelSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                hooks: Mutex::new(Slab::new()),
                parent,
            }),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
            || self
                .inner
                .parent
                .as_ref()
                .is_some_and(CancelSource::is_cancelled)
    }

    /// Sets the flag and runs every registered hook exactly once.
    pub(crate) fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        // Hooks run without the lock held; they may deregister themselves.
        let hooks = self.inner.hooks.lock().drain();

        tracing::debug!(hooks = hooks.len(), "cancellation requested");

        for hook in hooks {
            hook();
        }
    }

    /// Registers `hook` on this source and every ancestor.
    ///
    /// Whichever source is cancelled first fires the hook; it never fires
    /// twice. If the chain is already cancelled the hook runs immediately.
    pub(crate) fn on_cancel(&self, hook: Hook) -> Registration {
        let cell = Arc::new(Mutex::new(Some(hook)));
        let mut keys = Vec::new();
        let mut current = Some(self);

        while let Some(source) = current {
            let cell = cell.clone();
            let fire: Hook = Box::new(move || {
                let hook = cell.lock().take();
                if let Some(hook) = hook {
                    hook();
                }
            });

            match source.register(fire) {
                Some(key) => keys.push((source.clone(), key)),
                None => break,
            }

            current = source.inner.parent.as_ref();
        }

        Registration { keys }
    }

    fn register(&self, hook: Hook) -> Option<usize> {
        let mut hooks = self.inner.hooks.lock();

        if self.is_cancelled() {
            drop(hooks);
            hook();
            return None;
        }

        let key = hooks.insert(hook);
        tracing::trace!(pending = hooks.len(), "cancellation hook registered");
        Some(key)
    }

    fn deregister(&self, key: usize) {
        let removed = self.inner.hooks.lock().remove(key);
        drop(removed);
    }
}

/// Keys of a hook registered through [`CancelSource::on_cancel`].
#[must_use]
pub(crate) struct Registration {
    keys: Vec<(CancelSource, usize)>,
}

impl Registration {
    /// A registration that holds nothing, for uncancellable runtimes.
    pub(crate) fn empty() -> Self {
        Self { keys: Vec::new() }
    }

    /// Removes the hook from every source it was registered on.
    pub(crate) fn forget(self) {
        for (source, key) in self.keys {
            source.deregister(key);
        }
    }
}
