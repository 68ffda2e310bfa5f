/// Task is waiting for a wake-up and is not scheduled.
pub(crate) const IDLE: usize = 0;

/// Task has been handed to the scheduler and waits for its poll.
pub(crate) const QUEUED: usize = 1;

/// Task is being polled.
///
/// At most one thread observes this state at a time; it owns the future
/// until it leaves the state.
pub(crate) const RUNNING: usize = 2;

/// The future returned `Poll::Ready` and has been dropped.
pub(crate) const COMPLETED: usize = 3;

/// Task was woken while being polled.
///
/// The poller re-queues it once the current poll returns.
pub(crate) const NOTIFIED: usize = 4;

/// The execution was cancelled; the future is dropped without another poll.
pub(crate) const CANCELLED: usize = 5;
