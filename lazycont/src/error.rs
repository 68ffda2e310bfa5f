//! Error records carried on the termination channel, and the panic type
//! delivered on the unrecoverable channel.

use std::any::Any;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Built-in error payloads produced by the crate itself.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// A plain message, created through [`ContError::msg`].
    #[error("{0}")]
    Message(String),

    /// A user-supplied closure panicked while the continuation was running.
    #[error("callback panicked: {0}")]
    Panicked(String),
}

/// An immutable error record: a shared payload plus the trace captured
/// where the record was created.
///
/// Cloning a `ContError` is cheap and never copies the payload.
#[derive(Clone)]
pub struct ContError {
    payload: Arc<dyn Error + Send + Sync + 'static>,
    trace: Arc<Backtrace>,
}

impl ContError {
    /// Wraps any error value.
    pub fn new<T>(error: T) -> Self
    where
        T: Error + Send + Sync + 'static,
    {
        Self {
            payload: Arc::new(error),
            trace: Arc::new(Backtrace::capture()),
        }
    }

    /// Creates an error record from a message.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let cont = Cont::<(), i32>::stop(vec![ContError::msg("boom")]);
    /// ```
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message(message.into()))
    }

    /// Converts an unwound panic payload into a termination error.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self::new(ErrorKind::Panicked(panic_message(payload.as_ref())))
    }

    /// Returns the underlying error value.
    pub fn payload(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.payload.as_ref()
    }

    /// Attempts to view the payload as a concrete error type.
    pub fn downcast_ref<T>(&self) -> Option<&T>
    where
        T: Error + 'static,
    {
        self.payload.downcast_ref::<T>()
    }

    /// Returns `true` if this record was produced by a panicking closure.
    pub fn is_panic(&self) -> bool {
        matches!(self.downcast_ref::<ErrorKind>(), Some(ErrorKind::Panicked(_)))
    }

    /// The trace captured when the record was created.
    ///
    /// Capturing honours `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`; when both
    /// are unset the trace is disabled.
    pub fn trace(&self) -> &Backtrace {
        &self.trace
    }
}

impl<T> From<T> for ContError
where
    T: Error + Send + Sync + 'static,
{
    fn from(error: T) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for ContError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.payload, f)
    }
}

impl fmt::Debug for ContError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContError")
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

/// An unrecoverable contract violation.
///
/// Panics are raised when a terminal callback handed to
/// [`run`](crate::Cont::run) itself panics. They never flow through the
/// termination channel.
pub struct Panic {
    payload: Box<dyn Any + Send>,
}

impl Panic {
    /// Wraps a payload caught by [`std::panic::catch_unwind`].
    pub fn new(payload: Box<dyn Any + Send>) -> Self {
        Self { payload }
    }

    /// Best-effort human readable description of the panic payload.
    pub fn message(&self) -> String {
        panic_message(self.payload.as_ref())
    }

    /// Returns the raw payload, e.g. to feed [`std::panic::resume_unwind`].
    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.payload
    }
}

impl fmt::Debug for Panic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panic")
            .field("message", &self.message())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_owned()
    }
}
