//! Retry utilities for fallible continuations.
//!
//! [`Cont::retry`](crate::Cont::retry) re-runs a continuation after a
//! termination, up to a fixed number of extra attempts.
//! [`Cont::retry_with`](crate::Cont::retry_with) does the same but starts
//! every new attempt through a scheduler, which gives an interval between
//! attempts when combined with a delayed scheduler. [`retry`] builds the
//! attempt from a factory, once per attempt.

mod retry;

#[doc(inline)]
pub use retry::retry;
