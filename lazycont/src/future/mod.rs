//! Bridges between continuations and Rust futures.
//!
//! It is composed of:
//! - [`task`]: [`Cont::from_future`](crate::Cont::from_future), polling a
//!   future as a task on a [`Scheduler`](crate::scheduler::Scheduler),
//! - [`handle`]: [`ContFuture`], awaiting the outcome of a continuation,
//! - [`state`]: the lifecycle constants shared by both.

mod handle;
mod state;
mod task;

pub use handle::ContFuture;
