//! # lazycont
//!
//! **lazycont** provides `Cont<E, A>`, a cold, lazy and reusable description of
//! work that may complete synchronously or asynchronously.
//!
//! A continuation reads an environment of type `E` and settles exactly once per
//! execution, on one of two channels:
//!
//! - the **value** channel, carrying an `A`,
//! - the **termination** channel, carrying a list of [`ContError`] (an empty
//!   list is a clean termination).
//!
//! Panics raised by terminal callbacks travel on a third, separate channel and
//! never mix with terminations.
//!
//! Building a continuation has no effect. Every call to [`Cont::run`] starts an
//! independent execution with its own [`CancelToken`].
//!
//! The crate offers:
//!
//! - **Combinators** on both channels (`map`, `then`, `tap`, `else_do`, ...)
//! - **Stack-safe loops** (`as_long_as`, `until`, `else_while`, `forever`,
//!   `retry`)
//! - **Parallel composition** (`both`, `all`, `either`, `any`) under a
//!   [`Policy`]
//! - **Resource safety** with [`Cont::bracket`]
//! - **Environment access** (`ask`, `local`, `scope`, `inject_into`)
//! - **Scheduling and futures** through the [`scheduler`] backends,
//!   [`Cont::from_future`] and [`Cont::into_future`]
//! - **Macros** `join!` and `select!`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lazycont::{Cont, ContError};
//!
//! let parsed = Cont::<(), &str>::of("42")
//!     .try_map(|s| s.parse::<u32>().map_err(ContError::new))
//!     .map(|n| n * 2);
//!
//! parsed.run((), |v| println!("value: {v}"), |errors| eprintln!("{errors:?}"));
//! ```
//!
//! ## Modules
//!
//! - [`scheduler`] — Scheduling backends
//! - [`tools`] — Utilities like retry mechanisms

mod cancel;
mod cont;
mod error;
mod future;
mod observer;
mod outcome;
mod parallel;
mod runtime;
mod utils;

pub mod scheduler;
pub mod tools;

pub use cancel::CancelToken;
pub use cont::{Cont, ask};
pub use error::{ContError, ErrorKind, Panic};
pub use future::ContFuture;
pub use observer::Observer;
pub use outcome::Outcome;
pub use parallel::{BothPolicy, Combine, EitherPolicy, Policy};
pub use runtime::builder::Runner;
pub use runtime::{PanicHandler, Runtime};

pub use lazycont_macros::*;
