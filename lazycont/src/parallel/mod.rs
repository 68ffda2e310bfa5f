//! Parallel policy engine.
//!
//! Joins ([`Cont::both`](crate::Cont::both), [`Cont::all`](crate::Cont::all))
//! need every participant to succeed; races
//! ([`Cont::either`](crate::Cont::either), [`Cont::any`](crate::Cont::any))
//! settle with the first success. How participants are started and how
//! their outcomes are merged is chosen declaratively with a [`Policy`].
//!
//! "Parallel" means interleaved: participants start one after another on
//! the calling thread and run concurrently only as far as their own
//! asynchronous leaves allow.
//!
//! It is composed of:
//! - [`policy`]: the policy types,
//! - [`gather`]: index-tagged outcome slots shared by eager policies,
//! - [`join`]: `both` / `all`,
//! - [`race`]: `either` / `any`.

mod gather;
mod join;
mod policy;
mod race;

pub use policy::{BothPolicy, Combine, EitherPolicy, Policy};
