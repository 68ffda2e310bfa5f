//! Utilities for memory-efficient data structures.
//!
//! This module provides low-level utilities used internally by the crate.
//! In particular, it exposes a [`Slab`] used for indexed storage with reuse
//! of freed slots.

mod slab;

pub(crate) use slab::Slab;
