use crate::outcome::Outcome;

use parking_lot::Mutex;
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome slots of one eager parallel execution, indexed by input
/// position.
pub(crate) struct Gather<A> {
    slots: Mutex<Vec<Option<Outcome<A>>>>,

    /// Participants that have not settled yet.
    remaining: AtomicUsize,
}

impl<A> Gather<A> {
    pub(crate) fn new(participants: usize) -> Self {
        Self {
            slots: Mutex::new((0..participants).map(|_| None).collect()),
            remaining: AtomicUsize::new(participants),
        }
    }

    /// Stores the outcome of participant `index`.
    ///
    /// The call recording the last outcome receives every outcome, in input
    /// order; all other calls receive `None`.
    pub(crate) fn record(&self, index: usize, outcome: Outcome<A>) -> Option<Vec<Outcome<A>>> {
        self.slots.lock()[index] = Some(outcome);

        if self.remaining.fetch_sub(1, Ordering::AcqRel) != 1 {
            return None;
        }

        let slots = mem::take(&mut *self.slots.lock());
        Some(slots.into_iter().flatten().collect())
    }
}
