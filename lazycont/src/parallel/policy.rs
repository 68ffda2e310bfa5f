use crate::error::ContError;

use std::fmt;
use std::sync::Arc;

/// Associative merge function used by [`Policy::MergeWhenAll`].
pub type Combine<T> = Arc<dyn Fn(T, T) -> T + Send + Sync>;

/// Strategy for scheduling participants and combining their outcomes.
pub enum Policy<T> {
    /// Run participants strictly in declaration order. A join stops at the
    /// first failure, a race at the first success.
    Sequence,

    /// Start every participant eagerly and wait for all of them. A join
    /// merges the error lists of all failures, a race merges the values of
    /// all successes.
    MergeWhenAll(Combine<T>),

    /// Start every participant eagerly and finalize on the first decisive
    /// outcome: the first failure for a join, the first success for a race.
    /// Remaining participants are cancelled cooperatively.
    QuitFast,
}

/// Policy of a join: combines error lists.
pub type BothPolicy = Policy<Vec<ContError>>;

/// Policy of a race over values of type `A`: combines values.
pub type EitherPolicy<A> = Policy<A>;

impl<T> Policy<T> {
    /// Builds a [`Policy::MergeWhenAll`] from a closure.
    pub fn merge_when_all<F>(combine: F) -> Self
    where
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        Policy::MergeWhenAll(Arc::new(combine))
    }
}

impl BothPolicy {
    /// [`Policy::MergeWhenAll`] concatenating the error lists in input order.
    pub fn merge_errors() -> Self {
        Policy::merge_when_all(|mut first: Vec<ContError>, second| {
            first.extend(second);
            first
        })
    }
}

impl<T> Clone for Policy<T> {
    fn clone(&self) -> Self {
        match self {
            Policy::Sequence => Policy::Sequence,
            Policy::MergeWhenAll(combine) => Policy::MergeWhenAll(combine.clone()),
            Policy::QuitFast => Policy::QuitFast,
        }
    }
}

impl<T> fmt::Debug for Policy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Sequence => f.write_str("Sequence"),
            Policy::MergeWhenAll(_) => f.write_str("MergeWhenAll(..)"),
            Policy::QuitFast => f.write_str("QuitFast"),
        }
    }
}
