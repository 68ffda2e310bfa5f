use super::gather::Gather;
use super::policy::{BothPolicy, Combine};
use crate::cont::trampoline::{Flow, Trampoline};
use crate::cont::{Cont, guarded};
use crate::error::ContError;
use crate::observer::Observer;
use crate::outcome::Outcome;

use std::mem;
use std::sync::Arc;

/// Tags the two sides of [`Cont::both`] so they can share one join.
enum Side<A, B> {
    Left(A),
    Right(B),
}

impl<E, A> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Runs `self` and `other` and combines their values.
    ///
    /// Both must succeed. Failures are handled according to `policy`; see
    /// [`Cont::all`].
    pub fn both<B, C, F>(self, other: Cont<E, B>, combine: F, policy: BothPolicy) -> Cont<E, C>
    where
        B: Send + 'static,
        C: Send + 'static,
        F: Fn(A, B) -> C + Send + Sync + 'static,
    {
        let sides = vec![self.map(Side::Left), other.map(Side::Right)];

        Cont::all(sides, policy).try_map(move |values| {
            let mut values = values.into_iter();

            match (values.next(), values.next()) {
                (Some(Side::Left(left)), Some(Side::Right(right))) => Ok(combine(left, right)),
                _ => Err(ContError::msg("both: participant values out of position")),
            }
        })
    }

    /// Runs every participant and collects their values.
    ///
    /// The output preserves input positions, whatever the completion order.
    ///
    /// - [`Policy::Sequence`](super::Policy::Sequence): one after another;
    ///   the first failure terminates and later participants never start.
    /// - [`Policy::MergeWhenAll`](super::Policy::MergeWhenAll): all start;
    ///   once all settled, the error lists of every failure are folded with
    ///   the policy's combine function, in input order.
    /// - [`Policy::QuitFast`](super::Policy::QuitFast): all start; the first
    ///   failure terminates immediately and cancels the others.
    ///
    /// An empty list succeeds with an empty vector.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let sum = Cont::all(vec![fetch(1), fetch(2)], Policy::QuitFast)
    ///     .map(|values| values.into_iter().sum::<u32>());
    /// ```
    pub fn all(participants: Vec<Cont<E, A>>, policy: BothPolicy) -> Cont<E, Vec<A>> {
        let participants = Arc::new(participants);

        match policy {
            BothPolicy::Sequence => sequence(participants),
            BothPolicy::MergeWhenAll(combine) => merge_when_all(participants, combine),
            BothPolicy::QuitFast => quit_fast(participants),
        }
    }
}

fn sequence<E, A>(participants: Arc<Vec<Cont<E, A>>>) -> Cont<E, Vec<A>>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    Cont::raw(move |runtime, observer| {
        let participants = participants.clone();
        let mut values = Vec::with_capacity(participants.len());
        let mut next = 0;

        Trampoline::start(runtime.clone(), move |last| {
            match last {
                Some(Outcome::Success(value)) => values.push(value),
                Some(Outcome::Failure(errors)) => {
                    return Flow::settle(&observer, Outcome::Failure(errors));
                }
                None => {}
            }

            match participants.get(next) {
                Some(participant) => {
                    next += 1;
                    Flow::Run(participant.clone())
                }
                None => Flow::settle(&observer, Outcome::Success(mem::take(&mut values))),
            }
        });
    })
}

fn merge_when_all<E, A>(
    participants: Arc<Vec<Cont<E, A>>>,
    combine: Combine<Vec<ContError>>,
) -> Cont<E, Vec<A>>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    Cont::raw(move |runtime, observer| {
        if participants.is_empty() {
            observer.on_value(Vec::new());
            return;
        }

        let gather = Arc::new(Gather::new(participants.len()));

        for (index, participant) in participants.iter().enumerate() {
            if runtime.is_cancelled() {
                return;
            }

            let gather = gather.clone();
            let combine = combine.clone();
            let current = runtime.clone();
            let observer = observer.clone();

            participant.run_with(
                runtime,
                Observer::new(move |outcome| {
                    let Some(outcomes) = gather.record(index, outcome) else {
                        return;
                    };

                    if !current.is_cancelled() {
                        observer.settle(fold_join(outcomes, &combine));
                    }
                }),
            );
        }
    })
}

fn fold_join<A>(outcomes: Vec<Outcome<A>>, combine: &Combine<Vec<ContError>>) -> Outcome<Vec<A>> {
    let mut values = Vec::with_capacity(outcomes.len());
    let mut failed: Option<Vec<ContError>> = None;

    for outcome in outcomes {
        match outcome {
            Outcome::Success(value) => values.push(value),
            Outcome::Failure(errors) => {
                failed = Some(match failed.take() {
                    None => errors,
                    Some(acc) => match guarded(|| combine(acc, errors)) {
                        Ok(merged) => merged,
                        Err(err) => return Outcome::Failure(vec![err]),
                    },
                });
            }
        }
    }

    match failed {
        Some(errors) => Outcome::Failure(errors),
        None => Outcome::Success(values),
    }
}

fn quit_fast<E, A>(participants: Arc<Vec<Cont<E, A>>>) -> Cont<E, Vec<A>>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    Cont::raw(move |runtime, observer| {
        if participants.is_empty() {
            observer.on_value(Vec::new());
            return;
        }

        let (group_runtime, group) = runtime.group();
        let gather = Arc::new(Gather::new(participants.len()));

        for (index, participant) in participants.iter().enumerate() {
            // Decided already, or the whole execution was cancelled.
            if group_runtime.is_cancelled() {
                return;
            }

            let gather = gather.clone();
            let group = group.clone();
            let current = runtime.clone();
            let observer = observer.clone();

            participant.run_with(
                &group_runtime,
                Observer::new(move |outcome| match outcome {
                    Outcome::Failure(errors) => {
                        tracing::debug!(index, "join decided by failure, cancelling group");
                        group.cancel();

                        if !current.is_cancelled() {
                            observer.on_terminate(errors);
                        }
                    }
                    Outcome::Success(value) => {
                        let Some(outcomes) = gather.record(index, Outcome::Success(value)) else {
                            return;
                        };

                        if !current.is_cancelled() {
                            let values = outcomes.into_iter().filter_map(Outcome::success).collect();
                            observer.on_value(values);
                        }
                    }
                }),
            );
        }
    })
}
