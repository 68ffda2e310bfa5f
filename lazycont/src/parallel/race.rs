use super::gather::Gather;
use super::policy::{Combine, EitherPolicy};
use crate::cont::trampoline::{Flow, Trampoline};
use crate::cont::{Cont, guarded};
use crate::error::ContError;
use crate::observer::Observer;
use crate::outcome::Outcome;

use std::mem;
use std::sync::Arc;

impl<E, A> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Races `self` against `other`; see [`Cont::any`].
    pub fn either(self, other: Cont<E, A>, policy: EitherPolicy<A>) -> Cont<E, A> {
        Cont::any(vec![self, other], policy)
    }

    /// Settles with the first success among the participants.
    ///
    /// - [`Policy::Sequence`](super::Policy::Sequence): one after another;
    ///   the first success wins and later participants never start.
    /// - [`Policy::MergeWhenAll`](super::Policy::MergeWhenAll): all start;
    ///   once all settled, the values of every success are folded with the
    ///   policy's combine function, in input order.
    /// - [`Policy::QuitFast`](super::Policy::QuitFast): all start; the first
    ///   success wins immediately and cancels the others.
    ///
    /// When no participant succeeds, the race terminates with the errors of
    /// every participant concatenated in input order. An empty list
    /// terminates cleanly.
    pub fn any(participants: Vec<Cont<E, A>>, policy: EitherPolicy<A>) -> Cont<E, A> {
        let participants = Arc::new(participants);

        match policy {
            EitherPolicy::Sequence => sequence(participants),
            EitherPolicy::MergeWhenAll(combine) => merge_when_all(participants, combine),
            EitherPolicy::QuitFast => quit_fast(participants),
        }
    }
}

fn sequence<E, A>(participants: Arc<Vec<Cont<E, A>>>) -> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    Cont::raw(move |runtime, observer| {
        let participants = participants.clone();
        let mut errors: Vec<ContError> = Vec::new();
        let mut next = 0;

        Trampoline::start(runtime.clone(), move |last| {
            match last {
                Some(Outcome::Success(value)) => {
                    return Flow::settle(&observer, Outcome::Success(value));
                }
                Some(Outcome::Failure(more)) => errors.extend(more),
                None => {}
            }

            match participants.get(next) {
                Some(participant) => {
                    next += 1;
                    Flow::Run(participant.clone())
                }
                None => Flow::settle(&observer, Outcome::Failure(mem::take(&mut errors))),
            }
        });
    })
}

fn merge_when_all<E, A>(participants: Arc<Vec<Cont<E, A>>>, combine: Combine<A>) -> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    Cont::raw(move |runtime, observer| {
        if participants.is_empty() {
            observer.on_terminate(Vec::new());
            return;
        }

        let gather = Arc::new(Gather::<A>::new(participants.len()));

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
                        observer.settle(fold_race(outcomes, &combine));
                    }
                }),
            );
        }
    })
}

fn fold_race<A>(outcomes: Vec<Outcome<A>>, combine: &Combine<A>) -> Outcome<A> {
    let mut winner: Option<A> = None;
    let mut errors = Vec::new();

    for outcome in outcomes {
        match outcome {
            Outcome::Success(value) => {
                winner = Some(match winner.take() {
                    None => value,
                    Some(acc) => match guarded(|| combine(acc, value)) {
                        Ok(merged) => merged,
                        Err(err) => return Outcome::Failure(vec![err]),
                    },
                });
            }
            Outcome::Failure(more) => errors.extend(more),
        }
    }

    match winner {
        Some(value) => Outcome::Success(value),
        None => Outcome::Failure(errors),
    }
}

fn quit_fast<E, A>(participants: Arc<Vec<Cont<E, A>>>) -> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    Cont::raw(move |runtime, observer| {
        if participants.is_empty() {
            observer.on_terminate(Vec::new());
            return;
        }

        let (group_runtime, group) = runtime.group();
        let gather = Arc::new(Gather::<A>::new(participants.len()));

        for (index, participant) in participants.iter().enumerate() {
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
                    Outcome::Success(value) => {
                        tracing::debug!(index, "race decided by success, cancelling group");
                        group.cancel();

                        if !current.is_cancelled() {
                            observer.on_value(value);
                        }
                    }
                    Outcome::Failure(errors) => {
                        let Some(outcomes) = gather.record(index, Outcome::Failure(errors)) else {
                            return;
                        };

                        if !current.is_cancelled() {
                            let errors = outcomes
                                .into_iter()
                                .filter_map(Outcome::failure)
                                .flatten()
                                .collect();
                            observer.on_terminate(errors);
                        }
                    }
                }),
            );
        }
    })
}
