use crate::cont::Cont;
use crate::cont::looping::Decision;
use crate::outcome::Outcome;
use crate::scheduler::Scheduler;

/// Builds a continuation retrying the attempt produced by `factory`.
///
/// `factory` is called for every attempt, so each one starts from fresh
/// state. After `times` failed retries the last errors are propagated.
///
/// # Arguments
///
/// * `times` - Number of extra attempts after the first one.
/// * `factory` - Produces the continuation for one attempt.
///
/// # Examples
///
/// ```rust,ignore
/// let connect = retry(3, || Cont::<Config, Conn>::from_run(open_connection));
/// ```
pub fn retry<E, A, G>(times: usize, factory: G) -> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
    G: Fn() -> Cont<E, A> + Send + Sync + 'static,
{
    Cont::from_deferred(factory).retry(times)
}

impl<E, A> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Re-runs `self` after a termination, at most `times` more times.
    ///
    /// The attempt counter belongs to one execution: running the result
    /// twice gives each run its own `times` retries.
    pub fn retry(self, times: usize) -> Cont<E, A> {
        let again = self.clone();
        retrying(self, again, times)
    }

    /// Like [`retry`](Self::retry), but every retry is started through
    /// `scheduler`.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// // Wait 50ms between attempts.
    /// let polled = check_status().retry_with(5, ThreadScheduler::with_delay(Duration::from_millis(50)));
    /// ```
    pub fn retry_with<S>(self, times: usize, scheduler: S) -> Cont<E, A>
    where
        S: Scheduler + 'static,
    {
        let again = self.clone().subscribe_on(scheduler);
        retrying(self, again, times)
    }
}

fn retrying<E, A>(first: Cont<E, A>, again: Cont<E, A>, times: usize) -> Cont<E, A>
where
    E: Send + Sync + 'static,
    A: Send + 'static,
{
    Cont::looped(first, again, move || {
        let mut remaining = times;

        move |outcome: Outcome<A>| match outcome {
            Outcome::Failure(errors) if remaining > 0 => {
                remaining -= 1;
                tracing::debug!(errors = errors.len(), remaining, "attempt failed; retrying");
                Decision::Again
            }
            outcome => Decision::Stop(outcome),
        }
    })
}
