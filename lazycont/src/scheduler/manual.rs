use super::{Job, Scheduler};

use parking_lot::Mutex;
use std::collections::VecDeque;

/// A scheduler that only runs jobs when told to.
///
/// Jobs are queued in submission order. The owner drains them with
/// [`run_next`](Self::run_next) (oldest first), [`run_last`](Self::run_last)
/// (newest first) or [`run_all`](Self::run_all). Jobs always run outside the
/// internal lock, so they may schedule further jobs.
///
/// # Examples
///
/// ```rust,ignore
/// let scheduler = Arc::new(ManualScheduler::new());
/// let slow = Cont::<(), i32>::of(1).observe_on(scheduler.clone());
///
/// slow.run((), |v| println!("{v}"), |_| {});
/// assert_eq!(scheduler.len(), 1);
/// scheduler.run_all(); // prints 1
/// ```
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<Job>>,
}

impl ManualScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns `true` if no job is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Runs the oldest queued job. Returns `false` if the queue was empty.
    pub fn run_next(&self) -> bool {
        let job = self.queue.lock().pop_front();
        Self::run_job(job)
    }

    /// Runs the most recently queued job. Returns `false` if the queue was
    /// empty.
    pub fn run_last(&self) -> bool {
        let job = self.queue.lock().pop_back();
        Self::run_job(job)
    }

    /// Runs queued jobs, including the ones they schedule, until the queue
    /// is empty.
    ///
    /// # Returns
    ///
    /// The number of jobs that ran.
    pub fn run_all(&self) -> usize {
        let mut count = 0;
        while self.run_next() {
            count += 1;
        }
        count
    }

    fn run_job(job: Option<Job>) -> bool {
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, job: Job) {
        self.queue.lock().push_back(job);
    }
}
