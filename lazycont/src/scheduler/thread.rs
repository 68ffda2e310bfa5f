use super::{Job, Scheduler};

use std::thread;
use std::time::Duration;

/// Runs each job on a freshly spawned thread.
///
/// With a delay configured, the thread sleeps before running the job, which
/// turns the scheduler into a simple timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler {
    /// Time to wait before running each job.
    delay: Option<Duration>,
}

impl ThreadScheduler {
    /// Creates a scheduler running jobs as soon as their thread starts.
    pub fn new() -> Self {
        Self { delay: None }
    }

    /// Creates a scheduler running jobs after `delay`.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let timer = ThreadScheduler::with_delay(Duration::from_millis(20));
    /// let late = Cont::<(), &str>::of("done").subscribe_on(timer);
    /// ```
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, job: Job) {
        let delay = self.delay;

        let spawned = thread::Builder::new()
            .name("lazycont-scheduler".into())
            .spawn(move || {
                if let Some(delay) = delay {
                    thread::sleep(delay);
                }
                job();
            });

        if let Err(err) = spawned {
            tracing::error!(%err, "failed to spawn scheduler thread; job dropped");
        }
    }
}
