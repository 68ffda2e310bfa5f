use super::{Job, Scheduler};

/// Runs every job synchronously, on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Scheduler for Immediate {
    fn schedule(&self, job: Job) {
        job()
    }
}
