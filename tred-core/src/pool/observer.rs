use crate::crypto::engine::Sealed;
use crate::error::Result;
use crate::job::Job;

/// Hooks called from worker threads around each job.
pub trait JobObserver: Send + Sync {
    /// Job accepted by `worker`, about to touch the file.
    fn started(&self, _worker: &str, _job: &Job) {}

    /// Job reached a terminal state. Called exactly once per job.
    fn finished(&self, worker: &str, job: &Job, result: &Result<Sealed>);
}

pub struct NoopObserver;

impl JobObserver for NoopObserver {
    fn finished(&self, _worker: &str, _job: &Job, _result: &Result<Sealed>) {}
}
