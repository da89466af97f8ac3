//! Shared state of long-running background jobs.
//!
//! - `JobsState`: cloneable handle injected into the Actix app; holds every
//!   job's latest status.
//! - `JobUpdate`: status change sent by a running job.
//! - `start_job_updater`: task that applies `JobUpdate`s to the shared map.

use catalog_common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

#[derive(Clone)]
pub struct JobsState {
    /// Job id -> latest status. Read by the status endpoint, written only by
    /// `start_job_updater`.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Jobs report progress through this sender instead of locking `jobs`.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// Returns the state and the receiver to hand to `start_job_updater`.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Records a new job as `Pending` so it can be polled before it starts.
    pub async fn register(&self, job_id: &str) {
        self.jobs
            .write()
            .await
            .insert(job_id.to_string(), JobStatus::Pending);
    }

    /// # Returns
    /// The latest status of `job_id`, or `None` when no such job was registered.
    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

/// A status change for one job, sent through `JobsState::tx`.
#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

/// Applies updates for as long as the channel is open.
///
/// # Arguments
/// * `state` - The shared state whose map receives the statuses.
/// * `rx` - The receiving end returned by `JobsState::new`.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id, update.status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn updates_overwrite_registered_status() {
        let (state, rx) = JobsState::new(8);
        state.register("job-1").await;
        assert_eq!(state.status("job-1").await, Some(JobStatus::Pending));

        let updater = tokio::spawn(start_job_updater(state.clone(), rx));
        for status in [JobStatus::InProgress(50), JobStatus::Completed("done".into())] {
            state
                .tx
                .send(JobUpdate {
                    job_id: "job-1".into(),
                    status,
                })
                .await
                .unwrap();
        }

        let done = Some(JobStatus::Completed("done".into()));
        for _ in 0..100 {
            if state.status("job-1").await == done {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(state.status("job-1").await, done);
        assert_eq!(state.status("job-2").await, None);
        updater.abort();
    }
}
