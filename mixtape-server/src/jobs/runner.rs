//! Background execution of registry-tracked jobs

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{JobError, JobId, JobKind, JobRegistry, JobStatus};
use crate::error::Result;

/// Handle given to job work for reporting progress
#[derive(Debug, Clone)]
pub struct JobContext {
    id: JobId,
    registry: Arc<JobRegistry>,
}

impl JobContext {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Mark the job running. Work should call this once it begins.
    pub fn start(&self) -> std::result::Result<(), JobError> {
        self.registry.mark_running(self.id).map(|_| ())
    }
}

/// Create a job and run `work` on its own tokio task.
///
/// Returns immediately with the job token. The work's `Ok` value is stored as
/// the job result and an `Err` (or a panic) as the job error. Failures never
/// reach the caller that submitted the job.
pub fn spawn_job<F, Fut>(
    registry: Arc<JobRegistry>,
    kind: JobKind,
    work: F,
) -> (JobId, JoinHandle<()>)
where
    F: FnOnce(JobContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    let id = registry.create(kind);
    let ctx = JobContext {
        id,
        registry: Arc::clone(&registry),
    };

    let handle = tokio::spawn(async move {
        let outcome = tokio::spawn(work(ctx)).await;

        let recorded = match outcome {
            Ok(Ok(result)) => {
                let started = match registry.lookup(id).map(|job| job.status) {
                    Some(JobStatus::Pending) => registry.mark_running(id).map(|_| ()),
                    _ => Ok(()),
                };
                info!(job_id = %id, result = %result, "Job completed");
                started.and_then(|_| registry.complete(id, result))
            }
            Ok(Err(err)) => {
                error!(job_id = %id, error = %err, "Job failed");
                registry.fail(id, err.to_string())
            }
            Err(join_err) => {
                error!(job_id = %id, error = %join_err, "Job task aborted");
                registry.fail(id, format!("Job task aborted: {}", join_err))
            }
        };

        if let Err(err) = recorded {
            warn!(job_id = %id, error = %err, "Could not record job outcome");
        }
    });

    (id, handle)
}
