//! In-memory job registry
//!
//! Every long-running operation (mixtape build, video render) is tracked as a
//! [`Job`]. Jobs start `pending`, move to `running`, and end `completed` or
//! `failed`. Status never moves backwards and terminal jobs are frozen.
//!
//! The registry is a single map behind one lock. It is built once at startup
//! and shared with handlers and background tasks through an `Arc`.

pub mod runner;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use mixtape_common::uuid_utils;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub use runner::{spawn_job, JobContext};

/// Opaque job token, rendered as 32 lowercase hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(uuid_utils::generate())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&uuid_utils::to_simple_string(&self.0))
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid_utils::parse(s).map(Self)
    }
}

impl TryFrom<String> for JobId {
    type Error = uuid::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.to_string()
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether `self -> next` is a forward move in the lifecycle
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Failed) | (Running, Completed) | (Running, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which operation a job wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Mixtape,
    Video,
}

/// Snapshot of one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,

    /// Output artifact path once completed
    pub result: Option<String>,

    /// Failure message once failed
    pub error: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    fn new(kind: JobKind) -> Self {
        let now = Utc::now();
        Self {
            job_id: JobId::new(),
            kind,
            status: JobStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Job registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}

/// Process-wide job table
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Job>> {
        // Mutations replace whole fields, so a poisoned map is still consistent
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Allocate a pending job and return its token
    pub fn create(&self, kind: JobKind) -> JobId {
        let job = Job::new(kind);
        let id = job.job_id;
        self.lock().insert(id, job);
        debug!(job_id = %id, ?kind, "Job created");
        id
    }

    /// Move a job to `status`, replacing its result and error.
    ///
    /// Backward moves and moves out of a terminal status are rejected and
    /// leave the job untouched.
    pub fn transition(
        &self,
        id: JobId,
        status: JobStatus,
        result: Option<String>,
        error: Option<String>,
    ) -> Result<Job, JobError> {
        let mut jobs = self.lock();
        let job = jobs.get_mut(&id).ok_or(JobError::NotFound(id))?;

        if !job.status.can_transition_to(status) {
            warn!(job_id = %id, from = %job.status, to = %status, "Rejected job transition");
            return Err(JobError::InvalidTransition {
                from: job.status,
                to: status,
            });
        }

        job.status = status;
        job.result = result;
        job.error = error;
        job.updated_at = Utc::now();

        debug!(job_id = %id, status = %status, "Job transitioned");
        Ok(job.clone())
    }

    /// Consistent snapshot of a job, `None` if the token was never issued
    pub fn lookup(&self, id: JobId) -> Option<Job> {
        self.lock().get(&id).cloned()
    }

    pub fn mark_running(&self, id: JobId) -> Result<Job, JobError> {
        self.transition(id, JobStatus::Running, None, None)
    }

    pub fn complete(&self, id: JobId, result: impl Into<String>) -> Result<Job, JobError> {
        self.transition(id, JobStatus::Completed, Some(result.into()), None)
    }

    pub fn fail(&self, id: JobId, error: impl Into<String>) -> Result<Job, JobError> {
        self.transition(id, JobStatus::Failed, None, Some(error.into()))
    }

    /// Number of jobs ever created
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count of jobs per status
    pub fn status_counts(&self) -> HashMap<JobStatus, usize> {
        let mut counts = HashMap::new();
        for job in self.lock().values() {
            *counts.entry(job.status).or_insert(0) += 1;
        }
        counts
    }
}
