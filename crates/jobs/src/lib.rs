//! In-memory job table for solves that outlive a request.

use parking_lot::RwLock;
use sched_core::{SolveEnvelope, SolveError, SolveResult, Solver};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use types::{CapacityReport, Timetable};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum JobStatus {
    Queued,
    Running,
    Solved { result: SolveResult },
    Infeasible { message: String },
    CapacityExceeded { report: CapacityReport },
    TimedOut { partial: Option<Timetable> },
    Invalid { errors: Vec<String> },
    Failed { message: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Running)
    }
}

impl From<Result<SolveResult, SolveError>> for JobStatus {
    fn from(r: Result<SolveResult, SolveError>) -> Self {
        match r {
            Ok(result) => JobStatus::Solved { result },
            Err(e @ SolveError::NoSolution) => JobStatus::Infeasible {
                message: e.to_string(),
            },
            Err(SolveError::Capacity(e)) => JobStatus::CapacityExceeded { report: e.report() },
            Err(SolveError::Timeout { partial, .. }) => JobStatus::TimedOut {
                partial: partial.map(|p| *p),
            },
            Err(SolveError::Validation(e)) => JobStatus::Invalid {
                errors: e.issues().to_vec(),
            },
            Err(e @ SolveError::Backend(_)) => JobStatus::Failed {
                message: e.to_string(),
            },
        }
    }
}

pub struct InMemJobs<S: Solver> {
    inner: Arc<RwLock<HashMap<String, JobStatus>>>,
    solver: Arc<S>,
}

impl<S: Solver> Clone for InMemJobs<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            solver: self.solver.clone(),
        }
    }
}

impl<S: Solver> InMemJobs<S> {
    pub fn new(solver: S) -> Self {
        Self {
            inner: Default::default(),
            solver: Arc::new(solver),
        }
    }

    /// Records the job as queued and runs the solve on the blocking pool.
    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, env: SolveEnvelope) -> JobId {
        let id = Uuid::new_v4().to_string();
        self.inner.write().insert(id.clone(), JobStatus::Queued);

        let map = self.inner.clone();
        let solver = self.solver.clone();
        let id_for_task = id.clone();

        tokio::spawn(async move {
            map.write().insert(id_for_task.clone(), JobStatus::Running);
            let status = match tokio::task::spawn_blocking(move || solver.solve(&env)).await {
                Ok(r) => JobStatus::from(r),
                Err(e) => {
                    error!(job = %id_for_task, ?e, "solver task panicked");
                    JobStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };
            match &status {
                JobStatus::Failed { message } => warn!(job = %id_for_task, %message, "job failed"),
                _ => info!(job = %id_for_task, ?status, "job finished"),
            }
            map.write().insert(id_for_task, status);
        });

        JobId(id)
    }

    pub fn get(&self, id: &str) -> Option<JobStatus> {
        self.inner.read().get(id).cloned()
    }
}
