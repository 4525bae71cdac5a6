pub mod caps;
pub mod feasibility;
pub mod insights;
pub mod rotation;
pub mod scenario;
pub mod scoring;
mod validate;

use std::time::Duration;
use thiserror::Error;

pub use feasibility::{validate_feasibility, CapacityError};
pub use rotation::{rotate, rotations, DEFAULT_ROTATION_PERIOD};
pub use scenario::apply_scenario;
pub use types::{
    Assignment, CapacityReport, Class, ClassId, ClassPriorityConfig, ClassSubject, Instance,
    ScenarioDelta, SchoolConfig, SolveEnvelope, SolveParams, SolveResult, SolveStatus, Subject,
    Teacher, TeacherId, Timetable,
};
pub use validate::{validate, ValidationError};

#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error("no timetable satisfies every hard constraint")]
    NoSolution,
    #[error("solver gave up after {budget:?} without a proof either way")]
    Timeout {
        budget: Duration,
        partial: Option<Box<Timetable>>,
    },
    #[error("solver backend failed: {0}")]
    Backend(String),
}

impl SolveError {
    pub fn status(&self) -> Option<SolveStatus> {
        match self {
            SolveError::NoSolution => Some(SolveStatus::Infeasible),
            SolveError::Timeout { .. } => Some(SolveStatus::Unknown),
            _ => None,
        }
    }
}

/// A solve is one synchronous, CPU-bound call; callers that must not block
/// run it on a blocking pool.
pub trait Solver: Send + Sync + 'static {
    fn solve(&self, env: &SolveEnvelope) -> Result<SolveResult, SolveError>;
}
