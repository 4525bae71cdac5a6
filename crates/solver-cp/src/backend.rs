use crate::model::{Model, Value};
use crate::objective::Objective;
use sched_core::SolveError;
use std::time::Duration;
use types::SolveStatus;

/// Raw result of one backend run, before it is decoded into a timetable.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub status: SolveStatus,
    /// Complete assignment for `Optimal` and `Feasible`.
    pub values: Option<Vec<Value>>,
    /// Deepest partial assignment seen, for `Unknown`.
    pub partial: Option<Vec<Option<Value>>>,
    pub objective: i64,
    pub stats: serde_json::Value,
}

impl Outcome {
    pub fn infeasible(stats: serde_json::Value) -> Self {
        Self {
            status: SolveStatus::Infeasible,
            values: None,
            partial: None,
            objective: 0,
            stats,
        }
    }
}

pub trait Backend {
    fn name(&self) -> &'static str;

    /// Maximises `objective` subject to every constraint of `model` within
    /// `budget`. Errors are reserved for failures of the backend itself.
    fn run(
        &self,
        model: &Model<'_>,
        objective: &Objective,
        budget: Duration,
    ) -> Result<Outcome, SolveError>;
}
