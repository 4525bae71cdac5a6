pub mod backend;
pub mod model;
pub mod objective;
pub mod search;

#[cfg(feature = "with-milp")]
mod milp_core;

#[cfg(feature = "with-milp")]
pub use milp_core::MilpBackend;

use backend::{Backend, Outcome};
use model::{Model, Value};
use objective::Objective;
use sched_core::{validate, validate_feasibility, Solver, SolveError};
use search::SearchBackend;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use types::{
    Assignment, BackendKind, Instance, SolveEnvelope, SolveResult, SolveStatus, Timetable,
};

#[derive(Clone, Debug, Default)]
pub struct CpSolver {
    search: SearchBackend,
}

impl CpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn backend(&self, kind: BackendKind) -> &dyn Backend {
        match kind {
            BackendKind::Search => &self.search,
            #[cfg(feature = "with-milp")]
            BackendKind::Milp => &MilpBackend,
            #[cfg(not(feature = "with-milp"))]
            BackendKind::Milp => {
                warn!("built without with-milp, falling back to search");
                &self.search
            }
        }
    }
}

impl Solver for CpSolver {
    fn solve(&self, env: &SolveEnvelope) -> Result<SolveResult, SolveError> {
        let budget = Duration::from_millis(env.params.time_limit_ms);
        solve_with(&env.instance, budget, self.backend(env.params.backend))
    }
}

/// Solves with the default backend and returns only the timetable.
pub fn solve(inst: &Instance, budget: Duration) -> Result<Timetable, SolveError> {
    solve_with(inst, budget, &SearchBackend::default()).map(|r| r.timetable)
}

pub fn solve_with(
    inst: &Instance,
    budget: Duration,
    backend: &dyn Backend,
) -> Result<SolveResult, SolveError> {
    validate(inst)?;
    let report = validate_feasibility(inst)?;

    let started = Instant::now();
    let model = model::build(inst);
    let objective = Objective::build(&model);
    info!(
        classes = inst.classes.len(),
        vars = model.vars.len(),
        constraints = model.constraints.len(),
        pairs = objective.pairs.len(),
        scored = !objective.is_trivial(),
        backend = backend.name(),
        "model built"
    );

    let out = backend.run(&model, &objective, budget)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    info!(status = ?out.status, objective = out.objective, elapsed_ms, "solve finished");

    let Outcome {
        status,
        values,
        partial,
        objective: score,
        mut stats,
    } = out;
    match status {
        SolveStatus::Optimal | SolveStatus::Feasible => {
            let values = values.ok_or_else(|| {
                SolveError::Backend("backend reported a solution without values".into())
            })?;
            if let Some(map) = stats.as_object_mut() {
                map.insert("elapsedMs".into(), elapsed_ms.into());
                map.insert("required".into(), report.required.into());
                map.insert("slotCapacity".into(), report.slot_capacity.into());
                map.insert("relaxedTeachers".into(), relaxed_teachers(&model).into());
            }
            Ok(SolveResult {
                status,
                objective: score,
                timetable: decode(&model, values.into_iter().map(Some)),
                stats,
            })
        }
        SolveStatus::Infeasible => Err(SolveError::NoSolution),
        SolveStatus::Unknown => {
            warn!(?budget, "time budget exhausted without a timetable");
            Err(SolveError::Timeout {
                budget,
                partial: partial.map(|p| Box::new(decode(&model, p))),
            })
        }
    }
}

fn relaxed_teachers(model: &Model<'_>) -> Vec<String> {
    model
        .inst
        .teachers
        .iter()
        .zip(&model.caps)
        .filter(|(t, cap)| cap.relaxed(t.max_periods_per_day))
        .map(|(t, _)| t.id.to_string())
        .collect()
}

fn decode(model: &Model<'_>, values: impl IntoIterator<Item = Option<Value>>) -> Timetable {
    let inst = model.inst;
    let assignments = values.into_iter().enumerate().filter_map(|(x, v)| {
        let (subject, teacher) = model.subject(x, v?)?;
        let var = model.vars[x];
        Some(Assignment {
            class_id: model.class_id(x).clone(),
            day: var.day,
            period: var.period,
            subject: subject.clone(),
            teacher_id: teacher.clone(),
        })
    });
    Timetable::from_assignments(
        inst.config.clone(),
        inst.classes.iter().map(|c| c.id.clone()).collect(),
        assignments,
    )
}
