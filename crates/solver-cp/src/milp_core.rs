//! Binary formulation of the same model for CBC: one 0/1 column per
//! `(var, value)` literal, the free value left implicit.

use crate::backend::{Backend, Outcome};
use crate::model::{Model, Op, Value};
use crate::objective::Objective;
use good_lp::{
    coin_cbc, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use sched_core::SolveError;
use serde_json::json;
use std::time::Duration;
use tracing::warn;
use types::SolveStatus;

pub struct MilpBackend;

pub(crate) struct Vars {
    /// `[var][value]`, `None` for the free value.
    pub lits: Vec<Vec<Option<Variable>>>,
    /// One indicator per pair term: both ends heavy.
    pub adj: Vec<Variable>,
}

pub(crate) fn declare_literals(
    model: &Model<'_>,
    pv: &mut ProblemVariables,
) -> Vec<Vec<Option<Variable>>> {
    (0..model.vars.len())
        .map(|x| {
            let free = model.free(x);
            (0..model.domain_size(x))
                .map(|v| (v != free).then(|| pv.add(variable().binary())))
                .collect()
        })
        .collect()
}

pub(crate) fn declare_adjacency_vars(
    objective: &Objective,
    pv: &mut ProblemVariables,
) -> Vec<Variable> {
    objective
        .pairs
        .iter()
        .map(|_| pv.add(variable().binary()))
        .collect()
}

fn heavy_sum(objective: &Objective, v: &Vars, x: usize) -> Expression {
    let mut sum = Expression::from(0.0);
    for (value, lit) in v.lits[x].iter().enumerate() {
        if let Some(lit) = lit {
            if objective.heavy[x][value] {
                sum = sum + *lit;
            }
        }
    }
    sum
}

pub(crate) fn build_objective(objective: &Objective, v: &Vars) -> Expression {
    let mut expr = Expression::from(0.0);
    for (x, lits) in v.lits.iter().enumerate() {
        for (value, lit) in lits.iter().enumerate() {
            let gain = objective.unary[x][value];
            if let (Some(lit), true) = (lit, gain != 0) {
                expr = expr + (gain as f64) * *lit;
            }
        }
    }
    for (t, &y) in objective.pairs.iter().zip(&v.adj) {
        expr = expr + (t.weight as f64) * y;
    }
    expr
}

pub(crate) fn add_one_value_constraints<M: SolverModel>(mut lp: M, v: &Vars) -> M {
    for lits in &v.lits {
        let mut sum = Expression::from(0.0);
        for lit in lits.iter().flatten() {
            sum = sum + *lit;
        }
        lp = lp.with(sum.leq(1.0));
    }
    lp
}

pub(crate) fn add_counting_constraints<M: SolverModel>(
    mut lp: M,
    model: &Model<'_>,
    v: &Vars,
) -> M {
    for con in &model.constraints {
        let mut sum = Expression::from(0.0);
        for l in &con.lits {
            if let Some(lit) = v.lits[l.var][l.value] {
                sum = sum + lit;
            }
        }
        let rhs = f64::from(con.rhs);
        lp = match con.op {
            Op::Le => lp.with(sum.leq(rhs)),
            Op::Eq => lp.with(sum.eq(rhs)),
        };
    }
    lp
}

pub(crate) fn add_adjacency_constraints<M: SolverModel>(
    mut lp: M,
    objective: &Objective,
    v: &Vars,
) -> M {
    for (t, &y) in objective.pairs.iter().zip(&v.adj) {
        let ha = heavy_sum(objective, v, t.a);
        let hb = heavy_sum(objective, v, t.b);
        lp = lp.with((y - ha.clone()).leq(0.0));
        lp = lp.with((y - hb.clone()).leq(0.0));
        lp = lp.with((y - ha - hb).geq(-1.0));
    }
    lp
}

pub(crate) fn extract_values(model: &Model<'_>, v: &Vars, sol: &impl Solution) -> Vec<Value> {
    v.lits
        .iter()
        .enumerate()
        .map(|(x, lits)| {
            lits.iter()
                .position(|lit| lit.is_some_and(|l| sol.value(l) > 0.5))
                .unwrap_or_else(|| model.free(x))
        })
        .collect()
}

impl Backend for MilpBackend {
    fn name(&self) -> &'static str {
        "milp"
    }

    fn run(
        &self,
        model: &Model<'_>,
        objective: &Objective,
        budget: Duration,
    ) -> Result<Outcome, SolveError> {
        let mut pv = ProblemVariables::new();
        let lits = declare_literals(model, &mut pv);
        let adj = declare_adjacency_vars(objective, &mut pv);
        let v = Vars { lits, adj };

        let mut lp = pv.maximise(build_objective(objective, &v)).using(coin_cbc);
        lp.set_parameter("seconds", &budget.as_secs_f64().to_string());
        lp.set_parameter("log", "0");
        lp = add_one_value_constraints(lp, &v);
        lp = add_counting_constraints(lp, model, &v);
        lp = add_adjacency_constraints(lp, objective, &v);

        let stats = json!({
            "backend": self.name(),
            "columns": v.lits.iter().flatten().flatten().count() + v.adj.len(),
            "rows": model.constraints.len() + model.vars.len() + 3 * v.adj.len(),
        });
        match lp.solve() {
            Ok(sol) => {
                let values = extract_values(model, &v, &sol);
                Ok(Outcome {
                    status: SolveStatus::Optimal,
                    objective: objective.evaluate(&values),
                    values: Some(values),
                    partial: None,
                    stats,
                })
            }
            Err(ResolutionError::Infeasible) => Ok(Outcome::infeasible(stats)),
            Err(ResolutionError::Other(reason)) if reason == "Stopped" => {
                warn!(?budget, "cbc stopped on its time limit");
                Ok(Outcome {
                    status: SolveStatus::Unknown,
                    values: None,
                    partial: None,
                    objective: 0,
                    stats,
                })
            }
            Err(e) => Err(SolveError::Backend(e.to_string())),
        }
    }
}
