//! Depth-first search with forward checking and branch-and-bound.
//!
//! Each constraint tracks how many of its literals are true (`count`) and
//! how many unassigned variables could still make one true (`possible`).
//! A value is tried only if no touched constraint would exceed its bound or,
//! for equalities, fall short of it. Variables are picked by fewest
//! remaining values; values by objective gain, then by remaining quota need.

use crate::backend::{Backend, Outcome};
use crate::model::{Kind, Literal, Model, Op, Value};
use crate::objective::Objective;
use sched_core::SolveError;
use serde_json::json;
use std::cmp::Reverse;
use std::time::{Duration, Instant};
use tracing::debug;
use types::SolveStatus;

#[derive(Clone, Debug)]
pub struct SearchBackend {
    /// Nodes between two deadline checks.
    pub check_every: u64,
}

impl Default for SearchBackend {
    fn default() -> Self {
        Self { check_every: 256 }
    }
}

enum Pick {
    Complete,
    DeadEnd,
    Branch(usize, Vec<Value>),
}

struct State<'m, 'a> {
    model: &'m Model<'a>,
    obj: &'m Objective,
    values: Vec<Option<Value>>,
    count: Vec<u32>,
    possible: Vec<u32>,
    assigned: usize,
    score: i64,
    /// Quota constraint per `[class][value]`.
    quota_of: Vec<Vec<usize>>,
    /// Quotas whose literals carry any gain.
    scored_quotas: Vec<usize>,
    best_gain: Vec<i64>,
    best: Option<(i64, Vec<Value>)>,
    deepest: Option<Vec<Option<Value>>>,
    deepest_len: usize,
    nodes: u64,
    check_every: u64,
    deadline: Option<Instant>,
    stopped: bool,
}

impl<'m, 'a> State<'m, 'a> {
    fn new(model: &'m Model<'a>, obj: &'m Objective, budget: Duration, check_every: u64) -> Self {
        let mut possible = vec![0; model.constraints.len()];
        for touched in &model.touch {
            for &c in touched {
                possible[c] += 1;
            }
        }
        let mut quota_of: Vec<Vec<usize>> = model
            .inst
            .classes
            .iter()
            .map(|c| vec![usize::MAX; c.subjects.len()])
            .collect();
        let mut scored_quotas = Vec::new();
        for (c, con) in model.quotas() {
            if let Kind::SubjectQuota { class, value } = con.kind {
                quota_of[class][value] = c;
            }
            if con.lits.iter().any(|l| obj.unary[l.var][l.value] > 0) {
                scored_quotas.push(c);
            }
        }
        let best_gain = obj
            .unary
            .iter()
            .map(|g| g.iter().copied().max().unwrap_or(0))
            .collect();
        Self {
            model,
            obj,
            values: vec![None; model.vars.len()],
            count: vec![0; model.constraints.len()],
            possible,
            assigned: 0,
            score: 0,
            quota_of,
            scored_quotas,
            best_gain,
            best: None,
            deepest: None,
            deepest_len: 0,
            nodes: 0,
            check_every: check_every.max(1),
            deadline: Instant::now().checked_add(budget),
            stopped: false,
        }
    }

    /// Equalities that cannot be met even with every variable still open,
    /// or that a tighter upper bound over a superset of their literals rules
    /// out (a teacher's load above their weekly cap).
    fn root_infeasible(&self) -> bool {
        let cons = &self.model.constraints;
        cons.iter().enumerate().any(|(c, eq)| {
            eq.op == Op::Eq
                && (self.possible[c] < eq.rhs
                    || cons.iter().any(|le| {
                        le.op == Op::Le
                            && le.rhs < eq.rhs
                            && le.lits.len() >= eq.lits.len()
                            && covers(&le.lits, &eq.lits)
                    }))
        })
    }

    fn fits(&self, x: usize, v: Value) -> bool {
        let hits = &self.model.watch[x][v];
        let mut h = 0;
        for &c in &self.model.touch[x] {
            let hit = hits.get(h) == Some(&c);
            if hit {
                h += 1;
            }
            let con = &self.model.constraints[c];
            let count = self.count[c] + u32::from(hit);
            if count > con.rhs {
                return false;
            }
            if con.op == Op::Eq && count + self.possible[c].saturating_sub(1) < con.rhs {
                return false;
            }
        }
        true
    }

    fn assign(&mut self, x: usize, v: Value) -> i64 {
        for &c in &self.model.touch[x] {
            self.possible[c] -= 1;
        }
        for &c in &self.model.watch[x][v] {
            self.count[c] += 1;
        }
        let d = self.obj.delta(x, v, &self.values);
        self.score += d;
        self.values[x] = Some(v);
        self.assigned += 1;
        d
    }

    fn unassign(&mut self, x: usize, v: Value, d: i64) {
        self.assigned -= 1;
        self.values[x] = None;
        self.score -= d;
        for &c in &self.model.watch[x][v] {
            self.count[c] -= 1;
        }
        for &c in &self.model.touch[x] {
            self.possible[c] += 1;
        }
    }

    /// Optimistic completion of the current partial assignment. Pair terms
    /// are never positive, so they are left out.
    fn bound(&self) -> i64 {
        let open = self
            .values
            .iter()
            .zip(&self.best_gain)
            .filter(|(v, _)| v.is_none())
            .map(|(_, g)| *g)
            .sum::<i64>();
        let mut by_quota = 0;
        let mut gains = Vec::new();
        for &c in &self.scored_quotas {
            let con = &self.model.constraints[c];
            let need = con.rhs.saturating_sub(self.count[c]) as usize;
            if need == 0 {
                continue;
            }
            gains.clear();
            gains.extend(
                con.lits
                    .iter()
                    .filter(|l| self.values[l.var].is_none())
                    .map(|l| self.obj.unary[l.var][l.value]),
            );
            gains.sort_unstable_by(|a, b| b.cmp(a));
            by_quota += gains.iter().take(need).sum::<i64>();
        }
        self.score + open.min(by_quota)
    }

    fn pick(&self) -> Pick {
        let mut best: Option<(usize, Vec<Value>)> = None;
        for (x, v) in self.values.iter().enumerate() {
            if v.is_some() {
                continue;
            }
            let dom: Vec<Value> = (0..self.model.domain_size(x))
                .filter(|&v| self.fits(x, v))
                .collect();
            if dom.is_empty() {
                return Pick::DeadEnd;
            }
            if best.as_ref().map_or(true, |(_, b)| dom.len() < b.len()) {
                best = Some((x, dom));
            }
        }
        match best {
            Some((x, dom)) => Pick::Branch(x, dom),
            None => Pick::Complete,
        }
    }

    fn order(&self, x: usize, dom: &mut [Value]) {
        let class = self.model.vars[x].class;
        let free = self.model.free(x);
        dom.sort_by_cached_key(|&v| {
            let need = if v == free {
                0
            } else {
                let c = self.quota_of[class][v];
                self.model.constraints[c].rhs.saturating_sub(self.count[c])
            };
            (
                v == free,
                Reverse(self.obj.delta(x, v, &self.values)),
                Reverse(need),
            )
        });
    }

    fn timed_out(&mut self) -> bool {
        if self.nodes % self.check_every == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.stopped = true;
                }
            }
        }
        self.stopped
    }

    fn dfs(&mut self) {
        if self.timed_out() {
            return;
        }
        self.nodes += 1;
        if self.assigned > self.deepest_len {
            self.deepest_len = self.assigned;
            self.deepest = Some(self.values.clone());
        }
        if let Some((best, _)) = &self.best {
            if self.bound() <= *best {
                return;
            }
        }
        match self.pick() {
            Pick::DeadEnd => {}
            Pick::Complete => {
                if self.best.as_ref().map_or(true, |(b, _)| self.score > *b) {
                    debug!(score = self.score, nodes = self.nodes, "incumbent");
                    let values = self.values.iter().map(|v| v.unwrap_or_default()).collect();
                    self.best = Some((self.score, values));
                }
            }
            Pick::Branch(x, mut dom) => {
                self.order(x, &mut dom);
                for v in dom {
                    let d = self.assign(x, v);
                    self.dfs();
                    self.unassign(x, v, d);
                    if self.stopped {
                        return;
                    }
                }
            }
        }
    }
}

/// Both slices are in `(var, value)` order, as the builder emits them.
fn covers(outer: &[Literal], inner: &[Literal]) -> bool {
    let key = |l: &Literal| (l.var, l.value);
    let mut it = outer.iter();
    inner
        .iter()
        .all(|l| it.by_ref().any(|o| key(o) == key(l)))
}

impl Backend for SearchBackend {
    fn name(&self) -> &'static str {
        "search"
    }

    fn run(
        &self,
        model: &Model<'_>,
        objective: &Objective,
        budget: Duration,
    ) -> Result<Outcome, SolveError> {
        let mut st = State::new(model, objective, budget, self.check_every);
        if st.root_infeasible() {
            return Ok(Outcome::infeasible(json!({ "backend": self.name(), "nodes": 0 })));
        }
        st.dfs();

        let stats = json!({
            "backend": self.name(),
            "nodes": st.nodes,
            "stopped": st.stopped,
        });
        let status = match (&st.best, st.stopped) {
            (Some(_), false) => SolveStatus::Optimal,
            (Some(_), true) => SolveStatus::Feasible,
            (None, false) => SolveStatus::Infeasible,
            (None, true) => SolveStatus::Unknown,
        };
        let (objective, values) = match st.best {
            Some((score, values)) => (score, Some(values)),
            None => (0, None),
        };
        Ok(Outcome {
            status,
            values,
            partial: if status == SolveStatus::Unknown {
                st.deepest
            } else {
                None
            },
            objective,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build;
    use types::{Class, ClassSubject, Instance, Policy, SchoolConfig, Teacher};

    fn inst(periods: u32, load: u32) -> Instance {
        let mut config = SchoolConfig::default();
        config.days.truncate(1);
        config.periods_per_day = periods;
        Instance {
            config,
            teachers: vec![Teacher {
                id: "roy".into(),
                name: None,
                subjects: vec!["Math".into()],
                sections: vec!["1A".into(), "1B".into()],
                max_periods_per_day: 4,
                max_periods_per_week: None,
            }],
            classes: ["1A", "1B"]
                .iter()
                .map(|&id| Class {
                    id: id.into(),
                    subjects: vec![ClassSubject {
                        subject: "Math".into(),
                        weekly_periods: load,
                        teacher_id: "roy".into(),
                    }],
                })
                .collect(),
            priorities: vec![],
            policy: Policy::default(),
        }
    }

    #[test]
    fn shared_teacher_over_two_periods_is_infeasible() {
        let inst = inst(2, 2);
        let m = build(&inst);
        let o = Objective::build(&m);
        let out = SearchBackend::default()
            .run(&m, &o, Duration::from_secs(5))
            .unwrap();
        assert_eq!(out.status, SolveStatus::Infeasible);
    }

    #[test]
    fn shared_teacher_alternates() {
        let inst = inst(4, 2);
        let m = build(&inst);
        let o = Objective::build(&m);
        let out = SearchBackend::default()
            .run(&m, &o, Duration::from_secs(5))
            .unwrap();
        assert_eq!(out.status, SolveStatus::Optimal);
        let values = out.values.unwrap();
        for p in 0..4 {
            let a = values[m.var_at(0, 0, p).unwrap()];
            let b = values[m.var_at(1, 0, p).unwrap()];
            assert!(a == 1 || b == 1, "period {p} double-books roy");
        }
    }

    #[test]
    fn weekly_cap_below_load_fails_at_the_root() {
        let mut inst = inst(4, 2);
        inst.teachers[0].max_periods_per_week = Some(3);
        let m = build(&inst);
        let o = Objective::build(&m);
        let out = SearchBackend::default()
            .run(&m, &o, Duration::from_secs(30))
            .unwrap();
        assert_eq!(out.status, SolveStatus::Infeasible);
        assert_eq!(out.stats["nodes"], 0);
    }

    #[test]
    fn covers_needs_every_inner_literal() {
        let lit = |var, value| Literal { var, value };
        let outer = [lit(0, 0), lit(0, 1), lit(2, 0), lit(3, 1)];
        assert!(covers(&outer, &[lit(0, 1), lit(3, 1)]));
        assert!(!covers(&outer, &[lit(0, 1), lit(1, 0)]));
        assert!(covers(&outer, &[]));
    }

    #[test]
    fn zero_budget_stops_before_any_assignment() {
        let inst = inst(4, 2);
        let m = build(&inst);
        let o = Objective::build(&m);
        let out = SearchBackend::default().run(&m, &o, Duration::ZERO).unwrap();
        assert_eq!(out.status, SolveStatus::Unknown);
        assert!(out.partial.is_none());
    }
}
