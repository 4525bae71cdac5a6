//! Soft terms of the model, weighted by the instance policy. Every class
//! with a priority config contributes; classes without one contribute zero.

use crate::model::{Model, Value};
use sched_core::scoring::{adjacent_pairs, slot_gain};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairTerm {
    pub a: usize,
    pub b: usize,
    /// Added when both ends hold a heavy subject. Never positive.
    pub weight: i64,
}

#[derive(Clone, Debug, Default)]
pub struct Objective {
    /// Gain per `[var][value]`; zero for the free value.
    pub unary: Vec<Vec<i64>>,
    pub heavy: Vec<Vec<bool>>,
    pub pairs: Vec<PairTerm>,
    /// Pair partners of each variable with the pair weight.
    pub neighbours: Vec<Vec<(usize, i64)>>,
}

impl Objective {
    pub fn build(model: &Model<'_>) -> Self {
        let inst = model.inst;
        let cfg = &inst.config;
        let w = &inst.policy.soft_weights;

        let mut unary = Vec::with_capacity(model.vars.len());
        let mut heavy = Vec::with_capacity(model.vars.len());
        for (x, var) in model.vars.iter().enumerate() {
            let class = &inst.classes[var.class];
            let pc = inst.priority_for(&class.id);
            let mut gains = vec![0; model.domain_size(x)];
            let mut hv = vec![false; model.domain_size(x)];
            if let Some(pc) = pc {
                for (value, cs) in class.subjects.iter().enumerate() {
                    gains[value] = slot_gain(w, cfg, pc, var.period, &cs.subject);
                    hv[value] = pc.heavy_subjects.contains(&cs.subject);
                }
            }
            unary.push(gains);
            heavy.push(hv);
        }

        let mut pairs = Vec::new();
        if w.heavy_adjacent > 0 {
            let adjacent = adjacent_pairs(cfg);
            for (ci, class) in inst.classes.iter().enumerate() {
                let has_heavy = inst
                    .priority_for(&class.id)
                    .is_some_and(|pc| !pc.heavy_subjects.is_empty());
                if !has_heavy {
                    continue;
                }
                for day in 0..cfg.day_count() {
                    for &(p, q) in &adjacent {
                        let (Some(a), Some(b)) = (model.var_at(ci, day, p), model.var_at(ci, day, q))
                        else {
                            continue;
                        };
                        pairs.push(PairTerm {
                            a,
                            b,
                            weight: -w.heavy_adjacent,
                        });
                    }
                }
            }
        }

        let mut neighbours = vec![Vec::new(); model.vars.len()];
        for t in &pairs {
            neighbours[t.a].push((t.b, t.weight));
            neighbours[t.b].push((t.a, t.weight));
        }

        Self {
            unary,
            heavy,
            pairs,
            neighbours,
        }
    }

    pub fn is_trivial(&self) -> bool {
        self.pairs.is_empty() && self.unary.iter().flatten().all(|&g| g == 0)
    }

    /// Change in score from setting `x = v` given the values already fixed.
    pub fn delta(&self, x: usize, v: Value, values: &[Option<Value>]) -> i64 {
        let mut d = self.unary[x][v];
        if self.heavy[x][v] {
            for &(y, w) in &self.neighbours[x] {
                if let Some(vy) = values[y] {
                    if self.heavy[y][vy] {
                        d += w;
                    }
                }
            }
        }
        d
    }

    pub fn evaluate(&self, values: &[Value]) -> i64 {
        let unary: i64 = values
            .iter()
            .enumerate()
            .map(|(x, &v)| self.unary[x][v])
            .sum();
        let pairs: i64 = self
            .pairs
            .iter()
            .filter(|t| self.heavy[t.a][values[t.a]] && self.heavy[t.b][values[t.b]])
            .map(|t| t.weight)
            .sum();
        unary + pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build;
    use types::{Class, ClassPriorityConfig, ClassSubject, Instance, Policy, SchoolConfig, Teacher};

    fn inst() -> Instance {
        let mut config = SchoolConfig::default();
        config.days.truncate(1);
        config.periods_per_day = 4;
        config.breaks.insert(2, "Recess".into());
        Instance {
            config,
            teachers: vec![Teacher {
                id: "lee".into(),
                name: None,
                subjects: vec!["Math".into(), "Art".into()],
                sections: vec!["5A".into(), "5B".into()],
                max_periods_per_day: 6,
                max_periods_per_week: None,
            }],
            classes: ["5A", "5B"]
                .iter()
                .map(|&id| Class {
                    id: id.into(),
                    subjects: vec![
                        ClassSubject {
                            subject: "Math".into(),
                            weekly_periods: 1,
                            teacher_id: "lee".into(),
                        },
                        ClassSubject {
                            subject: "Art".into(),
                            weekly_periods: 1,
                            teacher_id: "lee".into(),
                        },
                    ],
                })
                .collect(),
            priorities: vec![ClassPriorityConfig {
                class_id: "5A".into(),
                priority_subjects: vec!["Math".into()],
                weak_subjects: vec!["Art".into()],
                heavy_subjects: vec!["Math".into(), "Art".into()],
            }],
            policy: Policy::default(),
        }
    }

    #[test]
    fn only_configured_classes_score() {
        let inst = inst();
        let m = build(&inst);
        let o = Objective::build(&m);
        // 5A periods 0, 1, 3: Math bonus 6, 4, 2; Art morning bonus 1, 1, 0.
        assert_eq!(o.unary[0], vec![6, 1, 0]);
        assert_eq!(o.unary[2], vec![2, 0, 0]);
        assert!(o.unary[3..].iter().flatten().all(|&g| g == 0));
        // only 0-1 is adjacent without a break
        assert_eq!(o.pairs, vec![PairTerm { a: 0, b: 1, weight: -3 }]);
    }

    #[test]
    fn delta_accumulates_to_evaluate() {
        let inst = inst();
        let m = build(&inst);
        let o = Objective::build(&m);
        let full = vec![0, 1, 2, 2, 0, 1];
        let mut partial = vec![None; full.len()];
        let mut score = 0;
        for (x, &v) in full.iter().enumerate() {
            score += o.delta(x, v, &partial);
            partial[x] = Some(v);
        }
        assert_eq!(score, o.evaluate(&full));
        assert_eq!(score, 6 + 1 - 3);
    }
}
