//! Translation of an `Instance` into a finite-domain model.
//!
//! One variable per non-break `(class, day, period)`. A variable's value is
//! an index into its class's subject list; the value one past the last
//! subject means the period is free. Every hard rule is a counting
//! constraint over `(variable, value)` literals.

use sched_core::caps::{teacher_caps, TeacherCaps};
use std::collections::HashMap;
use types::{ClassId, Instance, Subject, TeacherId};

pub type Value = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Literal {
    pub var: usize,
    pub value: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Le,
    Eq,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// At most one lesson per teacher per `(day, period)`.
    TeacherSlot,
    /// Exact weekly count of one subject in one class.
    SubjectQuota { class: usize, value: Value },
    TeacherDaily,
    TeacherWeekly,
    /// Implied by the quotas; kept for propagation.
    ClassLoad,
    /// Implied by the quotas; kept for propagation.
    TeacherLoad,
}

#[derive(Clone, Debug)]
pub struct Constraint {
    pub kind: Kind,
    pub op: Op,
    pub rhs: u32,
    pub lits: Vec<Literal>,
}

#[derive(Clone, Copy, Debug)]
pub struct Var {
    pub class: usize,
    pub day: u32,
    pub period: u32,
}

pub struct Model<'a> {
    pub inst: &'a Instance,
    pub vars: Vec<Var>,
    pub constraints: Vec<Constraint>,
    /// Teacher index per class and subject value.
    pub teacher_of: Vec<Vec<usize>>,
    pub caps: Vec<TeacherCaps>,
    /// Constraints that name `(var, value)`, sorted.
    pub watch: Vec<Vec<Vec<usize>>>,
    /// Constraints that name `var` under any value, sorted.
    pub touch: Vec<Vec<usize>>,
    slot_index: HashMap<(usize, u32, u32), usize>,
}

impl<'a> Model<'a> {
    pub fn free(&self, var: usize) -> Value {
        self.inst.classes[self.vars[var].class].subjects.len()
    }

    pub fn domain_size(&self, var: usize) -> usize {
        self.free(var) + 1
    }

    pub fn var_at(&self, class: usize, day: u32, period: u32) -> Option<usize> {
        self.slot_index.get(&(class, day, period)).copied()
    }

    pub fn class_id(&self, var: usize) -> &'a ClassId {
        &self.inst.classes[self.vars[var].class].id
    }

    /// `None` for the free value.
    pub fn subject(&self, var: usize, value: Value) -> Option<(&'a Subject, &'a TeacherId)> {
        self.inst.classes[self.vars[var].class]
            .subjects
            .get(value)
            .map(|cs| (&cs.subject, &cs.teacher_id))
    }

    pub fn quotas(&self) -> impl Iterator<Item = (usize, &Constraint)> {
        self.constraints
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c.kind, Kind::SubjectQuota { .. }))
    }
}

fn literals(
    vars: &[Var],
    teacher_of: &[Vec<usize>],
    pred: impl Fn(&Var, usize, Value) -> bool,
) -> Vec<Literal> {
    let mut out = Vec::new();
    for (x, var) in vars.iter().enumerate() {
        for (value, &t) in teacher_of[var.class].iter().enumerate() {
            if pred(var, t, value) {
                out.push(Literal { var: x, value });
            }
        }
    }
    out
}

/// Assumes a structurally valid instance.
pub fn build(inst: &Instance) -> Model<'_> {
    let cfg = &inst.config;
    let teaching = cfg.teaching_periods();
    let days = cfg.day_count();

    let teacher_idx: HashMap<&TeacherId, usize> = inst
        .teachers
        .iter()
        .enumerate()
        .map(|(i, t)| (&t.id, i))
        .collect();
    let teacher_of: Vec<Vec<usize>> = inst
        .classes
        .iter()
        .map(|c| {
            c.subjects
                .iter()
                .map(|cs| teacher_idx.get(&cs.teacher_id).copied().unwrap_or(usize::MAX))
                .collect()
        })
        .collect();

    let mut vars = Vec::new();
    let mut slot_index = HashMap::new();
    for (ci, _) in inst.classes.iter().enumerate() {
        for day in 0..days {
            for &period in &teaching {
                slot_index.insert((ci, day, period), vars.len());
                vars.push(Var {
                    class: ci,
                    day,
                    period,
                });
            }
        }
    }

    let caps = teacher_caps(inst);
    let mut constraints = Vec::new();

    for (ti, cap) in caps.iter().enumerate() {
        for day in 0..days {
            for &period in &teaching {
                let lits = literals(&vars, &teacher_of, |v, t, _| {
                    t == ti && v.day == day && v.period == period
                });
                let mut classes: Vec<usize> = lits.iter().map(|l| vars[l.var].class).collect();
                classes.dedup();
                if classes.len() > 1 {
                    constraints.push(Constraint {
                        kind: Kind::TeacherSlot,
                        op: Op::Le,
                        rhs: 1,
                        lits,
                    });
                }
            }
            let lits = literals(&vars, &teacher_of, |v, t, _| t == ti && v.day == day);
            if lits.len() as u32 > cap.daily {
                constraints.push(Constraint {
                    kind: Kind::TeacherDaily,
                    op: Op::Le,
                    rhs: cap.daily,
                    lits,
                });
            }
        }
        let lits = literals(&vars, &teacher_of, |_, t, _| t == ti);
        if !lits.is_empty() {
            constraints.push(Constraint {
                kind: Kind::TeacherWeekly,
                op: Op::Le,
                rhs: cap.weekly,
                lits: lits.clone(),
            });
            constraints.push(Constraint {
                kind: Kind::TeacherLoad,
                op: Op::Eq,
                rhs: cap.load,
                lits,
            });
        }
    }

    for (ci, class) in inst.classes.iter().enumerate() {
        for (value, cs) in class.subjects.iter().enumerate() {
            constraints.push(Constraint {
                kind: Kind::SubjectQuota { class: ci, value },
                op: Op::Eq,
                rhs: cs.weekly_periods,
                lits: literals(&vars, &teacher_of, |v, _, val| v.class == ci && val == value),
            });
        }
        constraints.push(Constraint {
            kind: Kind::ClassLoad,
            op: Op::Eq,
            rhs: class.weekly_load(),
            lits: literals(&vars, &teacher_of, |v, _, _| v.class == ci),
        });
    }

    let mut watch: Vec<Vec<Vec<usize>>> = vars
        .iter()
        .map(|v| vec![Vec::new(); inst.classes[v.class].subjects.len() + 1])
        .collect();
    let mut touch: Vec<Vec<usize>> = vec![Vec::new(); vars.len()];
    for (c, con) in constraints.iter().enumerate() {
        for l in &con.lits {
            watch[l.var][l.value].push(c);
            if touch[l.var].last() != Some(&c) {
                touch[l.var].push(c);
            }
        }
    }

    Model {
        inst,
        vars,
        constraints,
        teacher_of,
        caps,
        watch,
        touch,
        slot_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Class, ClassSubject, Policy, SchoolConfig, Teacher};

    fn inst() -> Instance {
        let mut config = SchoolConfig::default();
        config.days.truncate(2);
        config.periods_per_day = 3;
        config.breaks.insert(1, "Recess".into());
        let teacher = |id: &str| Teacher {
            id: id.into(),
            name: None,
            subjects: vec!["Math".into(), "Art".into()],
            sections: vec!["A".into(), "B".into()],
            max_periods_per_day: 1,
            max_periods_per_week: None,
        };
        let class = |id: &str| Class {
            id: id.into(),
            subjects: vec![
                ClassSubject {
                    subject: "Math".into(),
                    weekly_periods: 2,
                    teacher_id: "hale".into(),
                },
                ClassSubject {
                    subject: "Art".into(),
                    weekly_periods: 1,
                    teacher_id: "ito".into(),
                },
            ],
        };
        Instance {
            config,
            teachers: vec![teacher("hale"), teacher("ito")],
            classes: vec![class("A"), class("B")],
            priorities: vec![],
            policy: Policy::default(),
        }
    }

    #[test]
    fn one_variable_per_teaching_slot() {
        let inst = inst();
        let m = build(&inst);
        assert_eq!(m.vars.len(), 2 * 2 * 2);
        assert_eq!(m.var_at(0, 0, 1), None);
        assert_eq!(m.domain_size(0), 3);
        assert_eq!(m.subject(0, 2), None);
    }

    #[test]
    fn caps_are_relaxed_and_clashes_are_shared() {
        let inst = inst();
        let m = build(&inst);
        // hale carries 4 periods over 2 days, so the daily cap rises to 2.
        let hale = &m.caps[0];
        assert_eq!((hale.load, hale.daily), (4, 2));
        let slot = m
            .constraints
            .iter()
            .filter(|c| c.kind == Kind::TeacherSlot)
            .count();
        // two teachers x two days x two teaching periods
        assert_eq!(slot, 8);
        let quotas: Vec<u32> = m.quotas().map(|(_, c)| c.rhs).collect();
        assert_eq!(quotas, vec![2, 1, 2, 1]);
    }

    #[test]
    fn watch_lists_match_literals() {
        let inst = inst();
        let m = build(&inst);
        for (c, con) in m.constraints.iter().enumerate() {
            for l in &con.lits {
                assert!(m.watch[l.var][l.value].contains(&c));
                assert!(m.touch[l.var].contains(&c));
            }
        }
        assert!(m.watch.iter().all(|w| w.last().is_some_and(Vec::is_empty)));
    }
}
