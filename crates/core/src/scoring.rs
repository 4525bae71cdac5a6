use serde::Serialize;
use utoipa::ToSchema;
use std::collections::{BTreeMap, HashSet};
use types::{ClassId, ClassPriorityConfig, Instance, SchoolConfig, SoftWeights, Subject, Timetable};

/// Position of `period` among the day's teaching periods.
pub fn teaching_rank(cfg: &SchoolConfig, period: u32) -> Option<u32> {
    if period >= cfg.periods_per_day || cfg.is_break(period) {
        return None;
    }
    Some(period - cfg.breaks.range(..period).count() as u32)
}

/// Strictly decreasing over teaching periods; zero on breaks.
pub fn priority_bonus(w: &SoftWeights, cfg: &SchoolConfig, period: u32) -> i64 {
    match teaching_rank(cfg, period) {
        Some(rank) => w.priority_early * i64::from(cfg.usable_periods_per_day() - rank),
        None => 0,
    }
}

pub fn weak_bonus(w: &SoftWeights, cfg: &SchoolConfig, period: u32) -> i64 {
    if period < cfg.morning_cutoff() && !cfg.is_break(period) {
        w.weak_morning
    } else {
        0
    }
}

/// Unary part of the objective for placing `subject` at `period`.
pub fn slot_gain(
    w: &SoftWeights,
    cfg: &SchoolConfig,
    pc: &ClassPriorityConfig,
    period: u32,
    subject: &Subject,
) -> i64 {
    let mut g = 0;
    if pc.priority_subjects.contains(subject) {
        g += priority_bonus(w, cfg, period);
    }
    if pc.weak_subjects.contains(subject) {
        g += weak_bonus(w, cfg, period);
    }
    g
}

/// Consecutive teaching periods `(p, p + 1)` with no break between them.
pub fn adjacent_pairs(cfg: &SchoolConfig) -> Vec<(u32, u32)> {
    (1..cfg.periods_per_day)
        .filter(|&p| !cfg.is_break(p - 1) && !cfg.is_break(p))
        .map(|p| (p - 1, p))
        .collect()
}

#[derive(Clone, Debug, Default, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassScore {
    pub priority: i64,
    pub weak: i64,
    pub heavy_pairs: u32,
    pub heavy_penalty: i64,
    pub total: i64,
}

#[derive(Clone, Debug, Default, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Scores {
    pub per_class: BTreeMap<ClassId, ClassScore>,
    pub heavy_pairs: u32,
    pub objective: i64,
}

/// Scores any timetable with the same terms the solver maximises, so a
/// solved timetable's `objective` equals the solver's reported objective.
pub fn compute_soft_scores(inst: &Instance, tt: &Timetable) -> Scores {
    let w = &inst.policy.soft_weights;
    let cfg = &tt.config;
    let pairs = adjacent_pairs(cfg);
    let mut scores = Scores::default();

    for pc in &inst.priorities {
        let heavy: HashSet<&Subject> = pc.heavy_subjects.iter().collect();
        let mut cs = ClassScore::default();
        for a in tt.for_class(&pc.class_id) {
            if pc.priority_subjects.contains(&a.subject) {
                cs.priority += priority_bonus(w, cfg, a.period);
            }
            if pc.weak_subjects.contains(&a.subject) {
                cs.weak += weak_bonus(w, cfg, a.period);
            }
        }
        for day in 0..cfg.day_count() {
            for &(p, q) in &pairs {
                let is_heavy = |period| {
                    tt.get(&pc.class_id, day, period)
                        .is_some_and(|a| heavy.contains(&a.subject))
                };
                if is_heavy(p) && is_heavy(q) {
                    cs.heavy_pairs += 1;
                }
            }
        }
        cs.heavy_penalty = -w.heavy_adjacent * i64::from(cs.heavy_pairs);
        cs.total = cs.priority + cs.weak + cs.heavy_penalty;
        scores.heavy_pairs += cs.heavy_pairs;
        scores.objective += cs.total;
        scores.per_class.insert(pc.class_id.clone(), cs);
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Assignment, Policy};

    fn cfg_with_lunch() -> SchoolConfig {
        let mut cfg = SchoolConfig::default();
        cfg.breaks.insert(4, "Lunch".into());
        cfg
    }

    #[test]
    fn priority_bonus_decreases_over_teaching_periods() {
        let cfg = cfg_with_lunch();
        let w = SoftWeights::default();
        let bonuses: Vec<i64> = cfg
            .teaching_periods()
            .into_iter()
            .map(|p| priority_bonus(&w, &cfg, p))
            .collect();
        assert_eq!(bonuses, vec![14, 12, 10, 8, 6, 4, 2]);
        assert_eq!(priority_bonus(&w, &cfg, 4), 0);
    }

    #[test]
    fn weak_bonus_only_in_first_half() {
        let cfg = SchoolConfig::default();
        let w = SoftWeights::default();
        assert_eq!(weak_bonus(&w, &cfg, 3), 1);
        assert_eq!(weak_bonus(&w, &cfg, 4), 0);
    }

    #[test]
    fn adjacency_skips_breaks() {
        let mut cfg = cfg_with_lunch();
        cfg.periods_per_day = 6;
        assert_eq!(adjacent_pairs(&cfg), vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn heavy_pairs_are_penalised_per_class() {
        let mut cfg = cfg_with_lunch();
        cfg.days.truncate(1);
        let lesson = |period: u32, subject: &str| Assignment {
            class_id: "10B".into(),
            day: 0,
            period,
            subject: subject.into(),
            teacher_id: "t".into(),
        };
        let tt = Timetable::from_assignments(
            cfg.clone(),
            vec!["10B".into()],
            vec![
                lesson(2, "Physics"),
                lesson(3, "Physics"),
                lesson(5, "Chemistry"),
                lesson(6, "Art"),
            ],
        );
        let inst = Instance {
            config: cfg,
            teachers: vec![],
            classes: vec![],
            priorities: vec![ClassPriorityConfig {
                class_id: "10B".into(),
                priority_subjects: vec!["Art".into()],
                weak_subjects: vec![],
                heavy_subjects: vec!["Physics".into(), "Chemistry".into()],
            }],
            policy: Policy::default(),
        };
        let s = compute_soft_scores(&inst, &tt);
        // Physics at 3 and Chemistry at 5 sit either side of lunch.
        assert_eq!(s.heavy_pairs, 1);
        assert_eq!(s.objective, 4 - 3);
        assert_eq!(s.per_class[&ClassId::from("10B")].priority, 4);
    }
}
