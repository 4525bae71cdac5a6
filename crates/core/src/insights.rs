//! Read-only summaries of a resolved timetable: per-teacher views, load
//! and congestion counts, fatigue and clash-risk reports.

use crate::scoring::adjacent_pairs;
use serde::Serialize;
use utoipa::ToSchema;
use std::collections::{BTreeMap, HashSet};
use types::{Assignment, ClassId, Instance, Teacher, TeacherId, Timetable};

/// Each teacher's lessons, ordered by day then period.
pub fn teacher_timetable(tt: &Timetable) -> BTreeMap<TeacherId, Vec<Assignment>> {
    let mut out: BTreeMap<TeacherId, Vec<Assignment>> = BTreeMap::new();
    for a in &tt.assignments {
        out.entry(a.teacher_id.clone()).or_default().push(a.clone());
    }
    for lessons in out.values_mut() {
        lessons.sort_by_key(|a| (a.day, a.period));
    }
    out
}

/// Lessons per teacher per day. Teachers without lessons get a zero row.
pub fn teacher_load(tt: &Timetable, teachers: &[Teacher]) -> BTreeMap<TeacherId, Vec<u32>> {
    let days = tt.config.day_count() as usize;
    let mut out: BTreeMap<TeacherId, Vec<u32>> = teachers
        .iter()
        .map(|t| (t.id.clone(), vec![0; days]))
        .collect();
    for a in &tt.assignments {
        let row = out
            .entry(a.teacher_id.clone())
            .or_insert_with(|| vec![0; days]);
        if let Some(n) = row.get_mut(a.day as usize) {
            *n += 1;
        }
    }
    out
}

/// Total lessons per day across the school.
pub fn day_congestion(tt: &Timetable) -> Vec<u32> {
    let mut out = vec![0; tt.config.day_count() as usize];
    for a in &tt.assignments {
        if let Some(n) = out.get_mut(a.day as usize) {
            *n += 1;
        }
    }
    out
}

/// Heavy lessons per class and period index, summed over the week.
pub fn class_fatigue(inst: &Instance, tt: &Timetable) -> BTreeMap<ClassId, Vec<u32>> {
    let ppd = tt.config.periods_per_day as usize;
    let mut out = BTreeMap::new();
    for class in &tt.classes {
        let heavy: HashSet<_> = inst
            .priority_for(class)
            .map(|pc| pc.heavy_subjects.iter().collect())
            .unwrap_or_default();
        let mut row = vec![0; ppd];
        for a in tt.for_class(class).filter(|a| heavy.contains(&a.subject)) {
            if let Some(n) = row.get_mut(a.period as usize) {
                *n += 1;
            }
        }
        out.insert(class.clone(), row);
    }
    out
}

#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClashRisk {
    TeacherOverload {
        teacher: TeacherId,
        day: u32,
        count: u32,
        max: u32,
    },
    BackToBackHeavy {
        class: ClassId,
        day: u32,
        periods: (u32, u32),
    },
}

/// Teachers above their configured daily maximum (possible after cap
/// relaxation) and adjacent heavy lessons.
pub fn clash_risks(inst: &Instance, tt: &Timetable) -> Vec<ClashRisk> {
    let mut out = Vec::new();
    for (teacher, per_day) in teacher_load(tt, &inst.teachers) {
        let Some(max) = inst.teacher(&teacher).map(|t| t.max_periods_per_day) else {
            continue;
        };
        for (day, &count) in per_day.iter().enumerate() {
            if count > max {
                out.push(ClashRisk::TeacherOverload {
                    teacher: teacher.clone(),
                    day: day as u32,
                    count,
                    max,
                });
            }
        }
    }
    let pairs = adjacent_pairs(&tt.config);
    for pc in &inst.priorities {
        for day in 0..tt.config.day_count() {
            for &(p, q) in &pairs {
                let heavy = |period| {
                    tt.get(&pc.class_id, day, period)
                        .is_some_and(|a| pc.heavy_subjects.contains(&a.subject))
                };
                if heavy(p) && heavy(q) {
                    out.push(ClashRisk::BackToBackHeavy {
                        class: pc.class_id.clone(),
                        day,
                        periods: (p, q),
                    });
                }
            }
        }
    }
    out
}

/// Teachers with no lesson at `(day, period)`, in input order.
pub fn free_teachers<'a>(
    tt: &Timetable,
    teachers: &'a [Teacher],
    day: u32,
    period: u32,
) -> Vec<&'a Teacher> {
    let busy: HashSet<&TeacherId> = tt
        .on_day(day)
        .filter(|a| a.period == period)
        .map(|a| &a.teacher_id)
        .collect();
    teachers.iter().filter(|t| !busy.contains(&t.id)).collect()
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub teacher_load: BTreeMap<TeacherId, Vec<u32>>,
    pub day_congestion: Vec<u32>,
    pub class_fatigue: BTreeMap<ClassId, Vec<u32>>,
    pub clash_risks: Vec<ClashRisk>,
}

pub fn insights(inst: &Instance, tt: &Timetable) -> Insights {
    Insights {
        teacher_load: teacher_load(tt, &inst.teachers),
        day_congestion: day_congestion(tt),
        class_fatigue: class_fatigue(inst, tt),
        clash_risks: clash_risks(inst, tt),
    }
}
