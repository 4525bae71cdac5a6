use crate::ValidationError;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;
use types::{Assignment, ClassId, ScenarioDelta, Teacher, TeacherId, Timetable};

fn check_deltas(
    base: &Timetable,
    teachers: &[Teacher],
    deltas: &[ScenarioDelta],
    day: u32,
) -> Result<(), ValidationError> {
    let cfg = &base.config;
    let known = |id: &TeacherId| teachers.iter().any(|t| &t.id == id);
    let mut errors = Vec::new();
    if day >= cfg.day_count() {
        errors.push(format!("day {day} is outside a {}-day week", cfg.day_count()));
    }
    for (i, d) in deltas.iter().enumerate() {
        if d.day() >= cfg.day_count() {
            errors.push(format!("delta #{i}: day {} is out of range", d.day()));
        }
        match d {
            ScenarioDelta::TeacherAbsent { teacher, .. } if !known(teacher) => {
                errors.push(format!("delta #{i}: unknown teacher {teacher}"));
            }
            ScenarioDelta::Substitute {
                teacher,
                replacement,
                ..
            } => {
                for id in [teacher, replacement] {
                    if !known(id) {
                        errors.push(format!("delta #{i}: unknown teacher {id}"));
                    }
                }
            }
            ScenarioDelta::ForcedFree { class, period, .. } => {
                if !base.classes.contains(class) {
                    errors.push(format!("delta #{i}: unknown class {class}"));
                }
                if *period >= cfg.periods_per_day {
                    errors.push(format!("delta #{i}: period {period} is out of range"));
                }
            }
            _ => {}
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Invalid(errors))
    }
}

/// What-if view of `base` for one day.
///
/// Deltas for other days are validated but ignored. Phases run in a fixed
/// order regardless of how the deltas are listed: absences, substitutions,
/// unavailable subjects, shortened day, forced free periods. Within a phase,
/// declaration order applies. Other days are returned untouched.
pub fn apply_scenario(
    base: &Timetable,
    teachers: &[Teacher],
    deltas: &[ScenarioDelta],
    day: u32,
) -> Result<Timetable, ValidationError> {
    check_deltas(base, teachers, deltas, day)?;
    let active: Vec<&ScenarioDelta> = deltas.iter().filter(|d| d.day() == day).collect();
    if active.is_empty() {
        return Ok(base.clone());
    }

    let mut slots: BTreeMap<(ClassId, u32), Assignment> = base
        .on_day(day)
        .map(|a| ((a.class_id.clone(), a.period), a.clone()))
        .collect();

    let mut absent: HashSet<&TeacherId> = HashSet::new();
    let mut cleared: Vec<Assignment> = Vec::new();
    for d in &active {
        if let ScenarioDelta::TeacherAbsent { teacher, .. } = d {
            absent.insert(teacher);
            slots.retain(|_, a| {
                if &a.teacher_id == teacher {
                    cleared.push(a.clone());
                    false
                } else {
                    true
                }
            });
        }
    }

    for d in &active {
        let ScenarioDelta::Substitute {
            teacher,
            replacement,
            ..
        } = d
        else {
            continue;
        };
        let Some(sub) = teachers.iter().find(|t| &t.id == replacement) else {
            continue;
        };
        if absent.contains(replacement) {
            debug!(%replacement, "substitute is absent, skipped");
            continue;
        }
        for a in cleared.iter().filter(|a| &a.teacher_id == teacher) {
            let key = (a.class_id.clone(), a.period);
            let busy = slots
                .values()
                .any(|b| &b.teacher_id == replacement && b.period == a.period);
            if busy || slots.contains_key(&key) || !sub.qualified(&a.subject, &a.class_id) {
                continue;
            }
            slots.insert(
                key,
                Assignment {
                    teacher_id: replacement.clone(),
                    ..a.clone()
                },
            );
        }
    }

    for d in &active {
        if let ScenarioDelta::ResourceUnavailable { subjects, .. } = d {
            slots.retain(|_, a| !subjects.contains(&a.subject));
        }
    }

    let limit = active
        .iter()
        .filter_map(|d| match d {
            ScenarioDelta::ShortenedDay { max_periods, .. } => Some(*max_periods),
            _ => None,
        })
        .min();
    if let Some(limit) = limit {
        slots.retain(|(_, period), _| *period < limit);
    }

    for d in &active {
        if let ScenarioDelta::ForcedFree { class, period, .. } = d {
            slots.remove(&(class.clone(), *period));
        }
    }

    let others = base.assignments.iter().filter(|a| a.day != day).cloned();
    Ok(Timetable::from_assignments(
        base.config.clone(),
        base.classes.clone(),
        others.chain(slots.into_values()),
    ))
}

/// Slot-level differences between two timetables over the same grid.
#[derive(Clone, Debug, serde::Serialize, utoipa::ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotChange {
    pub class_id: ClassId,
    pub day: u32,
    pub period: u32,
    pub before: Option<Assignment>,
    pub after: Option<Assignment>,
}

pub fn diff(before: &Timetable, after: &Timetable) -> Vec<SlotChange> {
    let mut keys: Vec<(&ClassId, u32, u32)> = before
        .assignments
        .iter()
        .chain(&after.assignments)
        .map(Assignment::key)
        .collect();
    keys.sort();
    keys.dedup();
    keys.into_iter()
        .filter_map(|(class, day, period)| {
            let b = before.get(class, day, period);
            let a = after.get(class, day, period);
            (b != a).then(|| SlotChange {
                class_id: class.clone(),
                day,
                period,
                before: b.cloned(),
                after: a.cloned(),
            })
        })
        .collect()
}
