use std::collections::HashSet;
use thiserror::Error;
use types::Instance;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid instance: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl ValidationError {
    pub fn issues(&self) -> &[String] {
        match self {
            ValidationError::Invalid(v) => v,
        }
    }
}

/// Structural checks over the domain model. Every problem found is reported,
/// nothing is corrected.
pub fn validate(inst: &Instance) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();
    let cfg = &inst.config;

    if cfg.days.is_empty() {
        errors.push("days is empty".into());
    }
    if cfg.periods_per_day == 0 {
        errors.push("periodsPerDay must be positive".into());
    }
    for &p in cfg.breaks.keys() {
        if p >= cfg.periods_per_day {
            errors.push(format!(
                "break at period {p} is outside a {}-period day",
                cfg.periods_per_day
            ));
        }
    }
    if cfg.periods_per_day > 0 && cfg.usable_periods_per_day() == 0 {
        errors.push("every period is a break".into());
    }

    fn chk_unique<'a>(name: &str, ids: impl Iterator<Item = &'a str>, errors: &mut Vec<String>) {
        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(id) {
                errors.push(format!("duplicate {name} id: {id}"));
            }
        }
    }
    chk_unique("teacher", inst.teachers.iter().map(|t| t.id.0.as_str()), &mut errors);
    chk_unique("class", inst.classes.iter().map(|c| c.id.0.as_str()), &mut errors);

    for t in &inst.teachers {
        if t.max_periods_per_day == 0 {
            errors.push(format!("teacher {} has maxPeriodsPerDay=0", t.id));
        }
        if t.max_periods_per_week == Some(0) {
            errors.push(format!("teacher {} has maxPeriodsPerWeek=0", t.id));
        }
    }

    for c in &inst.classes {
        let mut subjects = HashSet::new();
        for cs in &c.subjects {
            if !subjects.insert(&cs.subject) {
                errors.push(format!("class {} lists subject {} twice", c.id, cs.subject));
            }
            if cs.weekly_periods == 0 {
                errors.push(format!(
                    "class {} subject {} has weeklyPeriods=0",
                    c.id, cs.subject
                ));
            }
            match inst.teacher(&cs.teacher_id) {
                None => errors.push(format!(
                    "class {} subject {} references missing teacher {}",
                    c.id, cs.subject, cs.teacher_id
                )),
                Some(t) => {
                    if !t.teaches(&cs.subject) {
                        errors.push(format!(
                            "teacher {} does not teach {} (class {})",
                            t.id, cs.subject, c.id
                        ));
                    }
                    if !t.eligible_for(&c.id) {
                        errors.push(format!(
                            "teacher {} is not eligible for class {}",
                            t.id, c.id
                        ));
                    }
                }
            }
        }
    }

    let mut configured = HashSet::new();
    for pc in &inst.priorities {
        if !configured.insert(&pc.class_id) {
            errors.push(format!("class {} has more than one priority config", pc.class_id));
        }
        let Some(class) = inst.class(&pc.class_id) else {
            errors.push(format!(
                "priority config references missing class {}",
                pc.class_id
            ));
            continue;
        };
        let known: HashSet<_> = class.subjects.iter().map(|s| &s.subject).collect();
        for s in pc
            .priority_subjects
            .iter()
            .chain(&pc.weak_subjects)
            .chain(&pc.heavy_subjects)
        {
            if !known.contains(s) {
                errors.push(format!(
                    "priority config for {} names subject {} the class does not take",
                    pc.class_id, s
                ));
            }
        }
    }

    let w = &inst.policy.soft_weights;
    if w.priority_early < 0 || w.weak_morning < 0 || w.heavy_adjacent < 0 {
        errors.push("soft weights must be non-negative".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Invalid(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Class, ClassPriorityConfig, ClassSubject, Policy, SchoolConfig, Teacher};

    fn teacher(id: &str, subjects: &[&str], sections: &[&str]) -> Teacher {
        Teacher {
            id: id.into(),
            name: None,
            subjects: subjects.iter().map(|&s| s.into()).collect(),
            sections: sections.iter().map(|&s| s.into()).collect(),
            max_periods_per_day: 4,
            max_periods_per_week: None,
        }
    }

    fn inst() -> Instance {
        Instance {
            config: SchoolConfig::default(),
            teachers: vec![teacher("kim", &["Math"], &["7A"])],
            classes: vec![Class {
                id: "7A".into(),
                subjects: vec![ClassSubject {
                    subject: "Math".into(),
                    weekly_periods: 4,
                    teacher_id: "kim".into(),
                }],
            }],
            priorities: vec![],
            policy: Policy::default(),
        }
    }

    #[test]
    fn accepts_well_formed_instance() {
        assert_eq!(validate(&inst()), Ok(()));
    }

    #[test]
    fn rejects_unqualified_teacher_and_repeated_subject() {
        let mut i = inst();
        i.classes[0].subjects.push(ClassSubject {
            subject: "Math".into(),
            weekly_periods: 0,
            teacher_id: "kim".into(),
        });
        i.classes[0].subjects.push(ClassSubject {
            subject: "Art".into(),
            weekly_periods: 1,
            teacher_id: "kim".into(),
        });
        let err = validate(&i).unwrap_err();
        let issues = err.issues();
        assert!(issues.iter().any(|m| m.contains("lists subject Math twice")));
        assert!(issues.iter().any(|m| m.contains("weeklyPeriods=0")));
        assert!(issues.iter().any(|m| m.contains("does not teach Art")));
    }

    #[test]
    fn rejects_teacher_outside_sections() {
        let mut i = inst();
        i.teachers[0].sections.clear();
        let err = validate(&i).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"invalid instance: teacher kim is not eligible for class 7A");
    }

    #[test]
    fn rejects_bad_config_and_priorities() {
        let mut i = inst();
        i.config.periods_per_day = 2;
        i.config.breaks.insert(0, "Assembly".into());
        i.config.breaks.insert(1, "Lunch".into());
        i.config.breaks.insert(5, "Late".into());
        i.priorities.push(ClassPriorityConfig {
            class_id: "9Z".into(),
            priority_subjects: vec![],
            weak_subjects: vec![],
            heavy_subjects: vec![],
        });
        let err = validate(&i).unwrap_err();
        let issues = err.issues();
        assert!(issues.iter().any(|m| m.contains("break at period 5")));
        assert!(issues.iter().any(|m| m == "every period is a break"));
        assert!(issues.iter().any(|m| m.contains("missing class 9Z")));
    }
}
