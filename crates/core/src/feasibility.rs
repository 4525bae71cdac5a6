use thiserror::Error;
use types::{CapacityReport, Instance};

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error(
    "weekly demand of {required} periods exceeds capacity \
     (slots={slot_capacity}, teachers={teacher_capacity})"
)]
pub struct CapacityError {
    pub required: u32,
    pub slot_capacity: u32,
    pub teacher_capacity: u32,
}

impl CapacityError {
    pub fn report(&self) -> CapacityReport {
        CapacityReport {
            required: self.required,
            slot_capacity: self.slot_capacity,
            teacher_capacity: self.teacher_capacity,
        }
    }
}

pub fn capacity_report(inst: &Instance) -> CapacityReport {
    let cfg = &inst.config;
    let days = cfg.day_count();
    let required = inst.classes.iter().map(|c| c.weekly_load()).sum();
    let slot_capacity = cfg
        .usable_periods_per_day()
        .saturating_mul(days)
        .saturating_mul(inst.classes.len() as u32);
    let teacher_capacity = inst
        .teachers
        .iter()
        .map(|t| t.max_periods_per_day.saturating_mul(days))
        .fold(0u32, u32::saturating_add);
    CapacityReport {
        required,
        slot_capacity,
        teacher_capacity,
    }
}

/// Aggregate pre-check only. Passing it does not imply a timetable exists.
pub fn validate_feasibility(inst: &Instance) -> Result<CapacityReport, CapacityError> {
    let r = capacity_report(inst);
    if r.fits() {
        Ok(r)
    } else {
        Err(CapacityError {
            required: r.required,
            slot_capacity: r.slot_capacity,
            teacher_capacity: r.teacher_capacity,
        })
    }
}
