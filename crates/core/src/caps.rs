use serde::Serialize;
use utoipa::ToSchema;
use types::{Instance, SchoolConfig, Teacher, TeacherId};

/// Smallest daily cap that could still carry `load` over the week.
pub fn required_daily(load: u32, days: u32) -> u32 {
    if days == 0 {
        return load;
    }
    load.div_ceil(days)
}

/// The configured daily maximum, raised when the weekly load could not fit
/// under it, and never above what a day physically holds.
pub fn relaxed_daily_cap(teacher: &Teacher, load: u32, cfg: &SchoolConfig) -> u32 {
    teacher
        .max_periods_per_day
        .max(required_daily(load, cfg.day_count()))
        .min(cfg.usable_periods_per_day())
}

#[derive(Clone, Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeacherCaps {
    pub teacher: TeacherId,
    pub load: u32,
    pub daily: u32,
    pub weekly: u32,
}

impl TeacherCaps {
    pub fn relaxed(&self, configured: u32) -> bool {
        self.daily > configured
    }
}

/// Effective caps per teacher, in instance order.
pub fn teacher_caps(inst: &Instance) -> Vec<TeacherCaps> {
    let days = inst.config.day_count();
    inst.teachers
        .iter()
        .map(|t| {
            let load = inst.teacher_load(&t.id);
            TeacherCaps {
                teacher: t.id.clone(),
                load,
                daily: relaxed_daily_cap(t, load, &inst.config),
                weekly: t.weekly_cap(days),
            }
        })
        .collect()
}
