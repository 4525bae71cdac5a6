use crate::scoring::teaching_rank;
use types::{Assignment, Timetable};

pub const DEFAULT_ROTATION_PERIOD: u32 = 3;

/// Week `week_index` of a rotation cycle of `rotation_period` weeks.
///
/// Per class and day, the teaching periods form a ring and every lesson
/// moves forward by `week_index mod rotation_period` positions. Breaks keep
/// their index, teachers travel with their subject and free periods move
/// with the ring. A period of 0 behaves as 1 (no rotation).
pub fn rotate(base: &Timetable, week_index: u32, rotation_period: u32) -> Timetable {
    let shift = week_index % rotation_period.max(1);
    if shift == 0 {
        return base.clone();
    }
    let ring = base.config.teaching_periods();
    let n = ring.len() as u32;
    let moved = base.assignments.iter().map(|a| {
        let period = match teaching_rank(&base.config, a.period) {
            Some(rank) => ring[((rank + shift) % n) as usize],
            None => a.period,
        };
        Assignment {
            period,
            ..a.clone()
        }
    });
    Timetable::from_assignments(base.config.clone(), base.classes.clone(), moved)
}

/// Every week of one cycle, starting with the base itself.
pub fn rotations(base: &Timetable, rotation_period: u32) -> Vec<Timetable> {
    (0..rotation_period.max(1))
        .map(|w| rotate(base, w, rotation_period))
        .collect()
}
