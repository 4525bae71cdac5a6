use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            Serialize,
            Deserialize,
            ToSchema,
            JsonSchema,
            Eq,
            PartialEq,
            Hash,
            PartialOrd,
            Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(TeacherId);
id_newtype!(ClassId);
id_newtype!(Subject);

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    /// Class sections this teacher may be assigned to.
    #[serde(default)]
    pub sections: Vec<ClassId>,
    pub max_periods_per_day: u32,
    #[serde(default)]
    pub max_periods_per_week: Option<u32>,
}

impl Teacher {
    pub fn teaches(&self, subject: &Subject) -> bool {
        self.subjects.contains(subject)
    }

    pub fn eligible_for(&self, class: &ClassId) -> bool {
        self.sections.contains(class)
    }

    pub fn qualified(&self, subject: &Subject, class: &ClassId) -> bool {
        self.teaches(subject) && self.eligible_for(class)
    }

    /// Weekly maximum; falls back to the daily maximum over every school day.
    pub fn weekly_cap(&self, days: u32) -> u32 {
        self.max_periods_per_week
            .unwrap_or(self.max_periods_per_day.saturating_mul(days))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassSubject {
    pub subject: Subject,
    pub weekly_periods: u32,
    pub teacher_id: TeacherId,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: ClassId,
    #[serde(default)]
    pub subjects: Vec<ClassSubject>,
}

impl Class {
    pub fn weekly_load(&self) -> u32 {
        self.subjects.iter().map(|s| s.weekly_periods).sum()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SchoolConfig {
    pub days: Vec<String>,
    pub periods_per_day: u32,
    /// Period index -> break label ("Lunch", "Recess", ...).
    #[serde(default)]
    pub breaks: BTreeMap<u32, String>,
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            days: ["Mon", "Tue", "Wed", "Thu", "Fri"]
                .into_iter()
                .map(String::from)
                .collect(),
            periods_per_day: 8,
            breaks: BTreeMap::new(),
        }
    }
}

impl SchoolConfig {
    pub fn day_count(&self) -> u32 {
        self.days.len() as u32
    }

    pub fn is_break(&self, period: u32) -> bool {
        self.breaks.contains_key(&period)
    }

    pub fn break_count(&self) -> u32 {
        self.breaks
            .keys()
            .filter(|&&p| p < self.periods_per_day)
            .count() as u32
    }

    /// Non-break period indices of a day, in order.
    pub fn teaching_periods(&self) -> Vec<u32> {
        (0..self.periods_per_day)
            .filter(|p| !self.is_break(*p))
            .collect()
    }

    pub fn usable_periods_per_day(&self) -> u32 {
        self.periods_per_day.saturating_sub(self.break_count())
    }

    /// Periods strictly before this index form the first half of the day.
    pub fn morning_cutoff(&self) -> u32 {
        (self.periods_per_day + 1) / 2
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassPriorityConfig {
    pub class_id: ClassId,
    #[serde(default)]
    pub priority_subjects: Vec<Subject>,
    #[serde(default)]
    pub weak_subjects: Vec<Subject>,
    #[serde(default)]
    pub heavy_subjects: Vec<Subject>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SoftWeights {
    pub priority_early: i64,
    pub weak_morning: i64,
    pub heavy_adjacent: i64,
}

impl Default for SoftWeights {
    fn default() -> Self {
        Self {
            priority_early: 2,
            weak_morning: 1,
            heavy_adjacent: 3,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default)]
    pub soft_weights: SoftWeights,
}

/// Snapshot of everything a solve needs.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub config: SchoolConfig,
    pub teachers: Vec<Teacher>,
    pub classes: Vec<Class>,
    #[serde(default)]
    pub priorities: Vec<ClassPriorityConfig>,
    #[serde(default)]
    pub policy: Policy,
}

impl Instance {
    pub fn teacher(&self, id: &TeacherId) -> Option<&Teacher> {
        self.teachers.iter().find(|t| &t.id == id)
    }

    pub fn class(&self, id: &ClassId) -> Option<&Class> {
        self.classes.iter().find(|c| &c.id == id)
    }

    pub fn priority_for(&self, id: &ClassId) -> Option<&ClassPriorityConfig> {
        self.priorities.iter().find(|p| &p.class_id == id)
    }

    /// Weekly periods assigned to a teacher across every class.
    pub fn teacher_load(&self, id: &TeacherId) -> u32 {
        self.classes
            .iter()
            .flat_map(|c| c.subjects.iter())
            .filter(|s| &s.teacher_id == id)
            .map(|s| s.weekly_periods)
            .sum()
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Search,
    Milp,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SolveParams {
    pub time_limit_ms: u64,
    pub backend: BackendKind,
}

impl Default for SolveParams {
    fn default() -> Self {
        Self {
            time_limit_ms: 30_000,
            backend: BackendKind::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolveEnvelope {
    pub instance: Instance,
    #[serde(default)]
    pub params: SolveParams,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unknown,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CapacityReport {
    pub required: u32,
    pub slot_capacity: u32,
    pub teacher_capacity: u32,
}

impl CapacityReport {
    pub fn fits(&self) -> bool {
        self.required <= self.slot_capacity && self.required <= self.teacher_capacity
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SolveResult {
    pub status: SolveStatus,
    pub objective: i64,
    pub timetable: Timetable,
    pub stats: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub class_id: ClassId,
    pub day: u32,
    pub period: u32,
    pub subject: Subject,
    pub teacher_id: TeacherId,
}

impl Assignment {
    pub fn key(&self) -> (&ClassId, u32, u32) {
        (&self.class_id, self.day, self.period)
    }
}

/// A resolved weekly grid. Assignments are kept sorted and unique by
/// `(class, day, period)`; a non-break slot with no assignment is free.
/// Deserialising goes through [`Timetable::from_assignments`], so input in
/// any order is accepted.
#[derive(Clone, Debug, Serialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub config: SchoolConfig,
    pub classes: Vec<ClassId>,
    pub assignments: Vec<Assignment>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTimetable {
    config: SchoolConfig,
    classes: Vec<ClassId>,
    #[serde(default)]
    assignments: Vec<Assignment>,
}

impl<'de> Deserialize<'de> for Timetable {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = RawTimetable::deserialize(d)?;
        Ok(Timetable::from_assignments(
            raw.config,
            raw.classes,
            raw.assignments,
        ))
    }
}

impl Timetable {
    /// Later duplicates of the same slot replace earlier ones.
    pub fn from_assignments(
        config: SchoolConfig,
        mut classes: Vec<ClassId>,
        assignments: impl IntoIterator<Item = Assignment>,
    ) -> Self {
        let mut by_key: BTreeMap<(ClassId, u32, u32), Assignment> = BTreeMap::new();
        for a in assignments {
            by_key.insert((a.class_id.clone(), a.day, a.period), a);
        }
        classes.sort();
        classes.dedup();
        Self {
            config,
            classes,
            assignments: by_key.into_values().collect(),
        }
    }

    pub fn get(&self, class: &ClassId, day: u32, period: u32) -> Option<&Assignment> {
        self.assignments
            .binary_search_by(|a| a.key().cmp(&(class, day, period)))
            .ok()
            .map(|i| &self.assignments[i])
    }

    pub fn is_free(&self, class: &ClassId, day: u32, period: u32) -> bool {
        !self.config.is_break(period) && self.get(class, day, period).is_none()
    }

    pub fn on_day(&self, day: u32) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter().filter(move |a| a.day == day)
    }

    pub fn for_class<'a>(&'a self, class: &'a ClassId) -> impl Iterator<Item = &'a Assignment> {
        self.assignments.iter().filter(move |a| &a.class_id == class)
    }

    /// Same grid shape, only the lessons of `day`.
    pub fn restricted_to_day(&self, day: u32) -> Timetable {
        Timetable {
            config: self.config.clone(),
            classes: self.classes.clone(),
            assignments: self.on_day(day).cloned().collect(),
        }
    }

    pub fn count(&self, class: &ClassId, subject: &Subject) -> u32 {
        self.for_class(class)
            .filter(|a| &a.subject == subject)
            .count() as u32
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScenarioDelta {
    TeacherAbsent { teacher: TeacherId, day: u32 },
    Substitute {
        teacher: TeacherId,
        replacement: TeacherId,
        day: u32,
    },
    ResourceUnavailable { subjects: Vec<Subject>, day: u32 },
    /// The day keeps its first `max_periods` periods (breaks included in
    /// the count); lessons at index `max_periods` or later are cleared.
    ShortenedDay {
        day: u32,
        #[serde(rename = "maxPeriod", alias = "maxPeriods")]
        max_periods: u32,
    },
    ForcedFree { class: ClassId, day: u32, period: u32 },
}

impl ScenarioDelta {
    pub fn day(&self) -> u32 {
        match self {
            ScenarioDelta::TeacherAbsent { day, .. }
            | ScenarioDelta::Substitute { day, .. }
            | ScenarioDelta::ResourceUnavailable { day, .. }
            | ScenarioDelta::ShortenedDay { day, .. }
            | ScenarioDelta::ForcedFree { day, .. } => *day,
        }
    }
}
