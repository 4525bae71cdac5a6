use crate::error::ApiError;
use axum::Json;
use sched_core::apply_scenario;
use sched_core::scenario::{diff, SlotChange};
use serde::{Deserialize, Serialize};
use types::{ScenarioDelta, Teacher, Timetable};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ScenarioIn {
    pub timetable: Timetable,
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub deltas: Vec<ScenarioDelta>,
    pub day: u32,
}

#[derive(Serialize, ToSchema)]
pub struct ScenarioOut {
    pub timetable: Timetable,
    pub changes: Vec<SlotChange>,
}

#[utoipa::path(
    post,
    path = "/v1/scenario",
    request_body = ScenarioIn,
    responses(
        (status = 200, description = "Overlay applied to one day", body = ScenarioOut),
        (status = 422, description = "Deltas reference unknown entities or slots")
    )
)]
pub async fn scenario(Json(input): Json<ScenarioIn>) -> Result<Json<ScenarioOut>, ApiError> {
    let timetable = apply_scenario(&input.timetable, &input.teachers, &input.deltas, input.day)?;
    let changes = diff(&input.timetable, &timetable);
    Ok(Json(ScenarioOut { timetable, changes }))
}
