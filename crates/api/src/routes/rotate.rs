use crate::state::AppState;
use axum::{extract::State, Json};
use sched_core::{rotate, rotations};
use serde::Deserialize;
use types::Timetable;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RotateIn {
    pub timetable: Timetable,
    pub week_index: u32,
    pub rotation_period: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RotationsIn {
    pub timetable: Timetable,
    pub rotation_period: Option<u32>,
}

#[utoipa::path(
    post,
    path = "/v1/rotate",
    request_body = RotateIn,
    responses((status = 200, description = "Timetable for the given week", body = Timetable))
)]
pub async fn rotate_week(
    State(state): State<AppState>,
    Json(input): Json<RotateIn>,
) -> Json<Timetable> {
    let period = input.rotation_period.unwrap_or(state.config.rotation_period);
    Json(rotate(&input.timetable, input.week_index, period))
}

#[utoipa::path(
    post,
    path = "/v1/rotations",
    request_body = RotationsIn,
    responses((status = 200, description = "One timetable per week of the cycle", body = [Timetable]))
)]
pub async fn rotation_cycle(
    State(state): State<AppState>,
    Json(input): Json<RotationsIn>,
) -> Json<Vec<Timetable>> {
    let period = input.rotation_period.unwrap_or(state.config.rotation_period);
    Json(rotations(&input.timetable, period))
}
