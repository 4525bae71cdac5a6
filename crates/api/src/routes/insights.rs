use axum::Json;
use sched_core::insights::{free_teachers, insights, Insights};
use serde::Deserialize;
use types::{Instance, Teacher, Timetable};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct InsightsIn {
    pub instance: Instance,
    pub timetable: Timetable,
}

#[utoipa::path(
    post,
    path = "/v1/insights",
    request_body = InsightsIn,
    responses((status = 200, description = "Load, congestion, fatigue and clash risks", body = Insights))
)]
pub async fn insights_handler(Json(input): Json<InsightsIn>) -> Json<Insights> {
    Json(insights(&input.instance, &input.timetable))
}

#[derive(Deserialize, ToSchema)]
pub struct FreeTeachersIn {
    pub timetable: Timetable,
    pub teachers: Vec<Teacher>,
    pub day: u32,
    pub period: u32,
}

#[utoipa::path(
    post,
    path = "/v1/free-teachers",
    request_body = FreeTeachersIn,
    responses((status = 200, description = "Teachers with no lesson in the slot", body = [Teacher]))
)]
pub async fn free_teachers_handler(Json(input): Json<FreeTeachersIn>) -> Json<Vec<Teacher>> {
    Json(
        free_teachers(&input.timetable, &input.teachers, input.day, input.period)
            .into_iter()
            .cloned()
            .collect(),
    )
}
