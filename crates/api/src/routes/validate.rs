use axum::Json;
use sched_core::caps::{teacher_caps, TeacherCaps};
use sched_core::feasibility::capacity_report;
use sched_core::{validate, CapacityError};
use serde::Serialize;
use types::{CapacityReport, Instance};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub ok: bool,
    pub errors: Vec<String>,
    /// Only computed for structurally valid instances.
    pub capacity: Option<CapacityReport>,
    pub caps: Vec<TeacherCaps>,
}

#[utoipa::path(
    post,
    path = "/v1/validate",
    request_body = Instance,
    responses(
        (status = 200, description = "Structural and capacity checks", body = ValidationReport)
    )
)]
pub async fn validate_handler(Json(inst): Json<Instance>) -> Json<ValidationReport> {
    Json(report(&inst))
}

fn report(inst: &Instance) -> ValidationReport {
    if let Err(e) = validate(inst) {
        return ValidationReport {
            ok: false,
            errors: e.issues().to_vec(),
            capacity: None,
            caps: vec![],
        };
    }
    let capacity = capacity_report(inst);
    let errors = if capacity.fits() {
        vec![]
    } else {
        let e = CapacityError {
            required: capacity.required,
            slot_capacity: capacity.slot_capacity,
            teacher_capacity: capacity.teacher_capacity,
        };
        vec![e.to_string()]
    };
    ValidationReport {
        ok: errors.is_empty(),
        errors,
        capacity: Some(capacity),
        caps: teacher_caps(inst),
    }
}
