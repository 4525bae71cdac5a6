mod config;
mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod explain;
    pub mod health;
    pub mod insights;
    pub mod jobs;
    pub mod rotate;
    pub mod scenario;
    pub mod solve;
    pub mod validate;
}

use axum::{
    routing::{get, post},
    Json, Router,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::validate::validate_handler,
        routes::solve::solve,
        routes::jobs::status,
        routes::jobs::result,
        routes::rotate::rotate_week,
        routes::rotate::rotation_cycle,
        routes::scenario::scenario,
        routes::explain::explain,
        routes::insights::insights_handler,
        routes::insights::free_teachers_handler,
    ),
    components(schemas(
        types::Instance, types::SchoolConfig, types::Teacher, types::Class, types::ClassSubject,
        types::ClassPriorityConfig, types::Policy, types::SoftWeights, types::SolveParams,
        types::BackendKind, types::SolveEnvelope, types::SolveStatus, types::SolveResult,
        types::CapacityReport, types::Assignment, types::Timetable, types::ScenarioDelta,
        types::TeacherId, types::ClassId, types::Subject,
        sched_core::scoring::Scores, sched_core::scoring::ClassScore,
        sched_core::insights::Insights, sched_core::insights::ClashRisk,
        sched_core::scenario::SlotChange, sched_core::caps::TeacherCaps,
        jobs::JobId, jobs::JobStatus,
        routes::validate::ValidationReport,
        routes::solve::SolveIn,
        routes::solve::JobCreated,
        routes::rotate::RotateIn,
        routes::rotate::RotationsIn,
        routes::scenario::ScenarioIn,
        routes::scenario::ScenarioOut,
        routes::explain::ExplainIn,
        routes::insights::InsightsIn,
        routes::insights::FreeTeachersIn,
    )),
    tags(
        (name = "timetable", description = "School timetable solving and overlays")
    )
)]
struct ApiDoc;

fn router(app_state: state::AppState) -> Router {
    Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/validate", post(routes::validate::validate_handler))
        .route("/v1/solve", post(routes::solve::solve))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .route("/v1/rotate", post(routes::rotate::rotate_week))
        .route("/v1/rotations", post(routes::rotate::rotation_cycle))
        .route("/v1/scenario", post(routes::scenario::scenario))
        .route("/v1/explain", post(routes::explain::explain))
        .route("/v1/insights", post(routes::insights::insights_handler))
        .route("/v1/free-teachers", post(routes::insights::free_teachers_handler))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(telemetry::stack())
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    let cfg = config::Config::from_env()?;
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let app = router(state::AppState::new(cfg));

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        router(state::AppState::new(config::Config::default()))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn instance() -> Value {
        json!({
            "config": {"days": ["Mon", "Tue"], "periodsPerDay": 3, "breaks": {"1": "Recess"}},
            "teachers": [
                {"id": "ada", "subjects": ["Math"], "sections": ["5A"], "maxPeriodsPerDay": 2},
                {"id": "ben", "subjects": ["Art"], "sections": ["5A"], "maxPeriodsPerDay": 2}
            ],
            "classes": [{"id": "5A", "subjects": [
                {"subject": "Math", "weeklyPeriods": 2, "teacherId": "ada"},
                {"subject": "Art", "weeklyPeriods": 2, "teacherId": "ben"}
            ]}],
            "priorities": [{"classId": "5A", "prioritySubjects": ["Math"]}]
        })
    }

    #[tokio::test]
    async fn validate_reports_capacity() {
        let app = app();
        let (status, body) = call(&app, "POST", "/v1/validate", Some(instance())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["capacity"]["required"], json!(4));
        assert_eq!(body["capacity"]["slotCapacity"], json!(4));

        let mut bad = instance();
        bad["classes"][0]["subjects"][0]["teacherId"] = json!("zoe");
        let (_, body) = call(&app, "POST", "/v1/validate", Some(bad)).await;
        assert_eq!(body["ok"], json!(false));
        assert!(body["capacity"].is_null());
    }

    #[tokio::test]
    async fn solve_job_runs_to_completion() {
        let app = app();
        let (status, created) =
            call(&app, "POST", "/v1/solve", Some(json!({"instance": instance()}))).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let id = created["jobId"].as_str().unwrap().to_string();

        let mut last = Value::Null;
        for _ in 0..300 {
            let (_, st) = call(&app, "GET", &format!("/v1/jobs/{id}"), None).await;
            if st["status"] != json!("queued") && st["status"] != json!("running") {
                last = st;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(last["status"], json!("solved"));
        assert_eq!(last["result"]["status"], json!("optimal"));

        let (status, result) = call(&app, "GET", &format!("/v1/jobs/{id}/result"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["timetable"]["assignments"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn unknown_job_is_404() {
        let (status, body) = call(&app(), "GET", "/v1/jobs/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("not_found"));
    }

    fn timetable() -> Value {
        let lesson = |day: u32, period: u32, subject: &str, teacher: &str| {
            json!({"classId": "5A", "day": day, "period": period, "subject": subject, "teacherId": teacher})
        };
        json!({
            "config": {"days": ["Mon", "Tue"], "periodsPerDay": 3, "breaks": {"1": "Recess"}},
            "classes": ["5A"],
            "assignments": [
                lesson(0, 0, "Math", "ada"), lesson(0, 2, "Art", "ben"),
                lesson(1, 0, "Math", "ada"), lesson(1, 2, "Art", "ben")
            ]
        })
    }

    #[tokio::test]
    async fn rotate_shifts_teaching_periods() {
        let app = app();
        let body = json!({"timetable": timetable(), "weekIndex": 1, "rotationPeriod": 2});
        let (status, tt) = call(&app, "POST", "/v1/rotate", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        // Two teaching periods per day, so Math and Art swap.
        assert_eq!(tt["assignments"][0]["period"], json!(0));
        assert_eq!(tt["assignments"][0]["subject"], json!("Art"));
        assert_eq!(tt["assignments"][1]["subject"], json!("Math"));

        let body = json!({"timetable": timetable(), "rotationPeriod": 2});
        let (_, cycle) = call(&app, "POST", "/v1/rotations", Some(body)).await;
        assert_eq!(cycle.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn scenario_clears_absent_teacher() {
        let app = app();
        let body = json!({
            "timetable": timetable(),
            "teachers": instance()["teachers"],
            "deltas": [{"kind": "teacherAbsent", "teacher": "ada", "day": 0}],
            "day": 0
        });
        let (status, out) = call(&app, "POST", "/v1/scenario", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(out["changes"].as_array().map(Vec::len), Some(1));
        assert_eq!(out["timetable"]["assignments"].as_array().map(Vec::len), Some(3));

        let body = json!({
            "timetable": timetable(),
            "teachers": [],
            "deltas": [{"kind": "teacherAbsent", "teacher": "ada", "day": 0}],
            "day": 0
        });
        let (status, out) = call(&app, "POST", "/v1/scenario", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(out["errors"][0], json!("delta #0: unknown teacher ada"));
    }

    #[tokio::test]
    async fn explain_and_insights() {
        let app = app();
        let body = json!({"instance": instance(), "timetable": timetable()});
        let (status, scores) = call(&app, "POST", "/v1/explain", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        // Math in the first teaching period on both days: 2 * (2 - 0) each.
        assert_eq!(scores["objective"], json!(8));

        let (status, ins) = call(&app, "POST", "/v1/insights", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ins["dayCongestion"], json!([2, 2]));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let big = "x".repeat(telemetry::BODY_LIMIT + 1);
        let req = Request::builder()
            .method("POST")
            .uri("/v1/validate")
            .header("content-type", "application/json")
            .body(Body::from(format!("{{\"pad\":\"{big}\"}}")))
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn responses_carry_cors_headers() {
        let req = Request::builder()
            .uri("/v1/health")
            .header("origin", "http://example.test")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn openapi_lists_routes() {
        let (status, doc) = call(&app(), "GET", "/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/v1/scenario"].is_object());
    }
}
