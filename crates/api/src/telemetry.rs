use axum::extract::DefaultBodyLimit;
use std::time::Duration;
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use tower_http::trace::HttpMakeClassifier;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// JSON logs filtered by `RUST_LOG`, `info` when unset.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

type Layers = Stack<
    DefaultBodyLimit,
    Stack<TimeoutLayer, Stack<CorsLayer, Stack<TraceLayer<HttpMakeClassifier>, Identity>>>,
>;

/// Request layers shared by every route. Solves run as jobs, so the
/// timeout only bounds the synchronous endpoints. The body limit is
/// enforced by the JSON extractor and answered with 413.
pub fn stack() -> ServiceBuilder<Layers> {
    let trace = TraceLayer::new_for_http();
    let cors = CorsLayer::permissive();
    let timeout = TimeoutLayer::new(Duration::from_secs(30));

    ServiceBuilder::new()
        .layer(trace)
        .layer(cors)
        .layer(timeout)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}
