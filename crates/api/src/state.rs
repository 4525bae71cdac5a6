use crate::config::Config;
use jobs::InMemJobs;
use solver_cp::CpSolver;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<InMemJobs<CpSolver>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            jobs: Arc::new(InMemJobs::new(CpSolver::new())),
            config: Arc::new(config),
        }
    }
}
