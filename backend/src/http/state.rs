//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::CityRepository;
use crate::services::{ReportService, Settings};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn CityRepository>,
    pub settings: Arc<Settings>,
    pub reports: Arc<ReportService>,
}

impl AppState {
    pub fn new(repository: Arc<dyn CityRepository>, reports: Arc<ReportService>) -> Self {
        Self {
            repository,
            settings: Arc::clone(reports.settings()),
            reports,
        }
    }
}
