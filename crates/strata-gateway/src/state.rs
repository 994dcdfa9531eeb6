//! Shared application state handed to every handler via axum's `State`
//! extractor.

use std::sync::Arc;

use crate::config::Config;
use crate::services::InfrastructureService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub infrastructure_service: Arc<InfrastructureService>,
}

impl AppState {
    pub fn new(config: Config, infrastructure_service: Arc<InfrastructureService>) -> Self {
        Self {
            config,
            infrastructure_service,
        }
    }
}
