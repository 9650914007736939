use std::sync::Arc;

use crate::config::Config;
use crate::observability::Metrics;
use crate::services::ServiceBundler;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub services: ServiceBundler,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, services: ServiceBundler) -> Self {
        Self {
            config: Arc::new(config),
            services,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
