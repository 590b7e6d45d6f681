pub mod rest;

use crate::config::Config;
use crate::service::TreeService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Shared tree service; owns the process-wide tree cache
    pub trees: Arc<TreeService>,
}

impl AppState {
    pub fn new(config: Config, trees: TreeService) -> Self {
        Self {
            config,
            trees: Arc::new(trees),
        }
    }
}
