use askai_persist::ConversationStore;
use std::sync::Arc;

use crate::config::Config;
use crate::service::AskService;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ConversationStore>,
    pub service: Arc<AskService>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ConversationStore>, service: AskService) -> Self {
        Self {
            config: Arc::new(config),
            store,
            service: Arc::new(service),
        }
    }
}
