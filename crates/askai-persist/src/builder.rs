use std::path::PathBuf;

use crate::dbs::sqlite::SqliteConversationStore;
use crate::error::{PersistError, Result};

pub struct StoreBuilder {
    path: Option<PathBuf>,
    in_memory: bool,
    max_connections: u32,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self {
            path: None,
            in_memory: false,
            max_connections: 5,
        }
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub async fn build(self) -> Result<SqliteConversationStore> {
        if self.in_memory {
            return SqliteConversationStore::in_memory().await;
        }

        let path = self
            .path
            .ok_or_else(|| PersistError::Internal("database path is required".to_string()))?;

        SqliteConversationStore::connect(path, self.max_connections).await
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
