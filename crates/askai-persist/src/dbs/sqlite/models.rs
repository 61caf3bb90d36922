use chrono::{DateTime, Utc};

use crate::models::ConversationRecord;

/// Row shape of the `conversations` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConversationRow {
    pub id: i64,
    pub prompt: String,
    pub response: String,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ConversationRow> for ConversationRecord {
    fn from(row: ConversationRow) -> Self {
        Self {
            id: row.id,
            prompt: row.prompt,
            response: row.response,
            model: row.model,
            timestamp: row.timestamp,
        }
    }
}
