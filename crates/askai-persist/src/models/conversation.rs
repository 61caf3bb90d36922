use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted prompt/response pair. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: i64,
    pub prompt: String,
    pub response: String,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

/// Record contents before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConversation {
    pub prompt: String,
    pub response: String,
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

impl NewConversation {
    pub fn new(
        prompt: impl Into<String>,
        response: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            model: model.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn into_record(self, id: i64) -> ConversationRecord {
        ConversationRecord {
            id,
            prompt: self.prompt,
            response: self.response,
            model: self.model,
            timestamp: self.timestamp,
        }
    }
}
