use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ConversationRecord, NewConversation};

/// Trait for conversation log persistence
///
/// Implementations must make each write atomic: concurrent `append`s never
/// share an id, and `delete_all` never observes half a record.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Insert a record and return it with its assigned id
    async fn append(&self, conversation: NewConversation) -> Result<ConversationRecord>;

    /// All records, ordered by id ascending
    async fn list_all(&self) -> Result<Vec<ConversationRecord>>;

    /// Remove every record, returning how many were removed
    async fn delete_all(&self) -> Result<u64>;

    async fn count(&self) -> Result<u64>;

    /// Cheap connectivity check used by the health endpoint
    async fn ping(&self) -> Result<()>;
}
