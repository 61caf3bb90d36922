use askai_persist::ConversationRecord;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationResponse {
    pub id: i64,
    pub prompt: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub model: String,
}

impl From<ConversationRecord> for ConversationResponse {
    fn from(record: ConversationRecord) -> Self {
        Self {
            id: record.id,
            prompt: record.prompt,
            response: record.response,
            timestamp: record.timestamp,
            model: record.model,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationResponse>,
    pub total_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearConversationsResponse {
    pub message: String,
    pub deleted_count: u64,
}

/// List every logged conversation, oldest first
#[utoipa::path(
    get,
    path = "/api/conversations",
    responses(
        (status = 200, description = "All conversations", body = ConversationsResponse),
        (status = 500, description = "Database error", body = crate::error::ErrorBody)
    ),
    tag = "Conversations"
)]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ConversationsResponse>> {
    let conversations: Vec<ConversationResponse> = state
        .store
        .list_all()
        .await?
        .into_iter()
        .map(ConversationResponse::from)
        .collect();

    tracing::info!("Retrieved {} conversations", conversations.len());

    Ok(Json(ConversationsResponse {
        total_count: conversations.len(),
        conversations,
    }))
}

/// Delete the whole conversation log. Cannot be undone.
#[utoipa::path(
    delete,
    path = "/api/conversations",
    responses(
        (status = 200, description = "Conversations cleared", body = ClearConversationsResponse),
        (status = 500, description = "Database error", body = crate::error::ErrorBody)
    ),
    tag = "Conversations"
)]
pub async fn clear_conversations(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ClearConversationsResponse>> {
    let deleted_count = state.store.delete_all().await?;

    tracing::info!("Cleared {} conversations", deleted_count);

    Ok(Json(ClearConversationsResponse {
        message: format!("Successfully deleted {} conversations", deleted_count),
        deleted_count,
    }))
}
