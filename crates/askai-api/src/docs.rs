use axum::Json;
use utoipa::OpenApi;

use crate::error::{ErrorBody, FieldError};
use crate::routes::{ask, conversations, health};
use crate::service::{ApiValidation, AskAiResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AI API Integration Backend",
        description = "Forwards prompts to an AI completion API and keeps a log of the exchanges"
    ),
    paths(
        ask::ask_ai,
        conversations::list_conversations,
        conversations::clear_conversations,
        health::root,
        health::liveness,
        health::health_check,
    ),
    components(schemas(
        ask::AskAiRequest,
        AskAiResponse,
        ErrorBody,
        FieldError,
        conversations::ConversationResponse,
        conversations::ConversationsResponse,
        conversations::ClearConversationsResponse,
        health::RootResponse,
        health::LivenessResponse,
        health::HealthResponse,
        health::HealthDetails,
        health::OpenAiConfiguration,
        health::AdvancedParameters,
        health::DatabaseStatus,
        health::UsageStatistics,
        ApiValidation,
    )),
    tags(
        (name = "AI", description = "Prompt submission"),
        (name = "Conversations", description = "Conversation log"),
        (name = "Health", description = "Liveness and health reporting")
    )
)]
pub struct ApiDoc;

/// Serve the generated OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
