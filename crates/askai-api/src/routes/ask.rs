use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult, FieldError};
use crate::service::AskAiResponse;
use crate::state::AppState;

const PROMPT_FIELD: &str = "body.prompt";

#[derive(Debug, Deserialize, ToSchema)]
pub struct AskAiRequest {
    /// The question or prompt to send to the AI (1-4000 characters)
    #[schema(example = "What is AI?")]
    pub prompt: String,
}

/// Raw `prompt` string from a JSON body
///
/// Shape problems become 422 field errors here; content rules run later.
pub struct PromptPayload(pub String);

#[async_trait]
impl<S> FromRequest<S> for PromptPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::Schema(vec![FieldError::invalid_json(rejection.body_text())])
            })?;

        match body.get("prompt") {
            None | Some(Value::Null) => {
                Err(ApiError::Schema(vec![FieldError::missing(PROMPT_FIELD)]))
            }
            Some(Value::String(prompt)) => Ok(PromptPayload(prompt.clone())),
            Some(_) => Err(ApiError::Schema(vec![FieldError::not_a_string(PROMPT_FIELD)])),
        }
    }
}

/// Ask the AI a question
///
/// The exchange is logged once the upstream call succeeds.
#[utoipa::path(
    post,
    path = "/api/ask-ai",
    request_body = AskAiRequest,
    responses(
        (status = 200, description = "AI answer", body = AskAiResponse),
        (status = 400, description = "Prompt rejected", body = crate::error::ErrorBody),
        (status = 401, description = "Upstream rejected the API key",
            body = crate::error::ErrorBody),
        (status = 422, description = "Malformed request body", body = crate::error::ErrorBody),
        (status = 429, description = "Upstream rate limit or quota",
            body = crate::error::ErrorBody),
        (status = 500, description = "Service not configured", body = crate::error::ErrorBody),
        (status = 503, description = "AI service unavailable", body = crate::error::ErrorBody),
        (status = 504, description = "AI service timed out", body = crate::error::ErrorBody)
    ),
    tag = "AI"
)]
pub async fn ask_ai(
    State(state): State<Arc<AppState>>,
    PromptPayload(prompt): PromptPayload,
) -> ApiResult<Json<AskAiResponse>> {
    tracing::info!(prompt_len = prompt.chars().count(), "Received AI request");

    let answer = state.service.ask(&prompt).await?;
    Ok(Json(answer))
}
