use askai_llm::{ChatClient, ChatOptions, ChatRequest, Message, UpstreamError};
use askai_persist::{
    ConversationStore, NewConversation, UsageSnapshot, UsageStats, WriteHealth,
    WriteHealthSnapshot,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use crate::classifier::classify;
use crate::config::LlmConfig;
use crate::error::{ApiError, ApiResult};
use crate::validation::PromptValidator;

const PROBE_PROMPT: &str = "Hi";
const PROBE_MAX_TOKENS: u32 = 5;
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Successful answer returned by `POST /api/ask-ai`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AskAiResponse {
    pub prompt: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
    pub model: String,
}

/// Outcome of a live call against the upstream API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiValidation {
    pub valid: bool,
    pub model_available: bool,
    pub model: String,
    pub message: String,
}

/// Validate, call upstream, then log the exchange
///
/// Owns the usage counters and write-failure record so health reporting
/// reads the same handles the request path writes.
pub struct AskService {
    client: Arc<dyn ChatClient>,
    store: Arc<dyn ConversationStore>,
    validator: PromptValidator,
    llm: LlmConfig,
    configured: bool,
    usage: UsageStats,
    write_health: WriteHealth,
}

impl AskService {
    pub fn new(
        client: Arc<dyn ChatClient>,
        store: Arc<dyn ConversationStore>,
        validator: PromptValidator,
        llm: LlmConfig,
        configured: bool,
    ) -> Self {
        Self {
            client,
            store,
            validator,
            llm,
            configured,
            usage: UsageStats::new(),
            write_health: WriteHealth::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.llm.model
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub async fn usage(&self) -> UsageSnapshot {
        self.usage.snapshot().await
    }

    pub async fn write_health(&self) -> WriteHealthSnapshot {
        self.write_health.snapshot().await
    }

    fn completion_options(&self) -> ChatOptions {
        ChatOptions::new()
            .max_tokens(self.llm.max_tokens)
            .temperature(self.llm.temperature)
            .top_p(self.llm.top_p)
            .frequency_penalty(self.llm.frequency_penalty)
            .presence_penalty(self.llm.presence_penalty)
            .timeout(self.llm.timeout())
    }

    pub async fn ask(&self, raw_prompt: &str) -> ApiResult<AskAiResponse> {
        let prompt = self.validator.validate(raw_prompt).map_err(ApiError::Rejected)?;

        if !self.configured {
            return Err(ApiError::NotConfigured);
        }

        tracing::info!(
            prompt_len = prompt.chars().count(),
            model = %self.llm.model,
            "Calling AI service"
        );

        let request = ChatRequest::new(self.llm.model.clone(), vec![Message::human(prompt.clone())])
            .with_options(self.completion_options());

        let reply = match self.client.chat(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("AI service call failed: {}", e);
                return Err(ApiError::Upstream(classify(&e, &self.llm.model)));
            }
        };

        let timestamp = Utc::now();
        let tokens = reply.total_tokens();
        let model = reply.model.clone().unwrap_or_else(|| self.llm.model.clone());

        self.usage.record_usage(tokens).await;

        let entry = NewConversation::new(prompt.clone(), reply.content.clone(), model.clone())
            .at(timestamp);
        match self.store.append(entry).await {
            Ok(record) => tracing::debug!(id = record.id, "Conversation logged"),
            Err(e) => {
                // The answer still goes back to the caller
                tracing::warn!("Failed to save conversation to database: {}", e);
                self.write_health.record_failure(e.to_string()).await;
            }
        }

        tracing::info!(
            response_len = reply.content.chars().count(),
            tokens,
            "Successfully processed AI request"
        );

        Ok(AskAiResponse {
            prompt,
            response: reply.content,
            timestamp,
            model,
        })
    }

    /// Minimal completion to confirm the key and model are usable
    pub async fn probe_upstream(&self) -> ApiValidation {
        let model = self.llm.model.clone();

        if !self.configured {
            return ApiValidation {
                valid: false,
                model_available: false,
                model,
                message: "API key is not configured".to_string(),
            };
        }

        let request = ChatRequest::new(model.clone(), vec![Message::human(PROBE_PROMPT)])
            .with_options(
                ChatOptions::new()
                    .max_tokens(PROBE_MAX_TOKENS)
                    .timeout(PROBE_TIMEOUT),
            );

        match self.client.chat(request).await {
            Ok(_) => ApiValidation {
                valid: true,
                model_available: true,
                model,
                message: "API key is valid and model is accessible".to_string(),
            },
            Err(UpstreamError::Authentication(_)) => ApiValidation {
                valid: false,
                model_available: false,
                model,
                message: "Invalid API key".to_string(),
            },
            Err(e) => ApiValidation {
                valid: true,
                model_available: false,
                model,
                message: format!("API key appears valid but model access failed: {}", e),
            },
        }
    }
}
