// OpenAI-specific client implementation

use crate::error::{Result, UpstreamError};
use crate::traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};
use crate::types::Message;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI client (HTTP direct, no SDK)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, OPENAI_API_BASE)
    }

    /// Create a client against a compatible endpoint (proxies, mock servers)
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build chat completion request payload
    fn build_chat_request<'a>(
        model: &'a str,
        messages: &'a [Message],
        options: &ChatOptions,
    ) -> ChatCompletionPayload<'a> {
        ChatCompletionPayload {
            model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
        }
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = Self::build_chat_request(&request.model, &request.messages, &request.options);

        let mut builder = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload);

        if let Some(timeout) = request.options.timeout {
            builder = builder.timeout(timeout);
        }

        tracing::debug!(model = %request.model, "Sending chat completion request");

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = error_from_status(status, &body);
            tracing::warn!(status = %status, error = %err, "OpenAI API returned an error");
            return Err(err);
        }

        parse_chat_response(&body)
    }
}

/// Fold a non-2xx response into the closed error set.
pub(crate) fn error_from_status(status: StatusCode, body: &str) -> UpstreamError {
    let detail = serde_json::from_str::<OpenAIErrorEnvelope>(body)
        .map(|envelope| envelope.error)
        .ok();

    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body.to_string()
            }
        });

    // `code` is a string for most errors but the API has sent integers before
    let code = detail.as_ref().and_then(|d| match &d.code {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    });
    let kind = detail.as_ref().and_then(|d| d.kind.clone());

    match status {
        StatusCode::UNAUTHORIZED => UpstreamError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => {
            let is_quota = code.as_deref() == Some("insufficient_quota")
                || kind.as_deref() == Some("insufficient_quota")
                || message.to_lowercase().contains("quota");
            if is_quota {
                UpstreamError::QuotaExceeded(message)
            } else {
                UpstreamError::RateLimited(message)
            }
        }
        StatusCode::REQUEST_TIMEOUT => UpstreamError::Timeout(message),
        _ => UpstreamError::Api {
            status: status.as_u16(),
            code: code.or(kind),
            message,
        },
    }
}

pub(crate) fn parse_chat_response(body: &str) -> Result<ChatResponse> {
    let raw: OpenAIChatResponse = serde_json::from_str(body)
        .map_err(|e| UpstreamError::MalformedResponse(format!("invalid JSON body: {}", e)))?;

    let choice = raw
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::MalformedResponse("no choices returned".to_string()))?;

    let content = choice
        .message
        .and_then(|m| m.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| UpstreamError::MalformedResponse("empty response content".to_string()))?;

    let usage = raw.usage.map(|u| TokenUsage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    if let Some(usage) = &usage {
        tracing::info!(
            prompt_tokens = usage.input_tokens,
            completion_tokens = usage.output_tokens,
            total_tokens = usage.total_tokens,
            "Token usage"
        );
    }

    Ok(ChatResponse {
        content,
        model: raw.model,
        usage,
        finish_reason: choice.finish_reason,
    })
}

// ============================================================================
// OPENAI WIRE TYPES (Chat Completions)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionPayload<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorEnvelope {
    error: OpenAIErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_includes_all_sampling_options() {
        let messages = vec![Message::human("What is AI?")];
        let options = ChatOptions::new()
            .temperature(0.7)
            .max_tokens(1000)
            .top_p(1.0)
            .frequency_penalty(0.5)
            .presence_penalty(-0.5);

        let payload = OpenAIClient::build_chat_request("gpt-3.5-turbo", &messages, &options);
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "What is AI?");
        assert_eq!(value["max_tokens"], 1000);
        assert_eq!(value["top_p"], 1.0);
        assert_eq!(value["frequency_penalty"], 0.5);
        assert_eq!(value["presence_penalty"], -0.5);
    }

    #[test]
    fn test_payload_omits_unset_options() {
        let messages = vec![Message::human("Hi")];
        let payload =
            OpenAIClient::build_chat_request("gpt-4o", &messages, &ChatOptions::default());
        let value = serde_json::to_value(&payload).unwrap();

        assert!(value.get("temperature").is_none());
        assert!(value.get("max_tokens").is_none());
        assert!(value.get("timeout").is_none());
    }

    #[test]
    fn test_unauthorized_maps_to_authentication() {
        let body = json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error", "code": "invalid_api_key"}});
        let err = error_from_status(StatusCode::UNAUTHORIZED, &body.to_string());
        assert_eq!(
            err,
            UpstreamError::Authentication("Incorrect API key provided".to_string())
        );
    }

    #[test]
    fn test_429_with_quota_code_maps_to_quota() {
        let body = json!({"error": {"message": "You exceeded your current plan", "type": "insufficient_quota", "code": "insufficient_quota"}});
        let err = error_from_status(StatusCode::TOO_MANY_REQUESTS, &body.to_string());
        assert!(matches!(err, UpstreamError::QuotaExceeded(_)));
    }

    #[test]
    fn test_429_without_quota_maps_to_rate_limit() {
        let body = json!({"error": {"message": "Rate limit reached for requests", "type": "requests", "code": "rate_limit_exceeded"}});
        let err = error_from_status(StatusCode::TOO_MANY_REQUESTS, &body.to_string());
        assert!(matches!(err, UpstreamError::RateLimited(_)));
    }

    #[test]
    fn test_unknown_status_keeps_code() {
        let body = json!({"error": {"message": "The model `gpt-9` does not exist", "type": "invalid_request_error", "code": "model_not_found"}});
        let err = error_from_status(StatusCode::NOT_FOUND, &body.to_string());
        assert_eq!(err.code(), Some("model_not_found"));
    }

    #[test]
    fn test_non_json_error_body_is_tolerated() {
        let err = error_from_status(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        match err {
            UpstreamError::Api { status, code, message } => {
                assert_eq!(status, 502);
                assert_eq!(code, None);
                assert!(message.contains("bad gateway"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_trims_content() {
        let body = json!({
            "id": "chatcmpl-1",
            "model": "gpt-3.5-turbo-0125",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  AI is...\n"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 32, "total_tokens": 42}
        });
        let response = parse_chat_response(&body.to_string()).unwrap();
        assert_eq!(response.content, "AI is...");
        assert_eq!(response.total_tokens(), 42);
        assert_eq!(response.model.as_deref(), Some("gpt-3.5-turbo-0125"));
    }

    #[test]
    fn test_parse_response_without_choices_is_malformed() {
        let body = json!({"id": "chatcmpl-1", "choices": []});
        let err = parse_chat_response(&body.to_string()).unwrap_err();
        assert!(matches!(err, UpstreamError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_response_with_empty_content_is_malformed() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "   "}}]});
        let err = parse_chat_response(&body.to_string()).unwrap_err();
        assert!(matches!(err, UpstreamError::MalformedResponse(_)));
    }
}
