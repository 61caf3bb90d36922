//! Maps upstream failures onto the stable error codes callers branch on.

use askai_llm::UpstreamError;
use axum::http::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorCode {
    InvalidApiKey,
    RateLimitExceeded,
    QuotaExceeded,
    RequestTimeout,
    AiServiceError,
}

impl ServiceErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::RequestTimeout => "REQUEST_TIMEOUT",
            Self::AiServiceError => "AI_SERVICE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Self::RateLimitExceeded | Self::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::RequestTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::AiServiceError => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            Self::InvalidApiKey => &[
                "Check your OpenAI API key",
                "Ensure the API key has proper permissions",
            ],
            Self::RateLimitExceeded => &[
                "Wait a few minutes before trying again",
                "Consider upgrading your OpenAI plan",
            ],
            Self::QuotaExceeded => &[
                "Check your OpenAI account billing",
                "Add credits to your OpenAI account",
            ],
            Self::RequestTimeout => &[
                "Try again with a shorter prompt",
                "Check your internet connection",
            ],
            Self::AiServiceError => &[
                "Try again in a few moments",
                "Contact support if the issue persists",
            ],
        }
    }
}

/// An upstream failure ready to be rendered for the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub code: ServiceErrorCode,
    pub message: String,
}

impl ClassifiedError {
    /// Deadline hit, either by the upstream client or by the request as a whole
    pub fn timed_out() -> Self {
        Self {
            code: ServiceErrorCode::RequestTimeout,
            message: "AI service request timed out. Please try again with a shorter prompt."
                .to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    pub fn suggestions(&self) -> Vec<String> {
        self.code
            .suggestions()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Classify an upstream error. Unknown shapes land in `AI_SERVICE_ERROR`.
pub fn classify(error: &UpstreamError, model: &str) -> ClassifiedError {
    let (code, message) = match error {
        UpstreamError::Authentication(_) => (
            ServiceErrorCode::InvalidApiKey,
            "Invalid API key or authentication failed. Please check your OpenAI API key."
                .to_string(),
        ),
        UpstreamError::RateLimited(_) => (
            ServiceErrorCode::RateLimitExceeded,
            "Rate limit exceeded. Please wait a moment before trying again.".to_string(),
        ),
        UpstreamError::QuotaExceeded(_) => (
            ServiceErrorCode::QuotaExceeded,
            "API quota exceeded. Please check your OpenAI account billing and usage limits."
                .to_string(),
        ),
        UpstreamError::Timeout(_) => return ClassifiedError::timed_out(),
        UpstreamError::Connection(_) => (
            ServiceErrorCode::AiServiceError,
            "Unable to connect to AI service. Please check your internet connection and try again."
                .to_string(),
        ),
        UpstreamError::Api { code, message, .. } => (
            ServiceErrorCode::AiServiceError,
            describe_api_error(code.as_deref(), message, model),
        ),
        UpstreamError::MalformedResponse(detail) => (
            ServiceErrorCode::AiServiceError,
            format!("Malformed response from AI service: {}", detail),
        ),
        UpstreamError::Transport(detail) => (
            ServiceErrorCode::AiServiceError,
            format!("AI service error: {}", detail),
        ),
    };

    ClassifiedError { code, message }
}

fn describe_api_error(code: Option<&str>, message: &str, model: &str) -> String {
    let code = code.unwrap_or_default();
    let lowered = message.to_lowercase();

    let model_missing = code == "model_not_found"
        || (lowered.contains("model")
            && (lowered.contains("not found") || lowered.contains("does not exist")));

    if model_missing {
        format!(
            "The specified model '{}' is not available. Please check your model configuration.",
            model
        )
    } else if code == "content_filter" || lowered.contains("content_filter") {
        "Your prompt was filtered due to content policy. Please rephrase your request.".to_string()
    } else if code.contains("context_length") || lowered.contains("context_length") {
        "Your prompt is too long for the selected model. Please shorten your prompt.".to_string()
    } else {
        format!("AI service error: {}", message)
    }
}
