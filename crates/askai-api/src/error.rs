use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::classifier::ClassifiedError;
use crate::validation::Rejection;

/// One schema problem in the request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            message: format!("Field '{}' is required", field),
            kind: "missing".to_string(),
        }
    }

    pub fn not_a_string(field: &str) -> Self {
        Self {
            field: field.to_string(),
            message: format!("Field '{}' must be a string", field),
            kind: "string_type".to_string(),
        }
    }

    pub fn invalid_json(detail: impl Into<String>) -> Self {
        Self {
            field: "body".to_string(),
            message: detail.into(),
            kind: "json_invalid".to_string(),
        }
    }
}

/// Envelope shared by every error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request validation failed. Please check your input.")]
    Schema(Vec<FieldError>),

    #[error("{}", .0.message)]
    Rejected(Rejection),

    #[error("{}", .0.message)]
    Upstream(ClassifiedError),

    #[error("Storage error: {0}")]
    Storage(#[from] askai_persist::PersistError),

    #[error("AI service is not properly configured. Please check your environment variables.")]
    NotConfigured,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Rejected(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(classified) => classified.status(),
            ApiError::Storage(_) | ApiError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self) -> ErrorBody {
        let message = self.to_string();
        let (error, error_code, suggestions, details) = match self {
            ApiError::Schema(details) => (
                "Validation Error",
                None,
                Some(vec![
                    "Ensure all required fields are provided".to_string(),
                    "Check that field values meet the specified requirements".to_string(),
                ]),
                Some(details),
            ),
            ApiError::Rejected(rejection) => (
                "Invalid Input",
                Some(rejection.code.as_str()),
                Some(rejection.suggestions()),
                None,
            ),
            ApiError::Upstream(classified) => (
                "AI Service Error",
                Some(classified.code.as_str()),
                Some(classified.suggestions()),
                None,
            ),
            ApiError::Storage(_) => ("Database Error", Some("DATABASE_ERROR"), None, None),
            ApiError::NotConfigured => (
                "Service Configuration Error",
                Some("SERVICE_NOT_CONFIGURED"),
                Some(vec!["Set the OPENAI_API_KEY environment variable".to_string()]),
                None,
            ),
        };

        ErrorBody {
            error: error.to_string(),
            error_code: error_code.map(String::from),
            message,
            suggestions,
            details,
            timestamp: Utc::now(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::Storage(e) => tracing::error!("Database error: {}", e),
            ApiError::NotConfigured => tracing::error!("Request refused: no API key configured"),
            ApiError::Upstream(classified) => tracing::warn!(
                code = classified.code.as_str(),
                "AI service error: {}",
                classified.message
            ),
            ApiError::Rejected(rejection) => tracing::warn!(
                code = rejection.code.as_str(),
                "Invalid request: {}",
                rejection.message
            ),
            ApiError::Schema(details) => {
                tracing::warn!(fields = details.len(), "Request body failed schema validation")
            }
        }

        (status, Json(self.into_body())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
