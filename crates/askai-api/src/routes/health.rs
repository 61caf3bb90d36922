use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::service::ApiValidation;
use crate::state::AppState;

const SERVICE_NAME: &str = "AI API Integration Backend";

#[derive(Debug, Serialize, ToSchema)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessResponse {
    pub status: String,
    pub message: String,
    pub openai_configured: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HealthQuery {
    /// Set to `true` to make a live call against the AI service
    pub validate_api: Option<String>,
}

impl HealthQuery {
    fn wants_probe(&self) -> bool {
        self.validate_api
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdvancedParameters {
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

/// Configuration summary. The key itself is never echoed.
#[derive(Debug, Serialize, ToSchema)]
pub struct OpenAiConfiguration {
    pub api_key_configured: bool,
    pub api_key_format_valid: bool,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: f64,
    pub advanced_parameters: AdvancedParameters,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
    /// Log writes lost after a successful AI answer
    pub failed_writes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_write_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_write_error_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsageStatistics {
    pub total_requests: u64,
    pub total_tokens_used: u64,
    pub average_tokens_per_request: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthDetails {
    pub openai_configuration: OpenAiConfiguration,
    pub database_status: DatabaseStatus,
    pub usage_statistics: UsageStatistics,
    pub api_validation: Option<ApiValidation>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub openai_configured: bool,
    pub timestamp: DateTime<Utc>,
    pub details: HealthDetails,
}

/// Basic service information
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service information", body = RootResponse)),
    tag = "Health"
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Process is up", body = LivenessResponse)),
    tag = "Health"
)]
pub async fn liveness(State(state): State<Arc<AppState>>) -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "OK".to_string(),
        message: format!("{} is running", SERVICE_NAME),
        openai_configured: state.config.is_api_key_configured(),
    })
}

/// Health check endpoint
///
/// Reports configuration, store connectivity and usage counters. With
/// `validate_api=true` it also makes a live call against the AI service.
#[utoipa::path(
    get,
    path = "/api/health",
    params(HealthQuery),
    responses(
        (status = 200, description = "Health report", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HealthQuery>,
) -> Json<HealthResponse> {
    let config = &state.config;
    let openai = config.openai();

    let openai_configuration = OpenAiConfiguration {
        api_key_configured: openai.is_configured(),
        api_key_format_valid: openai.has_valid_key_format(),
        model: config.llm.model.clone(),
        max_tokens: config.llm.max_tokens,
        temperature: config.llm.temperature,
        timeout: config.llm.timeout_secs,
        advanced_parameters: AdvancedParameters {
            top_p: config.llm.top_p,
            frequency_penalty: config.llm.frequency_penalty,
            presence_penalty: config.llm.presence_penalty,
        },
    };

    let database_status = check_database(&state).await;

    let usage = state.service.usage().await;
    let usage_statistics = UsageStatistics {
        total_requests: usage.total_requests,
        total_tokens_used: usage.total_tokens_used,
        average_tokens_per_request: usage.average_tokens_per_request,
    };

    let api_validation = if query.wants_probe() {
        Some(state.service.probe_upstream().await)
    } else {
        None
    };

    let healthy = openai_configuration.api_key_configured && database_status.connected;
    if !healthy {
        tracing::warn!(
            api_key_configured = openai_configuration.api_key_configured,
            database_connected = database_status.connected,
            "Service is degraded"
        );
    }

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        message: "API is operational".to_string(),
        openai_configured: openai.is_configured() && openai.has_valid_key_format(),
        timestamp: Utc::now(),
        details: HealthDetails {
            openai_configuration,
            database_status,
            usage_statistics,
            api_validation,
        },
    })
}

async fn check_database(state: &AppState) -> DatabaseStatus {
    let writes = state.service.write_health().await;

    let reachable = match state.store.ping().await {
        Ok(()) => state.store.count().await,
        Err(e) => Err(e),
    };

    match reachable {
        Ok(count) => DatabaseStatus {
            connected: true,
            conversation_count: Some(count),
            error: None,
            message: "Database is accessible".to_string(),
            failed_writes: writes.failed_writes,
            last_write_error: writes.last_error,
            last_write_error_at: writes.last_error_at,
        },
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            DatabaseStatus {
                connected: false,
                conversation_count: None,
                error: Some(e.to_string()),
                message: "Database connection failed".to_string(),
                failed_writes: writes.failed_writes,
                last_write_error: writes.last_error,
                last_write_error_at: writes.last_error_at,
            }
        }
    }
}
