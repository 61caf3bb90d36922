use axum::{
    error_handling::HandleErrorLayer,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    BoxError, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::classifier::ClassifiedError;
use crate::config::Config;
use crate::docs;
use crate::error::ApiError;
use crate::middleware::logging;
use crate::routes::{ask, conversations, health};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/ask-ai", post(ask::ask_ai))
        .route(
            "/conversations",
            get(conversations::list_conversations).delete(conversations::clear_conversations),
        )
        .route("/health", get(health::health_check))
        .route("/openapi.json", get(docs::openapi_json));

    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::liveness))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(logging::log_request))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .timeout(request_timeout),
        )
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Render a request that outlived `server.request_timeout_secs`
///
/// The router itself is infallible, so elapsed deadlines are the only errors
/// that reach this point.
async fn handle_timeout(err: BoxError) -> ApiError {
    tracing::warn!("Request deadline exceeded: {}", err);
    ApiError::Upstream(ClassifiedError::timed_out())
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if !config.cors.enabled {
        return CorsLayer::new();
    }

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if config.cors.origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors
        .origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(origins)
}
