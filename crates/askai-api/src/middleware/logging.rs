use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// One line per request; server errors are raised to `warn`
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status();

    if status.is_server_error() {
        tracing::warn!(
            method = %method,
            uri = %path,
            status = status.as_u16(),
            duration_ms = %duration_ms,
            "Request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            uri = %path,
            status = status.as_u16(),
            duration_ms = %duration_ms,
            "Request processed"
        );
    }

    response
}
