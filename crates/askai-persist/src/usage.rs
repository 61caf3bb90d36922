//! Process-lifetime counters. Nothing here survives a restart.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct UsageCounters {
    total_requests: u64,
    total_tokens_used: u64,
}

/// Shared handle over successful-call counters
///
/// Cloning shares the same counters.
#[derive(Debug, Clone, Default)]
pub struct UsageStats {
    inner: Arc<Mutex<UsageCounters>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageSnapshot {
    pub total_requests: u64,
    pub total_tokens_used: u64,
    pub average_tokens_per_request: f64,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one successful upstream call and the tokens it reported
    pub async fn record_usage(&self, tokens: u64) {
        let mut counters = self.inner.lock().await;
        counters.total_requests += 1;
        counters.total_tokens_used += tokens;
    }

    pub async fn snapshot(&self) -> UsageSnapshot {
        let counters = self.inner.lock().await;
        UsageSnapshot {
            total_requests: counters.total_requests,
            total_tokens_used: counters.total_tokens_used,
            average_tokens_per_request: average(
                counters.total_tokens_used,
                counters.total_requests,
            ),
        }
    }
}

/// Mean tokens per request, rounded to two decimals
fn average(tokens: u64, requests: u64) -> f64 {
    if requests == 0 {
        return 0.0;
    }
    let avg = tokens as f64 / requests as f64;
    (avg * 100.0).round() / 100.0
}

#[derive(Debug, Default)]
struct WriteFailures {
    failed_writes: u64,
    last_error: Option<String>,
    last_error_at: Option<DateTime<Utc>>,
}

/// Failures of the write-after-success path
///
/// A failed log write never fails the request, so it is recorded here for the
/// health endpoint instead.
#[derive(Debug, Clone, Default)]
pub struct WriteHealth {
    inner: Arc<Mutex<WriteFailures>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteHealthSnapshot {
    pub failed_writes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_at: Option<DateTime<Utc>>,
}

impl WriteHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_failure(&self, error: impl Into<String>) {
        let mut failures = self.inner.lock().await;
        failures.failed_writes += 1;
        failures.last_error = Some(error.into());
        failures.last_error_at = Some(Utc::now());
    }

    pub async fn snapshot(&self) -> WriteHealthSnapshot {
        let failures = self.inner.lock().await;
        WriteHealthSnapshot {
            failed_writes: failures.failed_writes,
            last_error: failures.last_error.clone(),
            last_error_at: failures.last_error_at,
        }
    }
}
