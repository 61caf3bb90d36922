#![allow(dead_code)]

use askai_api::{
    build_router, config::Config, state::AppState, validation::PromptValidator, AskService,
};
use askai_llm::{ChatClient, ChatRequest, ChatResponse, TokenUsage, UpstreamError};
use askai_persist::{
    ConversationRecord, ConversationStore, NewConversation, PersistError, SqliteConversationStore,
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Chat client returning the same canned outcome for every call
pub struct StubChatClient {
    outcome: Result<ChatResponse, UpstreamError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubChatClient {
    pub fn answering(content: &str, tokens: u32) -> Self {
        Self {
            outcome: Ok(ChatResponse {
                content: content.to_string(),
                model: Some("gpt-3.5-turbo-0125".to_string()),
                usage: Some(TokenUsage {
                    input_tokens: 0,
                    output_tokens: tokens,
                    total_tokens: tokens,
                }),
                finish_reason: Some("stop".to_string()),
            }),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: UpstreamError) -> Self {
        Self {
            outcome: Err(error),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Hold every call for `delay` before answering
    pub fn stalling(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatClient for StubChatClient {
    async fn chat(&self, _request: ChatRequest) -> askai_llm::error::Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}

/// Store that stays reachable but refuses every read and write of records
pub struct ReadOnlyDiskStore;

fn disk_full() -> PersistError {
    PersistError::Connection("database or disk is full".to_string())
}

#[async_trait]
impl ConversationStore for ReadOnlyDiskStore {
    async fn append(
        &self,
        _conversation: NewConversation,
    ) -> askai_persist::error::Result<ConversationRecord> {
        Err(disk_full())
    }

    async fn list_all(&self) -> askai_persist::error::Result<Vec<ConversationRecord>> {
        Err(disk_full())
    }

    async fn delete_all(&self) -> askai_persist::error::Result<u64> {
        Err(disk_full())
    }

    async fn count(&self) -> askai_persist::error::Result<u64> {
        Ok(0)
    }

    async fn ping(&self) -> askai_persist::error::Result<()> {
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn ConversationStore>,
}

pub async fn spawn_app(client: Arc<dyn ChatClient>, api_key: &str) -> TestApp {
    let mut config = Config::default();
    config.openai_api_key = api_key.to_string();

    let store = Arc::new(SqliteConversationStore::in_memory().await.unwrap());
    spawn_app_with(client, config, store)
}

pub fn spawn_app_with(
    client: Arc<dyn ChatClient>,
    config: Config,
    store: Arc<dyn ConversationStore>,
) -> TestApp {
    let service = AskService::new(
        client,
        store.clone(),
        PromptValidator::from_config(&config.validation),
        config.llm.clone(),
        config.is_api_key_configured(),
    );

    let state = Arc::new(AppState::new(config, store.clone(), service));

    TestApp {
        router: build_router(state),
        store,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(Body::from(body.unwrap_or_default().to_string()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    pub async fn ask(&self, prompt: &str) -> (StatusCode, Value) {
        let body = serde_json::json!({ "prompt": prompt }).to_string();
        self.request(Method::POST, "/api/ask-ai", Some(&body)).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }
}
