//! Full path through the real OpenAI client against a mock server.

mod common;

use askai_api::config::Config;
use askai_llm::{ClientFactory, OpenAIConfig};
use askai_persist::{ConversationStore, SqliteConversationStore};
use axum::http::StatusCode;
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

use common::{spawn_app, spawn_app_with};

fn completion(content: &str, total_tokens: u32) -> String {
    json!({
        "id": "chatcmpl-abc",
        "object": "chat.completion",
        "model": "gpt-3.5-turbo-0125",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": total_tokens - 10, "total_tokens": total_tokens}
    })
    .to_string()
}

#[tokio::test]
async fn test_configured_parameters_reach_upstream() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-live")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-3.5-turbo",
            "messages": [{"role": "user", "content": "What is AI?"}],
            "max_tokens": 1000,
            "top_p": 1.0,
            "frequency_penalty": 0.0,
            "presence_penalty": 0.0
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("  AI is...  ", 42))
        .create_async()
        .await;

    let client =
        ClientFactory::create_chat_client(&OpenAIConfig::new("sk-live").with_base_url(server.url()))
            .unwrap();
    let app = spawn_app(client, "sk-live").await;

    let (status, body) = app.ask("What is AI?").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "AI is...");
    assert_eq!(body["model"], "gpt-3.5-turbo-0125");
    mock.assert_async().await;

    let (_, health) = app.get("/api/health").await;
    assert_eq!(health["details"]["usage_statistics"]["total_tokens_used"], 42);
    assert_eq!(app.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_quota_error_from_upstream() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body(
            json!({"error": {
                "message": "You exceeded your current quota, please check your plan and billing details.",
                "type": "insufficient_quota",
                "code": "insufficient_quota"
            }})
            .to_string(),
        )
        .create_async()
        .await;

    let client =
        ClientFactory::create_chat_client(&OpenAIConfig::new("sk-live").with_base_url(server.url()))
            .unwrap();
    let app = spawn_app(client, "sk-live").await;

    let (status, body) = app.ask("What is AI?").await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error_code"], "QUOTA_EXCEEDED");
    assert_eq!(app.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_model_is_service_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(404)
        .with_body(
            json!({"error": {
                "message": "The model `gpt-3.5-turbo` does not exist or you do not have access to it.",
                "type": "invalid_request_error",
                "code": "model_not_found"
            }})
            .to_string(),
        )
        .create_async()
        .await;

    let client =
        ClientFactory::create_chat_client(&OpenAIConfig::new("sk-live").with_base_url(server.url()))
            .unwrap();
    let app = spawn_app(client, "sk-live").await;

    let (status, body) = app.ask("What is AI?").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error_code"], "AI_SERVICE_ERROR");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("'gpt-3.5-turbo' is not available"));
}

#[tokio::test]
async fn test_silent_upstream_times_out_as_504() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let upstream = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let mut config = Config::default();
    config.openai_api_key = "sk-live".to_string();
    config.llm.timeout_secs = 0.3;
    config.llm.base_url = Some(url);
    assert!(config.validate().is_ok());

    let client = ClientFactory::create_chat_client(&config.openai()).unwrap();
    let store = Arc::new(SqliteConversationStore::in_memory().await.unwrap());
    let app = spawn_app_with(client, config, store);

    let (status, body) = app.ask("What is AI?").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "AI Service Error");
    assert_eq!(body["error_code"], "REQUEST_TIMEOUT");
    assert_eq!(app.store.count().await.unwrap(), 0);
    upstream.abort();
}
