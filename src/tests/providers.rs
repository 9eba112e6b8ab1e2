//! HTTP-level tests for the provider clients, against a mock server.

use std::time::Duration;

use httpmock::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::catalog::ActionCatalog;
use crate::model::{
    GeminiClient, GenerateRequest, ModelBackend, ModelError, OpenAiCompatClient, ProviderId,
};

fn request() -> GenerateRequest {
    GenerateRequest {
        system_prompt: "resolve the instruction".to_string(),
        user_prompt: "delete channel general".to_string(),
        actions: ActionCatalog::describe_all(),
        max_tokens: Some(256),
    }
}

fn openai_client(base_url: String) -> OpenAiCompatClient {
    OpenAiCompatClient::new(
        ProviderId::OpenRouter,
        "test-key".to_string(),
        "test-model".to_string(),
        base_url,
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn chat_completions_tool_call_is_decoded() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test-key");
            then.status(200).json_body(json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "function": {
                                "name": "delete_channel",
                                "arguments": "{\"channel\":\"general\"}"
                            }
                        }]
                    }
                }]
            }));
        })
        .await;

    let client = openai_client(server.base_url());
    let response = client.invoke(&request()).await.unwrap();

    mock.assert_async().await;
    let call = response.call.unwrap();
    assert_eq!(call.name, "delete_channel");
    assert_eq!(call.arguments["channel"], "general");
}

#[tokio::test]
async fn chat_completions_text_answer_has_no_call() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [{
                    "message": { "content": "I can't help with that." }
                }]
            }));
        })
        .await;

    let client = openai_client(server.base_url());
    let response = client.invoke(&request()).await.unwrap();

    assert!(response.call.is_none());
    assert_eq!(response.content, "I can't help with that.");
}

#[tokio::test]
async fn chat_completions_429_maps_to_rate_limited_with_retry_after() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).header("retry-after", "30");
        })
        .await;

    let client = openai_client(server.base_url());
    let err = client.invoke(&request()).await.unwrap_err();

    match err {
        ModelError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(30)));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_completions_401_maps_to_auth_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401).body("invalid key");
        })
        .await;

    let client = openai_client(server.base_url());
    assert!(matches!(
        client.invoke(&request()).await.unwrap_err(),
        ModelError::Auth(_)
    ));
}

#[tokio::test]
async fn chat_completions_5xx_is_transient() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503).body("upstream overloaded");
        })
        .await;

    let client = openai_client(server.base_url());
    let err = client.invoke(&request()).await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn gemini_function_call_is_decoded() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/gemini-1.5-flash:generateContent")
                .query_param("key", "test-key");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {
                        "parts": [
                            { "text": "Removing the channel now." },
                            {
                                "functionCall": {
                                    "name": "delete_channel",
                                    "args": { "channel": "general" }
                                }
                            }
                        ]
                    }
                }]
            }));
        })
        .await;

    let client = GeminiClient::new(
        "test-key".to_string(),
        "gemini-1.5-flash".to_string(),
        server.base_url(),
        Duration::from_secs(5),
    );
    let response = client.invoke(&request()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.content, "Removing the channel now.");
    let call = response.call.unwrap();
    assert_eq!(call.name, "delete_channel");
    assert_eq!(call.arguments["channel"], "general");
}

#[tokio::test]
async fn gemini_empty_candidates_is_an_invalid_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/models/gemini-1.5-flash:generateContent");
            then.status(200).json_body(json!({ "candidates": [] }));
        })
        .await;

    let client = GeminiClient::new(
        "test-key".to_string(),
        "gemini-1.5-flash".to_string(),
        server.base_url(),
        Duration::from_secs(5),
    );
    assert!(matches!(
        client.invoke(&request()).await.unwrap_err(),
        ModelError::InvalidResponse(_)
    ));
}
