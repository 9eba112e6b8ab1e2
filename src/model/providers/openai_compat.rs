//! OpenAI-compatible chat-completions client.
//!
//! Serves every backend speaking the `/chat/completions` dialect
//! (OpenRouter, Cerebras). Function calls come back as OpenAI tool calls
//! with stringified JSON arguments.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::catalog::ActionDescriptor;
use crate::model::provider::ProviderId;
use crate::model::traits::ModelBackend;
use crate::model::types::{GenerateRequest, ModelError, ModelResponse, StructuredCall};

const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct OpenAiCompatClient {
    provider: ProviderId,
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(
        provider: ProviderId,
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            provider,
            api_key,
            model,
            base_url,
            client,
        }
    }
}

#[async_trait]
impl ModelBackend for OpenAiCompatClient {
    fn id(&self) -> ProviderId {
        self.provider
    }

    fn model_id(&self) -> String {
        self.model.clone()
    }

    async fn invoke(&self, req: &GenerateRequest) -> Result<ModelResponse, ModelError> {
        let endpoint = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let tools = chat_tools(&req.actions);
        let has_tools = tools.is_some();
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                RequestMessage {
                    role: "system",
                    content: req.system_prompt.clone(),
                },
                RequestMessage {
                    role: "user",
                    content: req.user_prompt.clone(),
                },
            ],
            temperature: 0.1,
            max_tokens: req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            tools,
            tool_choice: has_tools.then(|| "auto".to_string()),
        };

        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ModelError::Auth(format!(
                "{} auth failed ({status}). Check API key and account access.",
                self.provider
            )));
        }
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ModelError::RateLimited { retry_after });
        }

        let text = response.text().await.map_err(request_error)?;
        if !status.is_success() {
            return Err(ModelError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            ModelError::InvalidResponse(format!("{} parse failed: {e}", self.provider))
        })?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| {
                ModelError::InvalidResponse(format!(
                    "missing choices[0].message from {} response",
                    self.provider
                ))
            })?;

        let call = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|tc| StructuredCall {
                name: tc.function.name,
                arguments: parse_arguments(&tc.function.arguments),
            });

        Ok(ModelResponse {
            content: message.content.unwrap_or_default(),
            call,
        })
    }
}

fn request_error(e: reqwest::Error) -> ModelError {
    if e.is_timeout() {
        ModelError::Timeout
    } else {
        ModelError::Network(e.to_string())
    }
}

/// Providers stringify tool-call arguments; a garbled payload degrades to an
/// empty map and lets catalog validation reject the call downstream.
fn parse_arguments(raw: &str) -> Map<String, serde_json::Value> {
    match serde_json::from_str(raw) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => {
            tracing::debug!(raw, "could not parse tool call arguments");
            Map::new()
        }
    }
}

fn chat_tools(actions: &[ActionDescriptor]) -> Option<Vec<ChatTool>> {
    if actions.is_empty() {
        return None;
    }
    Some(
        actions
            .iter()
            .map(|d| ChatTool {
                type_: "function".to_string(),
                function: ChatFunction {
                    name: d.name.clone(),
                    description: d.description.clone(),
                    parameters: d.input_schema.clone(),
                },
            })
            .collect(),
    )
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<RequestMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    type_: String,
    function: ChatFunction,
}

#[derive(Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCallEntry>>,
}

#[derive(Deserialize)]
struct ToolCallEntry {
    function: FunctionCallEntry,
}

#[derive(Deserialize)]
struct FunctionCallEntry {
    name: String,
    arguments: String,
}
