//! Google Gemini `generateContent` client.
//!
//! The request/response shapes differ from the chat-completions dialect:
//! function schemas ride in `tools[].functionDeclarations` and calls come
//! back as `functionCall` parts with structured (not stringified) args.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::catalog::ActionDescriptor;
use crate::model::provider::ProviderId;
use crate::model::traits::ModelBackend;
use crate::model::types::{GenerateRequest, ModelError, ModelResponse, StructuredCall};

const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            api_key,
            model,
            base_url,
            client,
        }
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    fn id(&self) -> ProviderId {
        ProviderId::GoogleAi
    }

    fn model_id(&self) -> String {
        self.model.clone()
    }

    async fn invoke(&self, req: &GenerateRequest) -> Result<ModelResponse, ModelError> {
        let endpoint = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let tools = if req.actions.is_empty() {
            None
        } else {
            Some(vec![GeminiTools {
                function_declarations: req
                    .actions
                    .iter()
                    .map(|d| GeminiFunctionDeclaration {
                        name: d.name.clone(),
                        description: d.description.clone(),
                        parameters: d.input_schema.clone(),
                    })
                    .collect(),
            }])
        };

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiRequestPart {
                    text: format!("System: {}\n\nUser: {}", req.system_prompt, req.user_prompt),
                }],
            }],
            tools,
            generation_config: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            },
        };

        let response = self
            .client
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ModelError::Auth(format!(
                "google_ai auth failed ({status}). Check API key."
            )));
        }
        if status.as_u16() == 429 {
            return Err(ModelError::RateLimited { retry_after: None });
        }

        let text = response.text().await.map_err(request_error)?;
        if !status.is_success() {
            return Err(ModelError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::InvalidResponse(format!("google_ai parse failed: {e}")))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("no candidates in response".to_string()))?;

        let mut content = String::new();
        let mut call = None;
        for part in candidate.content.parts {
            if let Some(text) = part.text {
                content.push_str(&text);
            }
            if call.is_none() {
                if let Some(fc) = part.function_call {
                    call = Some(StructuredCall {
                        name: fc.name,
                        arguments: fc.args.unwrap_or_default(),
                    });
                }
            }
        }

        Ok(ModelResponse { content, call })
    }
}

fn request_error(e: reqwest::Error) -> ModelError {
    if e.is_timeout() {
        ModelError::Timeout
    } else {
        ModelError::Network(e.to_string())
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTools>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiRequestPart>,
}

#[derive(Serialize)]
struct GeminiRequestPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiTools {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
    #[serde(rename = "functionCall")]
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Option<Map<String, serde_json::Value>>,
}
