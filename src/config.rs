//! Environment-driven configuration for provider backends.
//!
//! Loaded once at startup. A provider is enabled when its API key is set;
//! the gateway is built over enabled providers in priority order.

use std::sync::Arc;
use std::time::Duration;

use crate::confirm::DEFAULT_CONFIRM_TIMEOUT;
use crate::model::{GeminiClient, ModelBackend, OpenAiCompatClient, ProviderGateway, ProviderId};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl ProviderSettings {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter: ProviderSettings,
    pub google_ai: ProviderSettings,
    pub cerebras: ProviderSettings,
    pub request_timeout: Duration,
    pub confirm_timeout: Duration,
}

impl Config {
    /// Read configuration from the environment (and `.env` if present).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let openrouter_key =
            std::env::var("OPENROUTER_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY"));

        let confirm_timeout = std::env::var("GUILDPILOT_CONFIRM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONFIRM_TIMEOUT);

        Self {
            openrouter: ProviderSettings {
                api_key: openrouter_key.ok(),
                base_url: env_or("OPENROUTER_BASE_URL", "https://openrouter.ai/api/v1"),
                model: env_or("OPENROUTER_MODEL", "deepseek/deepseek-chat-v3-0324:free"),
            },
            google_ai: ProviderSettings {
                api_key: std::env::var("GOOGLE_AI_KEY").ok(),
                base_url: env_or(
                    "GOOGLE_AI_BASE_URL",
                    "https://generativelanguage.googleapis.com/v1beta",
                ),
                model: env_or("GOOGLE_AI_MODEL", "gemini-1.5-flash"),
            },
            cerebras: ProviderSettings {
                api_key: std::env::var("CEREBRAS_API_KEY").ok(),
                base_url: env_or("CEREBRAS_BASE_URL", "https://cerebras.cloud/api/v1"),
                model: env_or("CEREBRAS_MODEL", "llama-3.3-70b"),
            },
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            confirm_timeout,
        }
    }

    /// Build the failover gateway over every configured provider, in
    /// priority order: OpenRouter, Google AI, Cerebras.
    pub fn build_gateway(&self) -> Arc<ProviderGateway> {
        let mut backends: Vec<Box<dyn ModelBackend>> = Vec::new();

        if let Some(key) = &self.openrouter.api_key {
            backends.push(Box::new(OpenAiCompatClient::new(
                ProviderId::OpenRouter,
                key.clone(),
                self.openrouter.model.clone(),
                self.openrouter.base_url.clone(),
                self.request_timeout,
            )));
        }
        if let Some(key) = &self.google_ai.api_key {
            backends.push(Box::new(GeminiClient::new(
                key.clone(),
                self.google_ai.model.clone(),
                self.google_ai.base_url.clone(),
                self.request_timeout,
            )));
        }
        if let Some(key) = &self.cerebras.api_key {
            backends.push(Box::new(OpenAiCompatClient::new(
                ProviderId::Cerebras,
                key.clone(),
                self.cerebras.model.clone(),
                self.cerebras.base_url.clone(),
                self.request_timeout,
            )));
        }

        if backends.is_empty() {
            tracing::warn!("no model providers configured, only the fallback matcher will run");
        }

        Arc::new(ProviderGateway::new(backends))
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
