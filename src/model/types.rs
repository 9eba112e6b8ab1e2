//! Request/response types shared by all provider backends.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::catalog::ActionDescriptor;

/// A single generation request, carrying the catalog schema surface so
/// providers with native function calling can return structured calls.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub actions: Vec<ActionDescriptor>,
    /// Maximum tokens for the response. `None` uses provider defaults.
    pub max_tokens: Option<u32>,
}

/// A function call extracted from a provider response, not yet validated
/// against the catalog.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StructuredCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// Normalized provider response: free text plus an optional structured call.
/// A text-only response is not an error; the resolver's fallback decides
/// what to do with it.
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    pub content: String,
    pub call: Option<StructuredCall>,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("provider returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("auth failed: {0}")]
    Auth(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    /// Transient errors are retried against the same provider with backoff.
    /// Everything else moves straight to the next provider.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Network(_) | ModelError::Timeout => true,
            ModelError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
