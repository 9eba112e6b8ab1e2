//! Intent resolution: free text to a validated call request.
//!
//! The gateway is asked first, with the full catalog schema surface. A
//! structured call that names a known action and passes validation wins.
//! Anything else (text-only answer, malformed call, total provider
//! exhaustion) drops to the deterministic fallback matcher.

pub mod fallback;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{ActionCatalog, ActionSpec, ValidatedArguments};
use crate::model::prompts::intent_system_prompt;
use crate::model::{GenerateRequest, ProviderGateway, StructuredCall};

/// Identity of the requester and conversation, used to correlate requests
/// with confirmations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OriginId {
    pub guild_id: u64,
    pub channel_id: u64,
    pub user_id: u64,
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.guild_id, self.channel_id, self.user_id)
    }
}

/// How a call request was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    ModelStructured,
    HeuristicFallback,
}

/// A resolved candidate invocation. Immutable; consumed once by the
/// orchestrator.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub spec: &'static ActionSpec,
    pub arguments: ValidatedArguments,
    pub source_text: String,
    pub origin: OriginId,
    pub path: ResolutionPath,
}

/// Outcome of intent resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    Call(CallRequest),
    NoActionDetected,
}

pub struct IntentResolver {
    gateway: Arc<ProviderGateway>,
}

impl IntentResolver {
    pub fn new(gateway: Arc<ProviderGateway>) -> Self {
        Self { gateway }
    }

    /// Resolve request text into zero-or-one validated call.
    pub async fn resolve(&self, text: &str, origin: OriginId) -> Resolution {
        let actions = ActionCatalog::describe_all();
        let request = GenerateRequest {
            system_prompt: intent_system_prompt(&actions),
            user_prompt: text.to_string(),
            actions,
            max_tokens: None,
        };

        match self.gateway.generate(&request).await {
            Ok(response) => {
                if let Some(call) = response.call {
                    match self.validated(&call, text, origin, ResolutionPath::ModelStructured) {
                        Some(request) => return Resolution::Call(request),
                        None => {
                            tracing::warn!(
                                provider = %response.provider,
                                action = %call.name,
                                "structured call failed catalog validation, trying fallback"
                            );
                        }
                    }
                } else {
                    tracing::debug!(
                        provider = %response.provider,
                        "text-only response, trying fallback"
                    );
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "gateway exhausted, trying fallback");
            }
        }

        self.resolve_heuristically(text, origin)
    }

    /// Run only the deterministic matcher (used directly by tests and when
    /// the gateway has no configured backends).
    pub fn resolve_heuristically(&self, text: &str, origin: OriginId) -> Resolution {
        let Some(detected) = fallback::detect(text) else {
            tracing::debug!(origin = %origin, "no action detected");
            return Resolution::NoActionDetected;
        };
        let call = StructuredCall {
            name: detected.action.to_string(),
            arguments: detected.arguments,
        };
        match self.validated(&call, text, origin, ResolutionPath::HeuristicFallback) {
            Some(request) => {
                tracing::info!(action = %call.name, "resolved via heuristic fallback");
                Resolution::Call(request)
            }
            None => Resolution::NoActionDetected,
        }
    }

    fn validated(
        &self,
        call: &StructuredCall,
        text: &str,
        origin: OriginId,
        path: ResolutionPath,
    ) -> Option<CallRequest> {
        let spec = ActionCatalog::lookup(&call.name)?;
        match ActionCatalog::validate(&call.name, &call.arguments) {
            Ok(arguments) => Some(CallRequest {
                spec,
                arguments,
                source_text: text.to_string(),
                origin,
                path,
            }),
            Err(err) => {
                tracing::debug!(action = %call.name, error = %err, "validation failed");
                None
            }
        }
    }
}
