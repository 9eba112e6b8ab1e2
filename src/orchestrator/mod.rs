//! Command orchestrator: the entry point tying resolution, safety
//! classification, confirmation, and execution together.
//!
//! `handle` always returns a terminal `Outcome`; nothing raises past this
//! boundary. Dangerous calls return `ConfirmationRequested` immediately and
//! finish asynchronously on a spawned task, delivering the final outcome
//! through the `Notifier`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::sleep;

use crate::catalog::{SafetyTier, ValidatedArguments};
use crate::confirm::{ConfirmationGate, ConfirmationOutcome, ConfirmationRequest, ConfirmError, Signal};
use crate::model::{ProviderGateway, ProviderStatus};
use crate::resolver::{CallRequest, IntentResolver, OriginId, Resolution, ResolutionPath};

/// Extra attempts after a transient execution failure.
const EXEC_RETRIES: u32 = 2;
const EXEC_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Typed failure from the action executor. Only `Transient` is retried.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rate limited")]
    RateLimited,
    #[error("transient failure: {0}")]
    Transient(String),
    #[error("{0}")]
    Unknown(String),
}

impl ExecutionError {
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::PermissionDenied(_) => "permission_denied",
            ExecutionError::NotFound(_) => "not_found",
            ExecutionError::RateLimited => "rate_limited",
            ExecutionError::Transient(_) => "transient",
            ExecutionError::Unknown(_) => "unknown",
        }
    }
}

/// Result of a successfully executed action.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionResult {
    pub message: String,
    pub data: serde_json::Value,
}

/// Performs the actual platform side effect for a validated call.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(
        &self,
        origin: OriginId,
        action: &str,
        arguments: &ValidatedArguments,
    ) -> Result<ExecutionResult, ExecutionError>;
}

/// Requester-facing collaborator: renders confirmation prompts and delivers
/// outcomes that complete asynchronously.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn confirmation_prompt(&self, request: &ConfirmationRequest);
    async fn outcome(&self, origin: OriginId, outcome: &Outcome);
}

/// Why a gated call did not execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    Denied,
    Expired,
}

/// Terminal result of handling one request. Fully determined and
/// serializable; outcome rendering happens outside the core.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Executed {
        action: String,
        tier: SafetyTier,
        path: ResolutionPath,
        result: ExecutionResult,
    },
    ConfirmationRequested {
        confirmation_id: String,
        action: String,
        summary: String,
    },
    Cancelled {
        action: String,
        reason: CancelReason,
    },
    NoActionDetected,
    Failed {
        action: String,
        kind: String,
        detail: String,
    },
}

pub struct Orchestrator {
    resolver: IntentResolver,
    gateway: Arc<ProviderGateway>,
    gate: Arc<ConfirmationGate>,
    executor: Arc<dyn ActionExecutor>,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    pub fn new(
        gateway: Arc<ProviderGateway>,
        gate: Arc<ConfirmationGate>,
        executor: Arc<dyn ActionExecutor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            resolver: IntentResolver::new(gateway.clone()),
            gateway,
            gate,
            executor,
            notifier,
        }
    }

    /// Handle one request end to end. Safe and moderate calls execute
    /// before returning; dangerous calls return `ConfirmationRequested`
    /// and resolve asynchronously.
    pub async fn handle(&self, text: &str, origin: OriginId) -> Outcome {
        let call = match self.resolver.resolve(text, origin).await {
            Resolution::Call(call) => call,
            Resolution::NoActionDetected => return Outcome::NoActionDetected,
        };

        tracing::info!(
            action = call.spec.name,
            tier = %call.spec.tier,
            path = ?call.path,
            origin = %origin,
            "resolved call"
        );

        if !call.spec.tier.requires_confirmation() {
            return execute_call(self.executor.clone(), &call).await;
        }

        let (request, rx) = self.gate.begin(&call);
        self.notifier.confirmation_prompt(&request).await;

        let outcome = Outcome::ConfirmationRequested {
            confirmation_id: request.id.clone(),
            action: request.action.clone(),
            summary: request.summary.clone(),
        };

        let gate = self.gate.clone();
        let executor = self.executor.clone();
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let resolution = gate.wait(&request.id, rx).await;
            let final_outcome = match resolution {
                ConfirmationOutcome::Approved => {
                    tracing::info!(action = call.spec.name, "confirmation approved, executing");
                    execute_call(executor, &call).await
                }
                ConfirmationOutcome::Rejected => Outcome::Cancelled {
                    action: call.spec.name.to_string(),
                    reason: CancelReason::Denied,
                },
                ConfirmationOutcome::Expired => Outcome::Cancelled {
                    action: call.spec.name.to_string(),
                    reason: CancelReason::Expired,
                },
                ConfirmationOutcome::Superseded => {
                    // A newer request from this origin owns the conversation
                    // now; say nothing to avoid confusing the requester.
                    tracing::debug!(action = call.spec.name, "confirmation superseded");
                    return;
                }
            };
            notifier.outcome(call.origin, &final_outcome).await;
        });

        outcome
    }

    /// Entry point for the external confirmation signal channel.
    pub fn resolve_confirmation(
        &self,
        confirmation_id: &str,
        signal: Signal,
    ) -> Result<ConfirmationRequest, ConfirmError> {
        self.gate.resolve(confirmation_id, signal)
    }

    pub fn pending_confirmations(&self, origin: Option<OriginId>) -> Vec<ConfirmationRequest> {
        self.gate.list_pending(origin)
    }

    pub fn provider_status(&self) -> Vec<ProviderStatus> {
        self.gateway.provider_status()
    }
}

/// Execute a validated call, retrying transient failures a bounded number
/// of times. Every failure path maps to a terminal `Outcome`.
async fn execute_call(executor: Arc<dyn ActionExecutor>, call: &CallRequest) -> Outcome {
    let mut attempt = 0;
    loop {
        match executor
            .execute(call.origin, call.spec.name, &call.arguments)
            .await
        {
            Ok(result) => {
                return Outcome::Executed {
                    action: call.spec.name.to_string(),
                    tier: call.spec.tier,
                    path: call.path,
                    result,
                };
            }
            Err(ExecutionError::Transient(detail)) if attempt < EXEC_RETRIES => {
                attempt += 1;
                tracing::warn!(
                    action = call.spec.name,
                    attempt,
                    detail = %detail,
                    "transient execution failure, retrying"
                );
                sleep(EXEC_RETRY_DELAY).await;
            }
            Err(err) => {
                tracing::warn!(action = call.spec.name, error = %err, "execution failed");
                return Outcome::Failed {
                    action: call.spec.name.to_string(),
                    kind: err.kind().to_string(),
                    detail: err.to_string(),
                };
            }
        }
    }
}
