//! Command-orchestration core for natural-language server management.
//!
//! Free-text instructions are resolved into structured calls from a fixed
//! action catalog, dangerous calls are gated behind time-boxed interactive
//! confirmation, and the resulting operation runs through an external
//! action executor. When no model backend produces a structured call, a
//! deterministic rule-table matcher over the same catalog takes over.
//!
//! # Architecture
//!
//! - `catalog`: static action registry, safety tiers, argument validation
//! - `model`: provider gateway with ordered failover and health tracking
//! - `resolver`: free text to validated `CallRequest`, with fallback
//! - `confirm`: keyed confirmation gate with expiry and superseding
//! - `orchestrator`: request entry point producing terminal `Outcome`s
//! - `config`: environment-driven provider configuration
//!
//! The chat gateway, the per-operation platform wrappers, and outcome
//! rendering live outside this crate behind the `ActionExecutor` and
//! `Notifier` traits.

pub mod catalog;
pub mod config;
pub mod confirm;
pub mod model;
pub mod orchestrator;
pub mod resolver;

#[cfg(test)]
mod tests;

pub use catalog::{ActionCatalog, ActionSpec, SafetyTier, ValidatedArguments, ValidationError};
pub use config::Config;
pub use confirm::{ConfirmationGate, ConfirmationOutcome, ConfirmationRequest, Signal};
pub use model::{GatewayError, ProviderGateway, ProviderId};
pub use orchestrator::{
    ActionExecutor, ExecutionError, ExecutionResult, Notifier, Orchestrator, Outcome,
};
pub use resolver::{CallRequest, IntentResolver, OriginId, Resolution, ResolutionPath};

/// Initialize tracing with an env-filter (`RUST_LOG`); safe to call once
/// at process start.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
