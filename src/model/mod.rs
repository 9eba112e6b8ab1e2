//! Model clients for AI providers.
//!
//! This module provides a unified interface over heterogeneous provider
//! backends and the failover gateway that drives them.
//!
//! ## Structure
//!
//! - `types`: Core types (GenerateRequest, ModelResponse, StructuredCall)
//! - `traits`: Backend trait definition (ModelBackend)
//! - `provider`: Provider ID enum and parsing
//! - `gateway`: Failover gateway with per-provider health and backoff
//! - `prompts`: System prompt builder
//! - `providers/`: Provider-specific HTTP clients

pub mod gateway;
pub mod prompts;
pub mod provider;
pub mod providers;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use gateway::{GatewayError, GatewayResponse, ProviderGateway, ProviderStatus};
pub use provider::ProviderId;
pub use traits::ModelBackend;
pub use types::{GenerateRequest, ModelError, ModelResponse, StructuredCall};

// Re-export provider clients for convenience
pub use providers::gemini::GeminiClient;
pub use providers::openai_compat::OpenAiCompatClient;
