//! Traits for model backends.

use async_trait::async_trait;

use crate::model::provider::ProviderId;
use crate::model::types::{GenerateRequest, ModelError, ModelResponse};

/// One backend capable of turning a prompt into text and/or a structured
/// call. Implemented by the HTTP clients in `providers/` and by scripted
/// fakes in tests.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn id(&self) -> ProviderId;
    fn model_id(&self) -> String;
    async fn invoke(&self, req: &GenerateRequest) -> Result<ModelResponse, ModelError>;
}
