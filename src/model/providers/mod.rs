//! Provider-specific HTTP clients, normalized to `ModelResponse`.

pub mod gemini;
pub mod openai_compat;
