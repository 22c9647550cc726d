//! Text generation trait for the answer-synthesis step.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A completed generation from a chat/text model.
///
/// Providers decode their wire responses into this record at the HTTP
/// boundary; callers never see raw response JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// The generated text, verbatim.
    pub text: String,
    /// The model that produced the text.
    pub model_id: String,
    /// Number of tokens generated, when the provider reports it.
    pub generated_tokens: Option<u64>,
    /// Why generation stopped (e.g. `eos_token`, `max_tokens`), when the
    /// provider reports it.
    pub stop_reason: Option<String>,
}

/// A provider that generates text from a single prompt.
///
/// The retrieval-augmented responder composes the full prompt (guidance +
/// retrieved context + question) and hands it over as one string, so
/// completion-style APIs (watsonx text generation) and chat-style APIs
/// (OpenAI chat completions) sit behind the same seam. Sampling parameters
/// are fixed on the provider at construction; each call is stateless.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<Generation>;

    /// The identifier of the underlying generation model.
    fn model_id(&self) -> &str;
}

/// Sampling parameters applied to every generation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    /// Maximum number of new tokens to generate.
    pub max_new_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { max_new_tokens: 256, temperature: 0.2 }
    }
}
