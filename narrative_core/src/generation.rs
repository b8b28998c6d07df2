//! The seam to the external text generator.
//!
//! The core only composes prompts and inspects results. Retries, backoff and
//! provider selection belong to whoever implements [`TextGenerator`].

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Sampling knobs passed through to the generator untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_tokens: usize,
    pub temperature: Option<f32>,
    pub stop_sequences: Vec<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 600,
            temperature: None,
            stop_sequences: Vec::new(),
        }
    }
}

impl GenerationOptions {
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Token counts reported by the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl TokenUsage {
    pub fn total(&self) -> usize {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// Generated text plus what it cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub usage: TokenUsage,
}

/// An opaque text-generation service.
pub trait TextGenerator {
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Generation, GenerationError>;
}

impl<F> TextGenerator for F
where
    F: Fn(&str, &GenerationOptions) -> Result<Generation, GenerationError>,
{
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<Generation, GenerationError> {
        self(prompt, options)
    }
}
