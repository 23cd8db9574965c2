//! Text generation for LLM-backed transforms

use crate::cache::JsonCache;
use crate::error::is_transient;
use crate::pipeline::with_retry;
use crate::prelude::*;
use homecooked_core::cache::cache_key;
use homecooked_core::llm::{build_prompt, validate_response, Validation};
use homecooked_core::retry::RetryPolicy;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::ollama;
use serde::{Deserialize, Serialize};

const SYSTEM_PREAMBLE: &str = "\
You transform documents. You receive an instruction and the document inside <input> tags.

Rules:
- Output only the transformed document. No preamble. No explanations. No markdown fences around the whole answer.
- Keep everything the instruction does not ask you to change.
- Never truncate or summarize unless the instruction asks for it.";

/// Anything that turns a prompt into text.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Identifies the backend in cache keys so switching models misses the cache.
    fn name(&self) -> String;
}

fn create_client(ollama_url: &str) -> Result<ollama::Client> {
    use rig::client::Nothing;

    ollama::Client::builder()
        .api_key(Nothing)
        .base_url(ollama_url)
        .build()
        .map_err(|e| eyre!("Failed to create Ollama client: {}", e))
}

/// Ollama-backed generator with a bounded response size.
pub struct OllamaGenerator {
    client: ollama::Client,
    model: String,
    max_tokens: u64,
}

impl OllamaGenerator {
    pub fn new(ollama_url: &str, model: &str, max_tokens: u64) -> Result<Self> {
        Ok(Self {
            client: create_client(ollama_url)?,
            model: model.to_string(),
            max_tokens,
        })
    }
}

#[async_trait::async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(SYSTEM_PREAMBLE)
            .max_tokens(self.max_tokens)
            .build();

        let prompt = prompt.to_string();
        agent
            .prompt(&prompt)
            .await
            .map_err(|e| eyre!("Model generation failed: {}", e))
    }

    fn name(&self) -> String {
        f!("ollama:{}", self.model)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedResponse {
    output: String,
}

/// Result of one rewrite.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub output: String,
    /// Served from the cache without calling the generator.
    pub cached: bool,
}

/// Generator + validation + optional cache.
///
/// Only validated outputs are cached, so a bad response is retried on the
/// next run.
pub struct Rewriter<G> {
    generator: G,
    cache: Option<JsonCache>,
    validation: Validation,
    policy: RetryPolicy,
}

impl<G: TextGenerator> Rewriter<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            cache: None,
            validation: Validation::default(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_cache(mut self, cache: Option<JsonCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn rewrite(&self, instruction: &str, input: &str) -> Result<Rewrite> {
        let backend = self.generator.name();
        let key = cache_key(&[backend.as_str(), instruction, input]);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get::<CachedResponse>(&key).await? {
                log::debug!("Cache hit {key}");
                return Ok(Rewrite {
                    output: hit.output,
                    cached: true,
                });
            }
        }

        let prompt = build_prompt(instruction, input);
        let raw = with_retry(&self.policy, is_transient, || self.generator.generate(&prompt)).await?;

        let output = validate_response(input, &raw, &self.validation)
            .map_err(|e| Error::Validation(e.to_string()))?;

        if let Some(cache) = &self.cache {
            cache
                .put(&key, &CachedResponse { output: output.clone() })
                .await?;
        }

        Ok(Rewrite {
            output,
            cached: false,
        })
    }
}
