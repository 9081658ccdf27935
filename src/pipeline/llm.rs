//! Model interaction: send a prompt, get free-form text or nothing.
//!
//! The pipeline only ever needs one capability from a language model:
//! `prompt in → text out, or absent`. [`CompletionModel`] captures exactly
//! that, so the orchestrator never sees transport errors, status codes or
//! token accounting. [`ProviderModel`] implements it over any
//! `edgequake-llm` provider.
//!
//! One attempt per prompt, no retries. The caller decides what an absent
//! answer means.

use crate::config::StudyConfig;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// A text-completion collaborator.
///
/// Returns `None` on any failure (transport, auth, rate limit, timeout);
/// the reason is the implementation's to log.
pub trait CompletionModel: Send + Sync {
    fn complete(
        &self,
        prompt: &str,
        max_output_tokens: usize,
    ) -> impl Future<Output = Option<String>> + Send;
}

/// [`CompletionModel`] backed by an `edgequake-llm` provider.
///
/// Each call sends a system message followed by the prompt as the single
/// user turn, bounded by `api_timeout_secs`.
#[derive(Clone)]
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    temperature: f32,
    timeout: Duration,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &StudyConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }
}

impl CompletionModel for ProviderModel {
    async fn complete(&self, prompt: &str, max_output_tokens: usize) -> Option<String> {
        if prompt.trim().is_empty() {
            warn!("Empty prompt, skipping model call");
            return None;
        }

        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(prompt),
        ];
        let options = build_options(self.temperature, max_output_tokens);
        let start = Instant::now();

        match timeout(self.timeout, self.provider.chat(&messages, Some(&options))).await {
            Ok(Ok(response)) => {
                debug!(
                    "Model call: {} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                Some(response.content)
            }
            Ok(Err(e)) => {
                warn!("Model call failed: {}", e);
                None
            }
            Err(_) => {
                warn!("Model call timed out after {}s", self.timeout.as_secs());
                None
            }
        }
    }
}

/// Build `CompletionOptions` for one call.
fn build_options(temperature: f32, max_output_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_output_tokens),
        ..Default::default()
    }
}
