//! Request orchestration: uploads in, study pack out.
//!
//! [`StudyPipeline::process`] runs the stages in a fixed order and stops at
//! the first fatal failure:
//!
//! ```text
//! validate ─▶ extract ─▶ aggregate ─▶ explanation call ─▶ quiz call ─▶ StudyPack
//!    │           │           │               │                │
//!    └── 400/413 └── 500     └── 400         └── 500          └── 500
//! ```
//!
//! The two model calls are sequential and either one failing fails the
//! whole request.

use crate::config::StudyConfig;
use crate::error::StudyError;
use crate::output::{ExtractionResult, StudyPack, StudyResponse};
use crate::pipeline::aggregate::{aggregate, Aggregation};
use crate::pipeline::input::{validate_uploads, UploadedFile};
use crate::pipeline::llm::{CompletionModel, ProviderModel};
use crate::pipeline::{extract, normalize};
use crate::prompts;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// One configured pipeline. Holds no per-request state, so a single
/// instance can serve any number of concurrent requests.
pub struct StudyPipeline<M> {
    config: StudyConfig,
    model: M,
}

impl<M: CompletionModel> StudyPipeline<M> {
    /// Build a pipeline around an explicit model collaborator.
    pub fn new(config: StudyConfig, model: M) -> Self {
        Self { config, model }
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run the full pipeline for one request.
    ///
    /// # Errors
    /// - input rejection: no files, no named files, oversized upload, no
    ///   file with an allowed extension (single unsupported files are
    ///   reported in [`StudyPack::file_errors`] instead)
    /// - [`StudyError::NoExtractableText`] when no file yields text
    /// - [`StudyError::ExplanationFailed`] / [`StudyError::QuizFailed`] when
    ///   the model returns nothing
    /// - [`StudyError::Internal`] if extraction panics
    ///
    /// Malformed model output is never an error; it is normalised.
    pub async fn process(&self, files: Vec<UploadedFile>) -> Result<StudyPack, StudyError> {
        let start = Instant::now();
        info!("Processing {} uploaded file(s)", files.len());

        // ── Step 1: Extract + aggregate ──────────────────────────────────
        let (_, aggregation) = self.prepare(files).await?;
        let corpus = &aggregation.corpus;

        // ── Step 2: Explanation ──────────────────────────────────────────
        let explanation_raw = self
            .model
            .complete(
                &prompts::explanation_prompt(&corpus.text),
                self.config.max_output_tokens,
            )
            .await
            .ok_or(StudyError::ExplanationFailed)?;
        let explanation = normalize::normalize_explanation(&explanation_raw);
        debug!("Explanation: '{}', {} paragraphs", explanation.topic, explanation.content.len());

        // ── Step 3: Quiz ─────────────────────────────────────────────────
        let quiz_raw = self
            .model
            .complete(&prompts::quiz_prompt(&corpus.text), self.config.max_output_tokens)
            .await
            .ok_or(StudyError::QuizFailed)?;
        let quiz = normalize::normalize_quiz(&quiz_raw);

        info!(
            "Study pack ready: {} files, {} questions, {}ms",
            corpus.sources.len(),
            quiz.len(),
            start.elapsed().as_millis()
        );

        Ok(StudyPack {
            explanation,
            quiz,
            files_processed: corpus.sources.clone(),
            file_errors: aggregation.errors.clone(),
            corpus_truncated: corpus.truncated,
        })
    }

    /// Run [`Self::process`] and shape the result into `(status, body)`.
    pub async fn respond(&self, files: Vec<UploadedFile>) -> (u16, StudyResponse) {
        StudyResponse::from_result(&self.process(files).await)
    }

    /// Validate, extract and aggregate without calling the model.
    ///
    /// Returns the per-file results alongside the aggregation.
    pub async fn prepare(
        &self,
        files: Vec<UploadedFile>,
    ) -> Result<(Vec<ExtractionResult>, Aggregation), StudyError> {
        let admissions = validate_uploads(files, &self.config)?;
        let results = extract::extract_all(admissions, &self.config).await?;
        let aggregation = aggregate(&results, self.config.max_corpus_chars)?;
        info!(
            "Corpus built from {} file(s), {} skipped{}",
            aggregation.corpus.sources.len(),
            aggregation.errors.len(),
            if aggregation.corpus.truncated { ", truncated" } else { "" }
        );
        Ok((results, aggregation))
    }
}

impl StudyPipeline<ProviderModel> {
    /// Build a pipeline whose model is resolved from `config` and the
    /// environment (see [`resolve_provider`]).
    pub fn from_config(config: StudyConfig) -> Result<Self, StudyError> {
        let provider = resolve_provider(&config)?;
        let model = ProviderModel::new(provider, &config);
        Ok(Self::new(config, model))
    }
}

/// Synchronous wrapper around [`StudyPipeline::process`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync<M: CompletionModel>(
    pipeline: &StudyPipeline<M>,
    files: Vec<UploadedFile>,
) -> Result<StudyPack, StudyError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| StudyError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(pipeline.process(files))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, StudyError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        StudyError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`). The embedding application
///    owns construction, e.g. a provider with its own rate limiting, or a
///    local model in tests. Used as-is.
///
/// 2. **Named provider** (`config.provider_name`, the CLI's `--provider`).
///    The factory reads that provider's API key from the environment and
///    pairs it with `config.model`, or [`crate::config::DEFAULT_MODEL`].
///
/// 3. **Environment choice** (`provider_from_env`). A deployment can
///    pin provider and model without touching the config, and a plain
///    `OPENAI_API_KEY` selects OpenAI even when other keys are present.
///
/// 4. **Auto-detection** via `ProviderFactory::from_env`, which takes the
///    first provider whose key it finds. Its failure is the only error a
///    caller with no configuration at all will see, so the hint lists the
///    variables to set.
pub fn resolve_provider(config: &StudyConfig) -> Result<Arc<dyn LLMProvider>, StudyError> {
    if let Some(provider) = &config.provider {
        return Ok(Arc::clone(provider));
    }
    if let Some(name) = &config.provider_name {
        return create_provider(name, config.model_or_default());
    }
    if let Some((name, model)) = provider_from_env(config) {
        return create_provider(&name, &model);
    }

    ProviderFactory::from_env()
        .map(|(llm, _embedding)| llm)
        .map_err(|e| StudyError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "Set OPENAI_API_KEY, ANTHROPIC_API_KEY or GEMINI_API_KEY, \
                 or pass --provider. ({e})"
            ),
        })
}

/// Provider and model chosen by environment variables alone.
///
/// `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` when both are non-empty,
/// otherwise `openai` with the configured model when `OPENAI_API_KEY` is.
fn provider_from_env(config: &StudyConfig) -> Option<(String, String)> {
    let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

    if let (Some(provider), Some(model)) = (
        non_empty("EDGEQUAKE_LLM_PROVIDER"),
        non_empty("EDGEQUAKE_MODEL"),
    ) {
        return Some((provider, model));
    }
    non_empty("OPENAI_API_KEY")
        .map(|_| ("openai".to_string(), config.model_or_default().to_string()))
}
