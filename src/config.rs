//! Configuration types for document-to-study-pack processing.
//!
//! Every ceiling the pipeline enforces (per-file bytes, pages, characters,
//! corpus size, upload size) and every generation knob lives in one
//! [`StudyConfig`] that is handed to [`crate::process::StudyPipeline`] at
//! construction. Tests build configs with tiny ceilings to exercise the
//! truncation paths without multi-megabyte fixtures.

use crate::error::StudyError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for one study-pack pipeline.
///
/// Built via [`StudyConfig::builder()`] or using [`StudyConfig::default()`].
///
/// # Example
/// ```rust
/// use studyquiz::StudyConfig;
///
/// let config = StudyConfig::builder()
///     .max_corpus_chars(4000)
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_corpus_chars, 4000);
/// ```
#[derive(Clone)]
pub struct StudyConfig {
    /// Accepted declared extensions, lower-case, without the dot.
    /// Default: `["pdf", "txt"]`.
    pub allowed_extensions: Vec<String>,

    /// Plain-text files are cut to this many bytes before decoding.
    /// Default: 5 MiB.
    pub max_text_file_bytes: usize,

    /// Page-documents are read up to this many pages. Default: 100.
    pub max_pdf_pages: usize,

    /// Characters accumulated per page-document before truncation.
    /// Default: 50 000.
    pub max_pdf_chars: usize,

    /// Ceiling on the combined corpus sent to the model. Default: 8 000.
    ///
    /// Applied once, after every file has been concatenated.
    pub max_corpus_chars: usize,

    /// Total upload size guard in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// Maximum tokens the model may generate per call. Default: 2 000.
    pub max_output_tokens: usize,

    /// Sampling temperature for both prompts. Default: 0.7.
    pub temperature: f32,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Per-call model timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// PDFium shared library, or a directory holding it.
    /// If None, `PDFIUM_LIB_PATH` is consulted, then the system library.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["pdf".to_string(), "txt".to_string()],
            max_text_file_bytes: 5 * 1024 * 1024,
            max_pdf_pages: 100,
            max_pdf_chars: 50_000,
            max_corpus_chars: 8_000,
            max_upload_bytes: 50 * 1024 * 1024,
            max_output_tokens: 2_000,
            temperature: 0.7,
            model: None,
            provider_name: None,
            provider: None,
            system_prompt: None,
            api_timeout_secs: 60,
            pdfium_lib_path: None,
        }
    }
}

impl fmt::Debug for StudyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudyConfig")
            .field("allowed_extensions", &self.allowed_extensions)
            .field("max_text_file_bytes", &self.max_text_file_bytes)
            .field("max_pdf_pages", &self.max_pdf_pages)
            .field("max_pdf_chars", &self.max_pdf_chars)
            .field("max_corpus_chars", &self.max_corpus_chars)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("temperature", &self.temperature)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field(
                "system_prompt",
                &self.system_prompt.as_ref().map(|p| format!("<{} chars>", p.chars().count())),
            )
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl StudyConfig {
    /// Create a new builder for `StudyConfig`.
    pub fn builder() -> StudyConfigBuilder {
        StudyConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model identifier to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Map a declared extension onto the extractor that handles it.
    ///
    /// Returns `None` when the extension is not in `allowed_extensions`.
    pub fn file_kind(&self, extension: &str) -> Option<FileKind> {
        let ext = extension.to_ascii_lowercase();
        if !self.allowed_extensions.iter().any(|a| *a == ext) {
            return None;
        }
        FileKind::from_extension(&ext)
    }

    /// Comma-separated allowed extensions, for error messages.
    pub fn allowed_list(&self) -> String {
        self.allowed_extensions.join(", ")
    }
}

/// Builder for [`StudyConfig`].
#[derive(Debug)]
pub struct StudyConfigBuilder {
    config: StudyConfig,
}

impl StudyConfigBuilder {
    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_extensions = exts
            .into_iter()
            .map(|e| {
                let e: String = e.into();
                e.trim_start_matches('.').to_ascii_lowercase()
            })
            .collect();
        self
    }

    pub fn max_text_file_bytes(mut self, n: usize) -> Self {
        self.config.max_text_file_bytes = n;
        self
    }

    pub fn max_pdf_pages(mut self, n: usize) -> Self {
        self.config.max_pdf_pages = n;
        self
    }

    pub fn max_pdf_chars(mut self, n: usize) -> Self {
        self.config.max_pdf_chars = n;
        self
    }

    pub fn max_corpus_chars(mut self, n: usize) -> Self {
        self.config.max_corpus_chars = n;
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<StudyConfig, StudyError> {
        let c = &self.config;
        let ceilings = [
            ("max_text_file_bytes", c.max_text_file_bytes),
            ("max_pdf_pages", c.max_pdf_pages),
            ("max_pdf_chars", c.max_pdf_chars),
            ("max_corpus_chars", c.max_corpus_chars),
            ("max_upload_bytes", c.max_upload_bytes),
            ("max_output_tokens", c.max_output_tokens),
        ];
        if let Some((name, _)) = ceilings.iter().find(|(_, v)| *v == 0) {
            return Err(StudyError::InvalidConfig(format!("{name} must be ≥ 1")));
        }
        if c.allowed_extensions.is_empty() {
            return Err(StudyError::InvalidConfig(
                "at least one allowed extension is required".into(),
            ));
        }
        if let Some(unknown) = c
            .allowed_extensions
            .iter()
            .find(|e| FileKind::from_extension(e).is_none())
        {
            return Err(StudyError::InvalidConfig(format!(
                "no extractor for extension '{unknown}' (supported: pdf, txt)"
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(StudyError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which extractor handles a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    /// UTF-8 plain text (`.txt`).
    Text,
    /// Paginated document read page by page (`.pdf`).
    PageDocument,
}

impl FileKind {
    /// Extension → kind, independent of what a config allows.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "txt" => Some(FileKind::Text),
            "pdf" => Some(FileKind::PageDocument),
            _ => None,
        }
    }
}
