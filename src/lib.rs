//! # studyquiz
//!
//! Turn uploaded study documents (plain text or PDF) into a structured
//! explanation and a multiple-choice quiz using a language model.
//!
//! ## Why this crate?
//!
//! The hard part of "upload notes, get a quiz" is not the prompt. It is the
//! two untrusted edges: binary documents that may be huge, malformed or
//! image-only, and a model that answers in free-form text that is *usually*
//! JSON. This crate bounds the first and normalises the second, so a
//! request always ends in either a schema-valid study pack or one clear
//! error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! uploads
//!  │
//!  ├─ 1. Input      validate batch (no files, unnamed, size guard, extension)
//!  ├─ 2. Extract    text: cap + lossy decode · pdf: per-page via pdfium
//!  ├─ 3. Aggregate  labelled concatenation, one global ceiling
//!  ├─ 4. Model      explanation prompt, then quiz prompt (one attempt each)
//!  ├─ 5. Normalize  strip fences, strict decode, total fallback
//!  └─ 6. Validate   keep well-formed questions, never an empty quiz
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use studyquiz::{StudyConfig, StudyPipeline, UploadedFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let pipeline = StudyPipeline::from_config(StudyConfig::default())?;
//!     let notes = UploadedFile::from_path("notes.txt").await?;
//!     let pack = pipeline.process(vec![notes]).await?;
//!     println!("{}", pack.explanation.topic);
//!     for q in &pack.quiz {
//!         println!("{} ({})", q.question, q.correct_answer);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `studyquiz` binary (clap + anyhow + tracing-subscriber) |
//!
//! ## PDF support
//!
//! PDF text is read through the PDFium shared library, loaded at run time
//! from `PDFIUM_LIB_PATH` or the system library path. Without it, PDFs
//! produce a placeholder text instead of failing the request.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{FileKind, StudyConfig, StudyConfigBuilder};
pub use error::{FileError, StudyError};
pub use output::{
    CombinedCorpus, ExplanationDocument, ExtractionOutcome, ExtractionResult, QuizQuestion,
    StudyPack, StudyResponse,
};
pub use pipeline::input::UploadedFile;
pub use pipeline::llm::{CompletionModel, ProviderModel};
pub use process::{process_sync, resolve_provider, StudyPipeline};
