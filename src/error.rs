//! Error types for the studyquiz library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`StudyError`] - **Fatal**: the request cannot produce a study pack
//!   (nothing uploaded, unsupported file, every file unreadable, the model
//!   never answered). Returned as `Err(StudyError)` from
//!   [`crate::process::StudyPipeline::process`].
//!
//! * [`FileError`] - **Non-fatal**: one uploaded file could not be read but
//!   the others may be fine. Stored inside
//!   [`crate::output::ExtractionOutcome::Failed`] and reported by the
//!   aggregator; it only becomes fatal when *no* file yields text.
//!
//! Malformed model output is neither: the normalizer recovers from it
//! locally and never reports an error.

use thiserror::Error;

/// All fatal errors returned by the studyquiz pipeline.
///
/// Per-file failures use [`FileError`] and are collected by the aggregator
/// rather than propagated here.
#[derive(Debug, Error)]
pub enum StudyError {
    // ── Input rejection ───────────────────────────────────────────────────
    /// The request carried no files at all.
    #[error("No files provided")]
    NoFilesProvided,

    /// Files were present but none of them had a name.
    #[error("No files selected")]
    NoFilesSelected,

    /// A file's declared extension is not in the allowed set.
    #[error("Unsupported file type '.{extension}' for '{name}' (allowed: {allowed})")]
    UnsupportedFileType {
        name: String,
        extension: String,
        allowed: String,
    },

    /// The combined upload exceeds the configured size guard.
    #[error("Upload of {size} bytes exceeds the {limit}-byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    // ── Extraction ────────────────────────────────────────────────────────
    /// Every file failed or was empty; there is nothing to send to the model.
    #[error("{}", no_text_message(.errors))]
    NoExtractableText { errors: Vec<String> },

    // ── Model ─────────────────────────────────────────────────────────────
    /// The model collaborator returned nothing for the explanation prompt.
    #[error("Failed to generate explanation: the language model returned no response")]
    ExplanationFailed,

    /// The model collaborator returned nothing for the quiz prompt.
    #[error("Failed to generate quiz: the language model returned no response")]
    QuizFailed,

    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. the extraction task panicked).
    #[error("Error processing files: {0}")]
    Internal(String),
}

impl StudyError {
    /// HTTP-style status code for this failure.
    ///
    /// 400 for input the caller can fix, 413 for the upload-size guard and
    /// 500 for everything that went wrong on our side or the model's.
    pub fn status_code(&self) -> u16 {
        match self {
            StudyError::NoFilesProvided
            | StudyError::NoFilesSelected
            | StudyError::UnsupportedFileType { .. }
            | StudyError::NoExtractableText { .. } => 400,
            StudyError::PayloadTooLarge { .. } => 413,
            StudyError::ExplanationFailed
            | StudyError::QuizFailed
            | StudyError::ProviderNotConfigured { .. }
            | StudyError::InvalidConfig(_)
            | StudyError::Internal(_) => 500,
        }
    }

    /// `true` when the request was rejected before any extraction ran.
    pub fn is_input_rejection(&self) -> bool {
        matches!(
            self,
            StudyError::NoFilesProvided
                | StudyError::NoFilesSelected
                | StudyError::UnsupportedFileType { .. }
                | StudyError::PayloadTooLarge { .. }
        )
    }
}

fn no_text_message(errors: &[String]) -> String {
    if errors.is_empty() {
        "Could not extract text from files.".to_string()
    } else {
        format!("Could not extract text from files. {}", errors.join("; "))
    }
}

/// A non-fatal error for a single uploaded file.
///
/// Stored in [`crate::output::ExtractionOutcome::Failed`]. The request
/// continues unless every file fails.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The file bytes could not be read at all.
    #[error("could not read file: {detail}")]
    Unreadable { detail: String },

    /// The page-document is structurally broken or encrypted.
    #[error("could not open PDF: {detail}")]
    Corrupt { detail: String },

    /// The declared extension is not in the allowed set; never extracted.
    #[error("unsupported file type")]
    UnsupportedType { extension: String },
}
