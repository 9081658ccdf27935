//! Output types produced by the pipeline stages.
//!
//! Every value here lives for exactly one request: nothing is cached,
//! shared between requests, or written to disk.

use crate::error::{FileError, StudyError};
use serde::{Deserialize, Serialize};

// ── Extraction ───────────────────────────────────────────────────────────

/// What the extractor recovered from one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionOutcome {
    /// Text was recovered (may carry truncation notes or a placeholder).
    Text(String),
    /// The file was well-formed but held no extractable text
    /// (e.g. an image-only PDF or an empty `.txt`).
    Empty,
    /// The file could not be parsed.
    Failed(FileError),
}

/// Per-file extraction result, in upload order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// File name as uploaded.
    pub source: String,
    pub outcome: ExtractionOutcome,
}

impl ExtractionResult {
    pub fn text(source: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let outcome = if text.trim().is_empty() {
            ExtractionOutcome::Empty
        } else {
            ExtractionOutcome::Text(text)
        };
        Self {
            source: source.into(),
            outcome,
        }
    }

    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            outcome: ExtractionOutcome::Empty,
        }
    }

    pub fn failed(source: impl Into<String>, error: FileError) -> Self {
        Self {
            source: source.into(),
            outcome: ExtractionOutcome::Failed(error),
        }
    }

    /// Recovered text, if any.
    pub fn recovered_text(&self) -> Option<&str> {
        match &self.outcome {
            ExtractionOutcome::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Structural error, if any. `Empty` is not an error.
    pub fn error(&self) -> Option<&FileError> {
        match &self.outcome {
            ExtractionOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// The bounded text handed to both prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedCorpus {
    /// Concatenated, labelled, possibly truncated text.
    pub text: String,
    /// Names of the files that contributed text, in upload order.
    pub sources: Vec<String>,
    /// `true` when the global ceiling cut the text.
    pub truncated: bool,
}

// ── Model output ─────────────────────────────────────────────────────────

/// Structured explanation of the study material.
///
/// `content` is never empty once the normalizer has produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationDocument {
    pub topic: String,
    pub content: Vec<String>,
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    pub correct_answer: String,
}

// ── Pipeline result ──────────────────────────────────────────────────────

/// Everything a successful request produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPack {
    pub explanation: ExplanationDocument,
    /// At least one question; the validator guarantees it.
    pub quiz: Vec<QuizQuestion>,
    /// Files that contributed text, in upload order.
    pub files_processed: Vec<String>,
    /// Human-readable `"<name>: <reason>"` entries for files that did not.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_errors: Vec<String>,
    /// `true` when the corpus hit the global ceiling.
    #[serde(default)]
    pub corpus_truncated: bool,
}

/// JSON body returned to the caller.
///
/// Success: `{"success": true, "explanation": [...], "quiz": [...], "files_processed": [...]}`.
/// Failure: `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StudyResponse {
    Success {
        success: bool,
        explanation: Vec<ExplanationDocument>,
        quiz: Vec<QuizQuestion>,
        files_processed: Vec<String>,
    },
    Failure {
        error: String,
    },
}

impl StudyResponse {
    /// Shape a pipeline result into `(status code, body)`.
    pub fn from_result(result: &Result<StudyPack, StudyError>) -> (u16, Self) {
        match result {
            Ok(pack) => (
                200,
                StudyResponse::Success {
                    success: true,
                    explanation: vec![pack.explanation.clone()],
                    quiz: pack.quiz.clone(),
                    files_processed: pack.files_processed.clone(),
                },
            ),
            Err(e) => (
                e.status_code(),
                StudyResponse::Failure {
                    error: e.to_string(),
                },
            ),
        }
    }
}
