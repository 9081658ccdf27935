//! Aggregation: combine per-file text into one bounded corpus.
//!
//! Files are concatenated in upload order, each behind a
//! `--- Content from <name> ---` header. The global ceiling is applied once,
//! after assembly, so it bounds the whole multi-file concatenation rather
//! than each file.

use crate::error::StudyError;
use crate::output::{CombinedCorpus, ExtractionOutcome, ExtractionResult};
use tracing::{debug, info};

/// Appended once when the corpus exceeds its ceiling.
pub const CORPUS_TRUNCATION_MARKER: &str = "...\n[Content truncated]";

/// Reason recorded for a file that was readable but held no text.
pub const NO_TEXT_REASON: &str = "could not extract text";

/// A successful aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub corpus: CombinedCorpus,
    /// `"<name>: <reason>"` for every file that contributed nothing.
    pub errors: Vec<String>,
}

/// Combine extraction results into a corpus of at most `max_chars`
/// characters (plus the truncation marker).
///
/// Fails with [`StudyError::NoExtractableText`] when no file contributed
/// non-blank text; the error lists every per-file reason.
pub fn aggregate(results: &[ExtractionResult], max_chars: usize) -> Result<Aggregation, StudyError> {
    let mut text = String::new();
    let mut sources = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match &result.outcome {
            ExtractionOutcome::Text(body) if !body.trim().is_empty() => {
                text.push_str(&section_header(&result.source));
                text.push_str(body);
                sources.push(result.source.clone());
            }
            ExtractionOutcome::Failed(e) => errors.push(format!("{}: {}", result.source, e)),
            _ => errors.push(format!("{}: {}", result.source, NO_TEXT_REASON)),
        }
    }

    if text.trim().is_empty() {
        return Err(StudyError::NoExtractableText { errors });
    }

    let truncated = truncate_chars(&mut text, max_chars);
    if truncated {
        text.push_str(CORPUS_TRUNCATION_MARKER);
        info!("Corpus truncated to {} characters", max_chars);
    }
    debug!(
        "Corpus: {} files, {} chars, {} skipped",
        sources.len(),
        text.chars().count(),
        errors.len()
    );

    Ok(Aggregation {
        corpus: CombinedCorpus {
            text,
            sources,
            truncated,
        },
        errors,
    })
}

/// Labelled separator placed before each file's text.
pub fn section_header(name: &str) -> String {
    format!("\n\n--- Content from {name} ---\n\n")
}

/// Cut `s` to at most `max` characters. Returns `true` if anything was cut.
pub(crate) fn truncate_chars(s: &mut String, max: usize) -> bool {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => {
            s.truncate(byte_idx);
            true
        }
        None => false,
    }
}
