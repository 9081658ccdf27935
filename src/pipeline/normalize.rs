//! Response normalisation: turn free-form model text into structured values.
//!
//! Models are asked for bare JSON but routinely wrap it in a ```` ```json ````
//! fence. Each response is therefore cleaned (trim, strip an outer fence)
//! and then decoded in two stages:
//!
//! 1. strict decode into the expected shape;
//! 2. on failure, a total fallback constructor builds a usable value.
//!
//! Nothing here returns an error. Malformed output is a normal branch.

use crate::output::{ExplanationDocument, QuizQuestion};
use crate::pipeline::quiz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// Topic used when the explanation could not be decoded.
pub const FALLBACK_TOPIC: &str = "Study Material Analysis";

/// Sole paragraph used when there is no text to fall back on.
pub const FALLBACK_PARAGRAPH: &str = "Unable to generate explanation.";

/// Paragraphs kept from raw text when falling back.
const FALLBACK_PARAGRAPHS: usize = 5;

// ── Fence stripping ──────────────────────────────────────────────────────────

static RE_OPEN_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_+.-]*[ \t]*\r?\n?").unwrap());

static RE_CLOSE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?```\s*$").unwrap());

static RE_BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n[ \t]*\r?\n").unwrap());

/// Trim `raw` and, if it opens with a code fence (with or without a
/// language tag), remove the opening and closing fence markers.
pub fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let without_open = RE_OPEN_FENCE.replace(trimmed, "");
    RE_CLOSE_FENCE.replace(&without_open, "").trim().to_string()
}

// ── Explanation ──────────────────────────────────────────────────────────────

/// Decode an explanation, falling back to paragraphs of the raw text.
///
/// A decoded document with an empty `content` gets the fallback paragraph
/// so callers can always render at least one.
pub fn normalize_explanation(raw: &str) -> ExplanationDocument {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<ExplanationDocument>(&cleaned) {
        Ok(mut doc) => {
            if doc.content.is_empty() {
                doc.content.push(FALLBACK_PARAGRAPH.to_string());
            }
            doc
        }
        Err(e) => {
            debug!("Explanation is not the expected JSON ({}), using text fallback", e);
            fallback_explanation(&cleaned)
        }
    }
}

/// Build an explanation from up to five blank-line-separated blocks.
pub fn fallback_explanation(text: &str) -> ExplanationDocument {
    let mut content: Vec<String> = RE_BLANK_LINE
        .split(text)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .take(FALLBACK_PARAGRAPHS)
        .map(String::from)
        .collect();
    if content.is_empty() {
        content.push(FALLBACK_PARAGRAPH.to_string());
    }
    ExplanationDocument {
        topic: FALLBACK_TOPIC.to_string(),
        content,
    }
}

// ── Quiz ─────────────────────────────────────────────────────────────────────

/// Decode quiz candidates and hand them to the validator.
///
/// A single JSON object is treated as a one-element array; unparseable
/// text yields no candidates, so the validator substitutes its fallback.
pub fn normalize_quiz(raw: &str) -> Vec<QuizQuestion> {
    let cleaned = strip_code_fences(raw);
    let candidates = match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Array(items)) => items,
        Ok(other) => vec![other],
        Err(e) => {
            warn!("Quiz response is not valid JSON ({})", e);
            Vec::new()
        }
    };
    quiz::validate(candidates)
}
