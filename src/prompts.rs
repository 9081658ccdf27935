//! Prompts for explanation and quiz generation.
//!
//! The corpus is substituted verbatim. It sits in its own block above the
//! JSON instructions, so no escaping is applied.
//!
//! Callers can override the system prompt via
//! [`crate::config::StudyConfig::system_prompt`].

/// Default system message sent ahead of every prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an educational AI assistant. Always respond with valid JSON when requested.";

/// Render the explanation prompt for a corpus.
pub fn explanation_prompt(corpus: &str) -> String {
    format!(
        r#"You are an educational AI assistant. Analyze the following study material and create a comprehensive explanation.

Study Material:
{corpus}

Return a JSON object with a short "topic" title and a "content" array of 3 to 5 explanatory paragraphs:
{{
  "topic": "Title",
  "content": [
    "Paragraph 1",
    "Paragraph 2",
    "Paragraph 3"
  ]
}}

Return only JSON, no additional text."#
    )
}

/// Render the quiz prompt for a corpus.
pub fn quiz_prompt(corpus: &str) -> String {
    format!(
        r#"Create 3-5 multiple-choice questions from this material.

Study Material:
{corpus}

Return a JSON array. Each question has exactly 4 options prefixed "A) " to "D) " and a "correctAnswer" that is one of "A", "B", "C" or "D":
[
  {{
    "question": "text",
    "options": ["A) ...", "B) ...", "C) ...", "D) ..."],
    "correctAnswer": "B"
  }}
]

Return only JSON, no additional text."#
    )
}
