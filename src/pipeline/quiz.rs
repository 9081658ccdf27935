//! Quiz validation: keep only well-formed questions, never return none.
//!
//! A candidate is accepted when it is a JSON object whose `question` and
//! `correctAnswer` are non-blank strings and whose `options` is an array of
//! exactly [`OPTIONS_PER_QUESTION`] non-blank strings. Everything else is
//! dropped with a log line. If nothing survives, the same fixed question is
//! returned whatever the cause, so callers never branch on why.

use crate::output::QuizQuestion;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Options every accepted question must carry.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// The question substituted when no candidate is valid.
pub fn fallback_question() -> QuizQuestion {
    QuizQuestion {
        question: "What is the main topic of the study material?".to_string(),
        options: vec![
            "A) A subject not covered in the material".to_string(),
            "B) The central subject of the uploaded material".to_string(),
            "C) An unrelated historical event".to_string(),
            "D) None of the above".to_string(),
        ],
        correct_answer: "B".to_string(),
    }
}

/// Filter candidates down to valid questions, substituting
/// [`fallback_question`] when none remain.
pub fn validate(candidates: Vec<Value>) -> Vec<QuizQuestion> {
    let total = candidates.len();
    let accepted: Vec<QuizQuestion> = candidates
        .iter()
        .enumerate()
        .filter_map(|(i, candidate)| match accept(candidate) {
            Ok(q) => Some(q),
            Err(reason) => {
                warn!("Dropping quiz candidate {}: {}", i + 1, reason);
                None
            }
        })
        .collect();

    if accepted.is_empty() {
        warn!("No valid quiz questions in {} candidate(s), using fallback", total);
        return vec![fallback_question()];
    }
    debug!("Accepted {}/{} quiz questions", accepted.len(), total);
    accepted
}

fn accept(candidate: &Value) -> Result<QuizQuestion, String> {
    let Value::Object(record) = candidate else {
        return Err(format!("expected an object, got {}", type_name(candidate)));
    };

    let question = required_text(record, "question")?;
    let correct_answer = required_text(record, "correctAnswer")?;

    let options = match record.get("options") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|o| non_blank(o).map(String::from))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| "options must all be non-empty strings".to_string())?,
        Some(other) => return Err(format!("options is {}, not an array", type_name(other))),
        None => return Err("missing options".to_string()),
    };
    if options.len() != OPTIONS_PER_QUESTION {
        return Err(format!(
            "expected {} options, got {}",
            OPTIONS_PER_QUESTION,
            options.len()
        ));
    }

    Ok(QuizQuestion {
        question,
        options,
        correct_answer,
    })
}

fn required_text(record: &Map<String, Value>, field: &str) -> Result<String, String> {
    record
        .get(field)
        .and_then(non_blank)
        .map(String::from)
        .ok_or_else(|| format!("missing or empty {field}"))
}

fn non_blank(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
