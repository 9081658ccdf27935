//! Integration tests for the full upload → study pack pipeline.
//!
//! The language model is replaced by [`ScriptedModel`], which replays a
//! fixed list of answers and records every prompt it receives, so these
//! tests run offline and without pdfium.
//!
//! Run with:
//!   cargo test --test pipeline -- --nocapture

use std::collections::VecDeque;
use std::sync::Mutex;
use studyquiz::{
    CompletionModel, StudyConfig, StudyError, StudyPipeline, StudyResponse, UploadedFile,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Replays scripted answers in order; `None` entries simulate a failed call.
struct ScriptedModel {
    answers: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(answers: &[Option<&str>]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.map(str::to_string)).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl CompletionModel for ScriptedModel {
    async fn complete(&self, prompt: &str, _max_output_tokens: usize) -> Option<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answers.lock().unwrap().pop_front().flatten()
    }
}

const EXPLANATION: &str = r#"{"topic": "Photosynthesis", "content": ["Plants turn light into sugar.", "Chlorophyll absorbs light."]}"#;

const QUIZ: &str = r#"[
  {"question": "What do plants convert?", "options": ["A) Sound", "B) Light", "C) Heat", "D) Rock"], "correctAnswer": "B"},
  {"question": "Which pigment absorbs light?", "options": ["A) Chlorophyll", "B) Keratin", "C) Melanin", "D) Hemoglobin"], "correctAnswer": "A"}
]"#;

fn pipeline(answers: &[Option<&str>]) -> StudyPipeline<ScriptedModel> {
    StudyPipeline::new(StudyConfig::default(), ScriptedModel::new(answers))
}

fn txt(name: &str, body: &str) -> UploadedFile {
    UploadedFile::new(name, body.as_bytes().to_vec())
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_text_file_yields_full_pack() {
    let p = pipeline(&[Some(EXPLANATION), Some(QUIZ)]);
    let pack = p
        .process(vec![txt("notes.txt", "Photosynthesis converts light.")])
        .await
        .unwrap();

    assert_eq!(pack.explanation.topic, "Photosynthesis");
    assert_eq!(pack.explanation.content.len(), 2);
    assert_eq!(pack.quiz.len(), 2);
    assert_eq!(pack.quiz[1].correct_answer, "A");
    assert_eq!(pack.files_processed, vec!["notes.txt".to_string()]);
    assert!(pack.file_errors.is_empty());
    assert!(!pack.corpus_truncated);

    let prompts = p.model_prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("--- Content from notes.txt ---"));
    assert!(prompts[0].contains("Photosynthesis converts light."));
    assert!(prompts[1].contains("Photosynthesis converts light."));
}

#[tokio::test]
async fn empty_file_is_reported_but_not_fatal() {
    let p = pipeline(&[Some(EXPLANATION), Some(QUIZ)]);
    let pack = p
        .process(vec![
            txt("notes.txt", "Cells divide by mitosis."),
            txt("extra.txt", "   \n"),
        ])
        .await
        .unwrap();

    assert_eq!(pack.files_processed, vec!["notes.txt".to_string()]);
    assert_eq!(pack.file_errors, vec!["extra.txt: could not extract text".to_string()]);
    assert!(!p.model_prompts()[0].contains("extra.txt"));
}

#[tokio::test]
async fn files_appear_in_upload_order() {
    let p = pipeline(&[Some(EXPLANATION), Some(QUIZ)]);
    let pack = p
        .process(vec![txt("b.txt", "second body"), txt("a.txt", "first body")])
        .await
        .unwrap();

    assert_eq!(pack.files_processed, vec!["b.txt".to_string(), "a.txt".to_string()]);
    let prompt = &p.model_prompts()[0];
    let b = prompt.find("--- Content from b.txt ---").unwrap();
    let a = prompt.find("--- Content from a.txt ---").unwrap();
    assert!(b < a);
}

#[tokio::test]
async fn fenced_model_output_is_unwrapped() {
    let explanation = format!("```json\n{EXPLANATION}\n```");
    let quiz = format!("```\n{QUIZ}\n```");
    let p = pipeline(&[Some(&explanation), Some(&quiz)]);
    let pack = p.process(vec![txt("notes.txt", "light")]).await.unwrap();

    assert_eq!(pack.explanation.topic, "Photosynthesis");
    assert_eq!(pack.quiz.len(), 2);
}

// ── Model output recovery ───────────────────────────────────────────────────

#[tokio::test]
async fn prose_explanation_falls_back_to_paragraphs() {
    let prose = "Plants make food.\n\nThey use sunlight.";
    let p = pipeline(&[Some(prose), Some(QUIZ)]);
    let pack = p.process(vec![txt("notes.txt", "light")]).await.unwrap();

    assert_eq!(pack.explanation.topic, "Study Material Analysis");
    assert_eq!(
        pack.explanation.content,
        vec!["Plants make food.".to_string(), "They use sunlight.".to_string()]
    );
}

#[tokio::test]
async fn malformed_quiz_yields_fallback_question() {
    let p = pipeline(&[Some(EXPLANATION), Some("Sorry, I cannot make a quiz.")]);
    let pack = p.process(vec![txt("notes.txt", "light")]).await.unwrap();

    assert_eq!(pack.quiz.len(), 1);
    assert_eq!(pack.quiz[0].question, "What is the main topic of the study material?");
    assert_eq!(pack.quiz[0].options.len(), 4);
    assert_eq!(pack.quiz[0].correct_answer, "B");
}

#[tokio::test]
async fn invalid_questions_are_dropped() {
    let quiz = r#"[
      {"question": "Good?", "options": ["A) 1", "B) 2", "C) 3", "D) 4"], "correctAnswer": "C"},
      {"question": "Three options?", "options": ["A) 1", "B) 2", "C) 3"], "correctAnswer": "A"},
      {"question": "", "options": ["A) 1", "B) 2", "C) 3", "D) 4"], "correctAnswer": "A"}
    ]"#;
    let p = pipeline(&[Some(EXPLANATION), Some(quiz)]);
    let pack = p.process(vec![txt("notes.txt", "light")]).await.unwrap();

    assert_eq!(pack.quiz.len(), 1);
    assert_eq!(pack.quiz[0].question, "Good?");
}

// ── Fatal failures ───────────────────────────────────────────────────────────

#[tokio::test]
async fn zero_files_never_reach_the_model() {
    let p = pipeline(&[Some(EXPLANATION), Some(QUIZ)]);
    let err = p.process(Vec::new()).await.unwrap_err();

    assert!(matches!(err, StudyError::NoFilesProvided));
    assert_eq!(err.to_string(), "No files provided");
    assert!(p.model_prompts().is_empty());
}

#[tokio::test]
async fn unsupported_file_is_skipped_next_to_valid_ones() {
    let p = pipeline(&[Some(EXPLANATION), Some(QUIZ)]);
    let pack = p
        .process(vec![txt("notes.txt", "real notes"), txt("slides.docx", "PK")])
        .await
        .unwrap();

    assert_eq!(pack.files_processed, vec!["notes.txt".to_string()]);
    assert_eq!(pack.file_errors, vec!["slides.docx: unsupported file type".to_string()]);
    let prompt = &p.model_prompts()[0];
    assert!(!prompt.contains("slides.docx"));
    assert!(!prompt.contains("PK"));
}

#[tokio::test]
async fn only_unsupported_files_are_rejected_before_extraction() {
    let p = pipeline(&[Some(EXPLANATION), Some(QUIZ)]);
    let err = p
        .process(vec![txt("slides.docx", "PK"), txt("sheet.xlsx", "PK")])
        .await
        .unwrap_err();

    assert!(matches!(err, StudyError::UnsupportedFileType { .. }));
    assert_eq!(err.status_code(), 400);
    assert!(p.model_prompts().is_empty());
}

#[tokio::test]
async fn all_files_empty_lists_every_reason() {
    let p = pipeline(&[Some(EXPLANATION), Some(QUIZ)]);
    let err = p
        .process(vec![txt("a.txt", ""), txt("b.txt", " \t")])
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.starts_with("Could not extract text from files."));
    assert!(msg.contains("a.txt: could not extract text"));
    assert!(msg.contains("b.txt: could not extract text"));
    assert_eq!(err.status_code(), 400);
    assert!(p.model_prompts().is_empty());
}

#[tokio::test]
async fn missing_explanation_aborts_request() {
    let p = pipeline(&[None, Some(QUIZ)]);
    let err = p.process(vec![txt("notes.txt", "light")]).await.unwrap_err();

    assert!(matches!(err, StudyError::ExplanationFailed));
    assert_eq!(err.status_code(), 500);
    // The quiz prompt is never sent.
    assert_eq!(p.model_prompts().len(), 1);
}

#[tokio::test]
async fn missing_quiz_aborts_request() {
    let p = pipeline(&[Some(EXPLANATION), None]);
    let err = p.process(vec![txt("notes.txt", "light")]).await.unwrap_err();

    assert!(matches!(err, StudyError::QuizFailed));
    assert_eq!(p.model_prompts().len(), 2);
}

// ── Bounds ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn long_input_is_truncated_to_corpus_ceiling() {
    let p = pipeline(&[Some(EXPLANATION), Some(QUIZ)]);
    let body = "x".repeat(10_000);
    let pack = p.process(vec![txt("long.txt", &body)]).await.unwrap();
    assert!(pack.corpus_truncated);

    let (_, aggregation) = pipeline(&[])
        .prepare(vec![txt("long.txt", &body)])
        .await
        .unwrap();
    let text = &aggregation.corpus.text;
    assert!(text.ends_with("...\n[Content truncated]"));
    let marker_len = "...\n[Content truncated]".chars().count();
    assert_eq!(text.chars().count(), 8_000 + marker_len);
}

#[tokio::test]
async fn invalid_utf8_is_dropped_not_fatal() {
    let p = pipeline(&[Some(EXPLANATION), Some(QUIZ)]);
    let bytes = [b"caf".as_slice(), &[0xFF, 0xFE], b"e au lait".as_slice()].concat();
    let (_, aggregation) = p
        .prepare(vec![UploadedFile::new("menu.txt", bytes)])
        .await
        .unwrap();

    assert!(aggregation.corpus.text.contains("cafe au lait"));
}

#[tokio::test]
async fn non_pdf_bytes_with_pdf_extension_are_per_file_errors() {
    let p = pipeline(&[Some(EXPLANATION), Some(QUIZ)]);
    let pack = p
        .process(vec![
            UploadedFile::new("fake.pdf", b"just some text".to_vec()),
            txt("notes.txt", "real content"),
        ])
        .await
        .unwrap();

    assert_eq!(pack.files_processed, vec!["notes.txt".to_string()]);
    assert_eq!(pack.file_errors.len(), 1);
    assert!(pack.file_errors[0].starts_with("fake.pdf: could not open PDF"));
}

// ── Response shaping ─────────────────────────────────────────────────────────

#[tokio::test]
async fn respond_wraps_explanation_in_a_list() {
    let p = pipeline(&[Some(EXPLANATION), Some(QUIZ)]);
    let (status, body) = p.respond(vec![txt("notes.txt", "light")]).await;
    assert_eq!(status, 200);

    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["explanation"][0]["topic"], "Photosynthesis");
    assert_eq!(json["quiz"][0]["correctAnswer"], "B");
    assert_eq!(json["files_processed"][0], "notes.txt");
}

#[tokio::test]
async fn respond_maps_failures_to_error_body() {
    let p = pipeline(&[]);
    let (status, body) = p.respond(Vec::new()).await;
    assert_eq!(status, 400);
    assert_eq!(
        body,
        StudyResponse::Failure {
            error: "No files provided".into()
        }
    );

    let p = pipeline(&[None]);
    let (status, _) = p.respond(vec![txt("notes.txt", "light")]).await;
    assert_eq!(status, 500);
}

// ── Local files ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn uploads_can_be_loaded_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Lecture.TXT");
    std::fs::write(&path, "Newton's laws of motion.").unwrap();

    let upload = UploadedFile::from_path(&path).await.unwrap();
    assert_eq!(upload.name, "Lecture.TXT");
    assert_eq!(upload.extension, "txt");

    let p = pipeline(&[Some(EXPLANATION), Some(QUIZ)]);
    let pack = p.process(vec![upload]).await.unwrap();
    assert_eq!(pack.files_processed, vec!["Lecture.TXT".to_string()]);
}

#[tokio::test]
async fn missing_file_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let err = UploadedFile::from_path(dir.path().join("nope.txt"))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("could not read file"));
}

// `StudyPipeline` owns its model; reach it through a small extension trait so
// the tests above read naturally.
trait ModelPrompts {
    fn model_prompts(&self) -> Vec<String>;
}

impl ModelPrompts for StudyPipeline<ScriptedModel> {
    fn model_prompts(&self) -> Vec<String> {
        self.model().prompts()
    }
}
