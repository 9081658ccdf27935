//! CLI binary for studyquiz.
//!
//! A thin shim over the library crate that maps CLI flags to `StudyConfig`,
//! loads the given files as uploads and prints the JSON response.

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use studyquiz::{StudyConfig, StudyPipeline, StudyResponse, UploadedFile};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Explanation + quiz for one file
  studyquiz notes.txt

  # Several files, pretty JSON
  studyquiz --pretty chapter1.pdf chapter2.pdf notes.txt

  # Use a specific model
  studyquiz --provider openai --model gpt-4o notes.pdf

  # Show what would be sent to the model (no API key needed)
  studyquiz --extract-only lecture.pdf

OUTPUT:
  Success: {"success": true, "explanation": [...], "quiz": [...], "files_processed": [...]}
  Failure: {"error": "..."}   (exit code 1)

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
"#;

/// Turn study documents into an explanation and a quiz using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "studyquiz",
    version,
    about = "Turn study documents (.txt, .pdf) into an explanation and a quiz using an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Text or PDF files to study.
    files: Vec<PathBuf>,

    /// LLM model ID (default: gpt-4o-mini).
    #[arg(long, env = "STUDYQUIZ_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "STUDYQUIZ_PROVIDER")]
    provider: Option<String>,

    /// Max LLM output tokens per call.
    #[arg(long, env = "STUDYQUIZ_MAX_TOKENS", default_value_t = 2000)]
    max_tokens: usize,

    /// LLM temperature (0.0 to 2.0).
    #[arg(long, env = "STUDYQUIZ_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "STUDYQUIZ_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Character ceiling for the combined corpus.
    #[arg(long, env = "STUDYQUIZ_MAX_CORPUS_CHARS", default_value_t = 8000)]
    max_corpus_chars: usize,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "STUDYQUIZ_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Only extract and aggregate; print the corpus instead of calling the model.
    #[arg(long)]
    extract_only: bool,

    /// Pretty-print the JSON response.
    #[arg(long)]
    pretty: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "STUDYQUIZ_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "STUDYQUIZ_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    let mut uploads = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let upload = UploadedFile::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        uploads.push(upload);
    }

    if cli.extract_only {
        return run_extract_only(config, uploads).await;
    }

    let pipeline = StudyPipeline::from_config(config).context("Failed to set up LLM provider")?;
    let result = pipeline.process(uploads).await;
    if let Ok(pack) = &result {
        for e in &pack.file_errors {
            tracing::warn!("Skipped {}", e);
        }
    }

    let (status, body) = StudyResponse::from_result(&result);
    print_json(&body, cli.pretty)?;
    Ok(if status == 200 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Map CLI flags onto the library config.
fn build_config(cli: &Cli) -> Result<StudyConfig> {
    let mut builder = StudyConfig::builder()
        .max_output_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .api_timeout_secs(cli.api_timeout)
        .max_corpus_chars(cli.max_corpus_chars);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read system prompt {}", path.display()))?;
        builder = builder.system_prompt(prompt);
    }

    Ok(builder.build()?)
}

/// Print the corpus and per-file errors without calling the model.
async fn run_extract_only(config: StudyConfig, uploads: Vec<UploadedFile>) -> Result<ExitCode> {
    // No provider is resolved here, so no API key is needed.
    let pipeline = StudyPipeline::new(config, NoModel);
    match pipeline.prepare(uploads).await {
        Ok((_, aggregation)) => {
            for e in &aggregation.errors {
                eprintln!("skipped: {e}");
            }
            eprintln!(
                "files: {}  chars: {}  truncated: {}",
                aggregation.corpus.sources.join(", "),
                aggregation.corpus.text.chars().count(),
                aggregation.corpus.truncated
            );
            println!("{}", aggregation.corpus.text.trim_start());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            print_json(&StudyResponse::Failure { error: e.to_string() }, false)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_json(body: &StudyResponse, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(body)?
    } else {
        serde_json::to_string(body)?
    };
    println!("{json}");
    Ok(())
}

/// Model stand-in for `--extract-only`; never called.
struct NoModel;

impl studyquiz::CompletionModel for NoModel {
    async fn complete(&self, _prompt: &str, _max_output_tokens: usize) -> Option<String> {
        None
    }
}
