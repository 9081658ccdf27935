//! Pipeline stages for document-to-study-pack processing.
//!
//! Each submodule implements one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ aggregate ──▶ llm ──▶ normalize ──▶ quiz
//! (uploads)  (text/pdf)   (corpus)    (model)  (decode)     (validate)
//! ```
//!
//! 1. [`input`]     - validate the upload batch and pick an extractor per file
//! 2. [`extract`]   - recover bounded text; runs in `spawn_blocking` because
//!    pdfium is blocking and CPU-bound
//! 3. [`aggregate`] - concatenate labelled per-file text and apply the global
//!    ceiling once
//! 4. [`llm`]       - one model call per prompt; the only stage with network I/O
//! 5. [`normalize`] - strip fences and decode, with total fallbacks
//! 6. [`quiz`]      - keep well-formed questions, never return an empty quiz

pub mod aggregate;
pub mod extract;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod quiz;
