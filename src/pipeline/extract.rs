//! Text extraction: recover bounded text from one uploaded file.
//!
//! Plain text is cut to `max_text_file_bytes` *before* decoding so a huge
//! upload never gets a huge `String`. Undecodable byte sequences are
//! dropped, not replaced.
//!
//! Page-documents go through pdfium. Pages are read in order up to
//! `max_pdf_pages`; a page that fails is logged and contributes nothing.
//! Accumulation stops at `max_pdf_chars` with a marker, and a note records
//! how many pages were read when the document is longer than the cap.
//!
//! The page loop is written against [`PageSource`] so the caps can be
//! exercised without the native library.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library behind a global lock and is CPU-bound;
//! [`extract_all`] runs the whole batch on Tokio's blocking pool so async
//! worker threads never stall on it.

use crate::config::{FileKind, StudyConfig};
use crate::error::{FileError, StudyError};
use crate::output::ExtractionResult;
use crate::pipeline::aggregate::truncate_chars;
use crate::pipeline::input::{Admission, UploadedFile};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Appended when a page-document hits the character ceiling.
pub fn pdf_truncation_marker(max_chars: usize) -> String {
    format!("\n[... content truncated at {max_chars} characters ...]")
}

/// Appended when a page-document has more pages than the page cap.
pub fn page_cap_note(processed: usize, total: usize) -> String {
    format!("\n[Note: processed first {processed} pages of {total} total]")
}

/// A paginated document whose pages can be read one at a time.
pub trait PageSource {
    /// Total number of pages in the document.
    fn page_count(&self) -> usize;

    /// Text of the page at `index` (0-based). An `Err` skips only that page.
    fn page_text(&self, index: usize) -> Result<String, String>;
}

impl PageSource for PdfPages<'_> {
    fn page_count(&self) -> usize {
        self.len() as usize
    }

    fn page_text(&self, index: usize) -> Result<String, String> {
        let index = u16::try_from(index).map_err(|_| format!("page index {index} out of range"))?;
        let page = self.get(index).map_err(|e| format!("{e:?}"))?;
        let text = page.text().map_err(|e| format!("{e:?}"))?;
        Ok(text.all())
    }
}

// ── Batch ────────────────────────────────────────────────────────────────

/// Extract every accepted upload on the blocking pool, preserving order.
///
/// Rejected uploads are not read; they become failed results in place.
pub async fn extract_all(
    admissions: Vec<Admission>,
    config: &StudyConfig,
) -> Result<Vec<ExtractionResult>, StudyError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        admissions
            .into_iter()
            .map(|admission| match admission {
                Admission::Accepted(file, kind) => extract_file(&file, kind, &config),
                Admission::Rejected { name, extension } => {
                    ExtractionResult::failed(name, FileError::UnsupportedType { extension })
                }
            })
            .collect()
    })
    .await
    .map_err(|e| StudyError::Internal(format!("Extraction task panicked: {e}")))
}

/// Extract one file with the extractor for its kind.
///
/// Never fails: every problem becomes an [`ExtractionResult`] outcome.
pub fn extract_file(file: &UploadedFile, kind: FileKind, config: &StudyConfig) -> ExtractionResult {
    let result = match kind {
        FileKind::Text => ExtractionResult::text(
            &file.name,
            decode_text(&file.bytes, config.max_text_file_bytes),
        ),
        FileKind::PageDocument => extract_pdf(file, config),
    };
    match (result.recovered_text(), result.error()) {
        (Some(text), _) => debug!("{}: recovered {} chars", file.name, text.chars().count()),
        (None, Some(e)) => warn!("{}: {}", file.name, e),
        (None, None) => warn!("{}: no extractable text", file.name),
    }
    result
}

// ── Plain text ───────────────────────────────────────────────────────────

/// Decode at most `max_bytes` of `bytes` as UTF-8, dropping invalid sequences.
pub fn decode_text(bytes: &[u8], max_bytes: usize) -> String {
    let capped = &bytes[..bytes.len().min(max_bytes)];
    if capped.len() < bytes.len() {
        info!(
            "Text file truncated from {} to {} bytes before decoding",
            bytes.len(),
            capped.len()
        );
    }
    let mut out = String::with_capacity(capped.len());
    for chunk in capped.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

// ── Page-documents ───────────────────────────────────────────────────────

/// Read pages in order, honouring the page and character caps.
pub fn collect_pages(source: &dyn PageSource, max_pages: usize, max_chars: usize) -> String {
    let total = source.page_count();
    let limit = total.min(max_pages);
    let mut text = String::new();
    let mut chars = 0usize;
    let mut processed = limit;

    for index in 0..limit {
        let page = match source.page_text(index) {
            Ok(page) => page,
            Err(e) => {
                warn!("Page {}: text extraction failed, skipping: {}", index + 1, e);
                continue;
            }
        };
        if page.trim().is_empty() {
            continue;
        }

        text.push_str(&page);
        text.push('\n');
        chars += page.chars().count() + 1;

        if chars > max_chars {
            truncate_chars(&mut text, max_chars);
            text.push_str(&pdf_truncation_marker(max_chars));
            debug!("Stopped at page {} after {} chars", index + 1, max_chars);
            processed = index + 1;
            break;
        }
    }

    if total > max_pages && !text.trim().is_empty() {
        text.push_str(&page_cap_note(processed, total));
    }
    text
}

/// Placeholder text used when the pdfium library cannot be loaded.
pub fn pdf_unavailable_placeholder(name: &str) -> String {
    format!("[PDF text extraction unavailable for {name}: PDFium library could not be loaded]")
}

fn extract_pdf(file: &UploadedFile, config: &StudyConfig) -> ExtractionResult {
    if !has_pdf_header(&file.bytes) {
        return ExtractionResult::failed(
            &file.name,
            FileError::Corrupt {
                detail: "missing %PDF header".to_string(),
            },
        );
    }

    let pdfium = match bind_pdfium(config.pdfium_lib_path.as_deref()) {
        Ok(pdfium) => pdfium,
        Err(e) => {
            warn!("{}: PDFium unavailable ({}), using placeholder", file.name, e);
            return ExtractionResult::text(&file.name, pdf_unavailable_placeholder(&file.name));
        }
    };

    let document = match pdfium.load_pdf_from_byte_slice(&file.bytes, None) {
        Ok(document) => document,
        Err(e) => {
            return ExtractionResult::failed(
                &file.name,
                FileError::Corrupt {
                    detail: format!("{e:?}"),
                },
            )
        }
    };

    let pages = document.pages();
    info!("{}: PDF loaded, {} pages", file.name, pages.len());
    ExtractionResult::text(
        &file.name,
        collect_pages(pages, config.max_pdf_pages, config.max_pdf_chars),
    )
}

/// `%PDF` within the first KiB, as readers tolerate leading junk.
fn has_pdf_header(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(4).any(|w| w == b"%PDF")
}

/// Bind pdfium for one extraction.
///
/// Binding order: `configured` path, `PDFIUM_LIB_PATH` (either may be a
/// library file or a directory holding one), then the system library.
fn bind_pdfium(configured: Option<&Path>) -> Result<Pdfium, String> {
    let explicit = configured.map(Path::to_path_buf).or_else(|| {
        std::env::var_os("PDFIUM_LIB_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    });
    let bindings = match explicit {
        Some(path) => {
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            Pdfium::bind_to_library(lib)
        }
        None => Pdfium::bind_to_system_library(),
    };
    bindings.map(Pdfium::new).map_err(|e| format!("{e:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory page-document; `None` pages fail to extract.
    struct FakePages(Vec<Option<String>>);

    impl PageSource for FakePages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn page_text(&self, index: usize) -> Result<String, String> {
            self.0[index].clone().ok_or_else(|| "broken content stream".to_string())
        }
    }

    fn numbered(n: usize) -> FakePages {
        FakePages((1..=n).map(|i| Some(format!("page-{i}"))).collect())
    }

    #[test]
    fn valid_utf8_round_trips_exactly() {
        let s = "Photosynthesis converts light to energy. Ünïcødé ✓";
        assert_eq!(decode_text(s.as_bytes(), 5 * 1024 * 1024), s);
    }

    #[test]
    fn invalid_bytes_are_dropped() {
        let bytes = b"ab\xffcd\xc3";
        assert_eq!(decode_text(bytes, 1024), "abcd");
    }

    #[test]
    fn text_is_capped_before_decoding() {
        let bytes = vec![b'x'; 5_242_880 + 1000];
        let text = decode_text(&bytes, 5_242_880);
        assert_eq!(text.chars().count(), 5_242_880);
    }

    #[test]
    fn cap_inside_multibyte_char_drops_the_fragment() {
        // "é" is two bytes; cutting after the first leaves an invalid tail.
        assert_eq!(decode_text("aé".as_bytes(), 2), "a");
    }

    #[test]
    fn pages_are_joined_in_order() {
        let text = collect_pages(&numbered(3), 100, 50_000);
        assert_eq!(text, "page-1\npage-2\npage-3\n");
    }

    #[test]
    fn failing_page_is_skipped_not_fatal() {
        let pages = FakePages(vec![Some("first".into()), None, Some("third".into())]);
        assert_eq!(collect_pages(&pages, 100, 50_000), "first\nthird\n");
    }

    #[test]
    fn page_cap_adds_note_and_excludes_later_pages() {
        let text = collect_pages(&numbered(150), 100, 50_000);
        assert!(text.contains("processed first 100 pages"), "got tail: {}", &text[text.len() - 60..]);
        assert!(text.contains("of 150 total"));
        assert!(text.contains("page-100\n"));
        assert!(!text.contains("page-101"));
    }

    #[test]
    fn char_ceiling_truncates_with_marker() {
        let pages = FakePages(vec![Some("a".repeat(30)), Some("b".repeat(30)), Some("c".repeat(30))]);
        let text = collect_pages(&pages, 100, 40);
        let marker = pdf_truncation_marker(40);
        assert!(text.ends_with(&marker));
        let body = &text[..text.len() - marker.len()];
        assert_eq!(body.chars().count(), 40);
        assert!(!body.contains('c'));
    }

    #[test]
    fn both_caps_report_pages_actually_read() {
        let pages = FakePages((1..=150).map(|i| Some(format!("p{i:03}{}", "x".repeat(996)))).collect());
        let text = collect_pages(&pages, 100, 5_000);
        assert!(text.contains("p005"));
        assert!(!text.contains("p006"));
        assert!(text.ends_with(&format!(
            "{}{}",
            pdf_truncation_marker(5_000),
            page_cap_note(5, 150)
        )));
    }

    #[test]
    fn image_only_document_is_empty() {
        let pages = FakePages(vec![Some("  ".into()), Some(String::new())]);
        assert_eq!(collect_pages(&pages, 100, 50_000), "");
    }

    #[test]
    fn missing_header_is_a_structural_error() {
        let file = UploadedFile::new("fake.pdf", b"hello world".to_vec());
        let result = extract_file(&file, FileKind::PageDocument, &StudyConfig::default());
        assert!(matches!(result.error(), Some(FileError::Corrupt { .. })));
    }

    #[test]
    fn unloadable_pdfium_yields_placeholder_text() {
        let config = StudyConfig::builder()
            .pdfium_lib_path("/nonexistent/libpdfium.so")
            .build()
            .unwrap();
        let file = UploadedFile::new("lecture.pdf", b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n".to_vec());
        let result = extract_file(&file, FileKind::PageDocument, &config);
        assert_eq!(
            result.outcome,
            crate::output::ExtractionOutcome::Text(pdf_unavailable_placeholder("lecture.pdf"))
        );

        let aggregation = crate::pipeline::aggregate::aggregate(&[result], 8_000).unwrap();
        assert_eq!(aggregation.corpus.sources, vec!["lecture.pdf".to_string()]);
        assert!(aggregation
            .corpus
            .text
            .contains(&pdf_unavailable_placeholder("lecture.pdf")));
    }

    #[test]
    fn empty_text_file_is_empty_outcome() {
        let file = UploadedFile::new("extra.txt", Vec::new());
        let result = extract_file(&file, FileKind::Text, &StudyConfig::default());
        assert_eq!(result.outcome, crate::output::ExtractionOutcome::Empty);
    }

    #[test]
    fn header_search_tolerates_leading_junk() {
        assert!(has_pdf_header(b"\n\n%PDF-1.7"));
        assert!(!has_pdf_header(b"PK\x03\x04"));
    }
}
