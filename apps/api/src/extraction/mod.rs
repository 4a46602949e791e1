//! PDF text extraction. The rest of the service only sees `PdfExtractor`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF parser panicked on malformed input")]
    ParserPanic,
}

/// Turns PDF bytes into per-page text, in page order.
pub trait PdfExtractor: Send + Sync {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// PDF text extractor backed by the pdf-extract crate (digital PDFs with a text layer).
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        match guarded(|| pdf_extract::extract_text_from_mem_by_pages(pdf_bytes))? {
            Ok(pages) => Ok(pages),
            Err(e) => {
                // Per-page extraction is stricter about page trees than the whole-document pass.
                warn!("Per-page PDF extraction failed ({e}); retrying as a single document");
                let text = guarded(|| pdf_extract::extract_text_from_mem(pdf_bytes))?
                    .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;
                Ok(vec![text])
            }
        }
    }
}

/// pdf-extract panics on some malformed inputs; contain that to this request.
fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, ExtractionError> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|_| ExtractionError::ParserPanic)
}
