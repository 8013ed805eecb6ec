//! Text extraction strategies and the cascade that drives them.
//!
//! A strategy either produces text or reports a [`ExtractionOutcome::Failure`]
//! when the file simply has too little readable content. `Err` is reserved
//! for infrastructure problems (unreadable files, missing OCR binaries).

pub mod ocr;
pub mod orchestrator;
pub mod pdf_text;
pub mod plain_text;
pub mod raster;

pub use ocr::{ImageOcrStrategy, OcrEngine, PdfOcrStrategy, TesseractCli};
pub use orchestrator::{Extraction, ExtractionResult, Extractor};
pub use pdf_text::PdfTextStrategy;
pub use plain_text::PlainTextStrategy;
pub use raster::{PageDir, PageRasterizer, Pdftoppm};

use crate::ftms::UploadedFile;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// A PDF needs more than this many trimmed characters in its text layer to
/// count as text-bearing.
pub const PDF_TEXT_THRESHOLD: usize = 50;

/// OCR and plain-text reads below this many trimmed characters are unusable.
pub const MIN_MEANINGFUL_CHARS: usize = 10;

/// Which strategy produced (or failed to produce) a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTag {
    PdfText,
    PdfOcr,
    ImageOcr,
    PlainText,
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PdfText => "pdf_text",
            Self::PdfOcr => "pdf_ocr",
            Self::ImageOcr => "image_ocr",
            Self::PlainText => "plain_text",
        };
        f.write_str(name)
    }
}

/// Classification verdict for PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfKind {
    /// The embedded text layer is usable.
    Text,
    /// The pages must be rendered and read with OCR.
    Image,
}

/// One rasterized PDF page, 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub number: u32,
    pub png: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub content: String,
    pub source: StrategyTag,
    /// Rendered pages, only populated when OCR ran over a PDF.
    pub page_images: Vec<PageImage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Text(ExtractedText),
    Failure { source: StrategyTag, reason: String },
}

impl ExtractionOutcome {
    pub fn text(content: impl Into<String>, source: StrategyTag) -> Self {
        Self::Text(ExtractedText {
            content: content.into(),
            source,
            page_images: Vec::new(),
        })
    }

    pub fn failure(source: StrategyTag, reason: impl Into<String>) -> Self {
        Self::Failure {
            source,
            reason: reason.into(),
        }
    }

    /// Accept `raw` when its trimmed length is at least `min_chars`.
    pub fn at_least(raw: &str, min_chars: usize, source: StrategyTag) -> Self {
        let trimmed = raw.trim();
        let chars = trimmed.chars().count();
        if chars < min_chars {
            Self::failure(
                source,
                format!("only {chars} meaningful characters, need at least {min_chars}"),
            )
        } else {
            Self::text(trimmed, source)
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF rasterization failed: {0}")]
    Rasterize(String),

    #[error("OCR failed: {0}")]
    Ocr(String),
}

/// Shared capability of every extraction strategy.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn tag(&self) -> StrategyTag;

    async fn extract(&self, file: &UploadedFile) -> Result<ExtractionOutcome, ExtractError>;
}

/// First `max_chars` characters of `text`, for log previews.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_least_trims_and_counts_characters() {
        let ok = ExtractionOutcome::at_least("  0123456789  ", 10, StrategyTag::PlainText);
        assert_eq!(ok, ExtractionOutcome::text("0123456789", StrategyTag::PlainText));

        let short = ExtractionOutcome::at_least(" 012345678 ", 10, StrategyTag::ImageOcr);
        assert!(matches!(
            short,
            ExtractionOutcome::Failure { source: StrategyTag::ImageOcr, .. }
        ));
    }

    #[test]
    fn multibyte_characters_count_once() {
        let outcome = ExtractionOutcome::at_least("éééééééééé", 10, StrategyTag::PlainText);
        assert!(outcome.is_text());
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("hi", 10), "hi");
    }

    #[test]
    fn tags_render_snake_case() {
        assert_eq!(StrategyTag::PdfOcr.to_string(), "pdf_ocr");
        assert_eq!(serde_json::to_value(PdfKind::Image).unwrap(), "image");
    }
}
