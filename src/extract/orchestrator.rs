use super::ocr::{ImageOcrStrategy, OcrEngine, PdfOcrStrategy, TesseractCli};
use super::pdf_text::PdfTextStrategy;
use super::plain_text::PlainTextStrategy;
use super::raster::{PageRasterizer, Pdftoppm};
use super::{ExtractError, ExtractedText, ExtractionOutcome, ExtractionStrategy, PdfKind, StrategyTag};
use crate::config::ExtractionConfig;
use crate::ftms::{ContentClass, UploadedFile};
use std::path::Path;
use std::sync::Arc;

/// Final state of one extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Extracted(ExtractedText),
    /// Every applicable strategy ran and none produced enough text.
    Exhausted { failures: Vec<(StrategyTag, String)> },
    /// No cascade exists for this content type; nothing was run.
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Only set for PDFs.
    pub verdict: Option<PdfKind>,
    pub result: ExtractionResult,
}

/// Picks the cascade for a file's content type and runs it until a strategy
/// yields text.
///
/// For PDFs the direct-text attempt runs once and serves both as the
/// classification probe and as the first cascade step, so the verdict always
/// matches the branch that produced the result.
#[derive(Clone)]
pub struct Extractor {
    pdf_text: Arc<dyn ExtractionStrategy>,
    pdf_ocr: Arc<dyn ExtractionStrategy>,
    image_ocr: Arc<dyn ExtractionStrategy>,
    plain_text: Arc<dyn ExtractionStrategy>,
}

impl Extractor {
    pub fn new(
        pdf_text: Arc<dyn ExtractionStrategy>,
        pdf_ocr: Arc<dyn ExtractionStrategy>,
        image_ocr: Arc<dyn ExtractionStrategy>,
        plain_text: Arc<dyn ExtractionStrategy>,
    ) -> Self {
        Self {
            pdf_text,
            pdf_ocr,
            image_ocr,
            plain_text,
        }
    }

    /// Wire the production strategies. Rendered pages go under `work_dir`.
    pub fn from_config(config: &ExtractionConfig, work_dir: &Path) -> Self {
        let engine: Arc<dyn OcrEngine> =
            Arc::new(TesseractCli::new(&config.tesseract_bin, &config.ocr_language));
        let rasterizer: Arc<dyn PageRasterizer> =
            Arc::new(Pdftoppm::new(&config.pdftoppm_bin, config.raster_dpi));

        Self::new(
            Arc::new(PdfTextStrategy::new(config.min_pdf_text_chars)),
            Arc::new(
                PdfOcrStrategy::new(rasterizer, engine.clone(), work_dir)
                    .with_min_chars(config.min_ocr_chars),
            ),
            Arc::new(ImageOcrStrategy::new(engine).with_min_chars(config.min_ocr_chars)),
            Arc::new(PlainTextStrategy::new(config.min_plain_text_chars)),
        )
    }

    fn cascade(&self, class: ContentClass) -> Vec<&Arc<dyn ExtractionStrategy>> {
        match class {
            ContentClass::Pdf => vec![&self.pdf_text, &self.pdf_ocr],
            ContentClass::Image => vec![&self.image_ocr],
            ContentClass::PlainText => vec![&self.plain_text],
            ContentClass::Unsupported => Vec::new(),
        }
    }

    pub async fn classify_and_extract(&self, file: &UploadedFile) -> Result<Extraction, ExtractError> {
        let class = file.content_class();
        if class == ContentClass::Unsupported {
            tracing::warn!(file_id = %file.id, content_type = %file.content_type, "No extraction cascade for content type");
            return Ok(Extraction {
                verdict: None,
                result: ExtractionResult::Unsupported(file.content_type.clone()),
            });
        }

        let mut verdict = None;
        let mut failures = Vec::new();

        for (step, strategy) in self.cascade(class).into_iter().enumerate() {
            let outcome = strategy.extract(file).await?;

            if class == ContentClass::Pdf && step == 0 {
                let kind = if outcome.is_text() { PdfKind::Text } else { PdfKind::Image };
                tracing::info!(file_id = %file.id, pdf_type = ?kind, "Classified PDF");
                verdict = Some(kind);
            }

            match outcome {
                ExtractionOutcome::Text(text) => {
                    tracing::info!(
                        file_id = %file.id,
                        strategy = %text.source,
                        chars = text.content.chars().count(),
                        "Extraction succeeded"
                    );
                    return Ok(Extraction {
                        verdict,
                        result: ExtractionResult::Extracted(text),
                    });
                }
                ExtractionOutcome::Failure { source, reason } => {
                    tracing::info!(file_id = %file.id, strategy = %source, %reason, "Strategy produced no usable text");
                    failures.push((source, reason));
                }
            }
        }

        tracing::warn!(file_id = %file.id, attempts = failures.len(), "Extraction exhausted");
        Ok(Extraction {
            verdict,
            result: ExtractionResult::Exhausted { failures },
        })
    }
}
