use super::raster::{PageDir, PageRasterizer};
use super::{
    preview, ExtractError, ExtractionOutcome, ExtractionStrategy, PageImage, StrategyTag,
    MIN_MEANINGFUL_CHARS,
};
use crate::ftms::UploadedFile;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;

/// OCR engine abstraction (allows fakes in tests).
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &Path) -> Result<String, ExtractError>;
}

/// Runs the `tesseract` command line tool and reads the text from stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: String,
    language: String,
}

impl TesseractCli {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn recognize(&self, image: &Path) -> Result<String, ExtractError> {
        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .await
            .map_err(|e| ExtractError::Ocr(format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Ocr(format!(
                "{} exited with {} on {}: {}",
                self.binary,
                output.status,
                image.display(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// OCR straight over an uploaded image.
pub struct ImageOcrStrategy {
    engine: Arc<dyn OcrEngine>,
    min_chars: usize,
}

impl ImageOcrStrategy {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            engine,
            min_chars: MIN_MEANINGFUL_CHARS,
        }
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }
}

#[async_trait]
impl ExtractionStrategy for ImageOcrStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::ImageOcr
    }

    async fn extract(&self, file: &UploadedFile) -> Result<ExtractionOutcome, ExtractError> {
        tokio::fs::metadata(file.path()).await?;
        tracing::info!(file_id = %file.id, name = %file.original_name, "Running OCR on image");

        let text = self.engine.recognize(file.path()).await?;
        tracing::debug!(
            file_id = %file.id,
            chars = text.trim().chars().count(),
            preview = preview(text.trim(), 500),
            "Image OCR finished"
        );
        Ok(ExtractionOutcome::at_least(&text, self.min_chars, self.tag()))
    }
}

/// Rasterizes every PDF page and runs OCR over them in page order.
///
/// Rendered pages live in a [`PageDir`] that is gone by the time `extract`
/// returns, whatever the outcome. Their PNG bytes travel on the outcome so the
/// vision prompt can reuse them without rendering twice.
pub struct PdfOcrStrategy {
    rasterizer: Arc<dyn PageRasterizer>,
    engine: Arc<dyn OcrEngine>,
    work_dir: PathBuf,
    min_chars: usize,
}

impl PdfOcrStrategy {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        engine: Arc<dyn OcrEngine>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            rasterizer,
            engine,
            work_dir: work_dir.into(),
            min_chars: MIN_MEANINGFUL_CHARS,
        }
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }
}

#[async_trait]
impl ExtractionStrategy for PdfOcrStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::PdfOcr
    }

    async fn extract(&self, file: &UploadedFile) -> Result<ExtractionOutcome, ExtractError> {
        let page_dir = PageDir::create(&self.work_dir, &file.id).await?;
        tracing::info!(file_id = %file.id, dir = %page_dir.path().display(), "Rasterizing PDF for OCR");

        self.rasterizer.rasterize(file.path(), page_dir.path()).await?;
        let pages = page_dir.pages().await?;
        if pages.is_empty() {
            return Ok(ExtractionOutcome::failure(self.tag(), "no page images were produced"));
        }

        let mut texts = Vec::with_capacity(pages.len());
        let mut images = Vec::with_capacity(pages.len());
        for (number, path) in &pages {
            let png = tokio::fs::read(path).await?;
            let text = self.engine.recognize(path).await?;
            tracing::debug!(file_id = %file.id, page = number, chars = text.trim().len(), "Page OCR finished");
            texts.push(text);
            images.push(PageImage {
                number: *number,
                png,
            });
        }

        let joined = texts.join("\n");
        tracing::info!(
            file_id = %file.id,
            pages = pages.len(),
            chars = joined.trim().chars().count(),
            "PDF OCR finished"
        );

        Ok(match ExtractionOutcome::at_least(&joined, self.min_chars, self.tag()) {
            ExtractionOutcome::Text(mut text) => {
                text.page_images = images;
                ExtractionOutcome::Text(text)
            }
            failure => failure,
        })
    }
}
