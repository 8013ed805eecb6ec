use super::{preview, ExtractError, ExtractionOutcome, ExtractionStrategy, StrategyTag, PDF_TEXT_THRESHOLD};
use crate::ftms::UploadedFile;
use async_trait::async_trait;

/// Pulls the embedded text layer out of a PDF with `pdf-extract`.
///
/// Succeeds only when the trimmed text is longer than `threshold` characters.
/// A document the parser cannot read is reported as a failure so the cascade
/// can fall through to OCR.
#[derive(Debug, Clone)]
pub struct PdfTextStrategy {
    threshold: usize,
}

impl PdfTextStrategy {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl Default for PdfTextStrategy {
    fn default() -> Self {
        Self::new(PDF_TEXT_THRESHOLD)
    }
}

#[async_trait]
impl ExtractionStrategy for PdfTextStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::PdfText
    }

    async fn extract(&self, file: &UploadedFile) -> Result<ExtractionOutcome, ExtractError> {
        let data = tokio::fs::read(file.path()).await?;

        let parsed = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data)).await;
        let text = match parsed {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!(file_id = %file.id, error = %e, "PDF text layer unreadable");
                return Ok(ExtractionOutcome::failure(self.tag(), format!("PDF parser error: {e}")));
            }
            Err(e) => {
                tracing::warn!(file_id = %file.id, error = %e, "PDF parser task aborted");
                return Ok(ExtractionOutcome::failure(self.tag(), format!("PDF parser aborted: {e}")));
            }
        };

        let trimmed = text.trim();
        let chars = trimmed.chars().count();
        tracing::debug!(
            file_id = %file.id,
            chars,
            preview = preview(trimmed, 500),
            "PDF text layer extracted"
        );

        if chars > self.threshold {
            Ok(ExtractionOutcome::text(trimmed, self.tag()))
        } else {
            Ok(ExtractionOutcome::failure(
                self.tag(),
                format!("text layer has {chars} characters, need more than {}", self.threshold),
            ))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::Path;

    /// Build a one-page PDF whose text layer contains `text` (empty string gives
    /// a page with no text operators at all).
    pub(crate) fn make_test_pdf(text: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let content = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 72 700 Td ({text}) Tj ET")
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    pub(crate) fn file_at(path: &Path, content_type: &str) -> UploadedFile {
        UploadedFile {
            id: "00000000-0000-4000-8000-000000000001".into(),
            original_name: path.file_name().unwrap().to_string_lossy().into_owned(),
            content_type: content_type.into(),
            size: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            uploaded_at: "2024-01-01T00:00:00Z".into(),
            path: path.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn text_bearing_pdf_yields_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permit.pdf");
        std::fs::write(
            &path,
            make_test_pdf("Transport permit from Springfield depot to Shelbyville harbour via Route 9"),
        )
        .unwrap();

        let outcome = PdfTextStrategy::default()
            .extract(&file_at(&path, "application/pdf"))
            .await
            .unwrap();
        match outcome {
            ExtractionOutcome::Text(text) => {
                assert_eq!(text.source, StrategyTag::PdfText);
                assert!(text.content.chars().count() > PDF_TEXT_THRESHOLD);
                assert!(text.page_images.is_empty());
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn short_text_layer_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stamp.pdf");
        std::fs::write(&path, make_test_pdf("APPROVED")).unwrap();

        let outcome = PdfTextStrategy::default()
            .extract(&file_at(&path, "application/pdf"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            ExtractionOutcome::Failure { source: StrategyTag::PdfText, .. }
        ));
    }

    #[tokio::test]
    async fn unparseable_pdf_is_a_failure_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();

        let outcome = PdfTextStrategy::default()
            .extract(&file_at(&path, "application/pdf"))
            .await
            .unwrap();
        assert!(!outcome.is_text());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = file_at(&dir.path().join("gone.pdf"), "application/pdf");
        let err = PdfTextStrategy::default().extract(&file).await.unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }
}
