use super::{preview, ExtractError, ExtractionOutcome, ExtractionStrategy, StrategyTag, MIN_MEANINGFUL_CHARS};
use crate::ftms::UploadedFile;
use async_trait::async_trait;

/// Reads the stored file as (lossy) UTF-8 text.
#[derive(Debug, Clone)]
pub struct PlainTextStrategy {
    min_chars: usize,
}

impl PlainTextStrategy {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }
}

impl Default for PlainTextStrategy {
    fn default() -> Self {
        Self::new(MIN_MEANINGFUL_CHARS)
    }
}

#[async_trait]
impl ExtractionStrategy for PlainTextStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::PlainText
    }

    async fn extract(&self, file: &UploadedFile) -> Result<ExtractionOutcome, ExtractError> {
        let data = tokio::fs::read(file.path()).await?;
        let text = String::from_utf8_lossy(&data);
        tracing::debug!(
            file_id = %file.id,
            chars = text.trim().chars().count(),
            preview = preview(text.trim(), 500),
            "Read text file"
        );
        Ok(ExtractionOutcome::at_least(&text, self.min_chars, self.tag()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::pdf_text::tests::file_at;

    #[tokio::test]
    async fn reads_and_trims_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "\n  Hello world, this is a test document.  \n").unwrap();

        let outcome = PlainTextStrategy::default()
            .extract(&file_at(&path, "text/plain"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ExtractionOutcome::text("Hello world, this is a test document.", StrategyTag::PlainText)
        );
    }

    #[tokio::test]
    async fn whitespace_only_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        std::fs::write(&path, " \n\t  short ").unwrap();

        let outcome = PlainTextStrategy::default()
            .extract(&file_at(&path, "text/plain"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            ExtractionOutcome::Failure { source: StrategyTag::PlainText, .. }
        ));
    }

    #[tokio::test]
    async fn invalid_utf8_is_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        std::fs::write(&path, b"Caf\xe9 receipt number 42").unwrap();

        let outcome = PlainTextStrategy::default()
            .extract(&file_at(&path, "text/plain"))
            .await
            .unwrap();
        assert!(outcome.is_text());
    }
}
