//! Per-request flow: look up the stored file, extract, prompt the model once.

use crate::config::ModelConfig;
use crate::extract::{
    ExtractError, ExtractedText, ExtractionResult, Extractor, PdfKind, StrategyTag,
};
use crate::ftms::{FileStorage, StorageError};
use crate::llm::prompt::{document_images_request, route_request, summary_request};
use crate::llm::{ChatModel, ChatRequest, ModelError};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Could not extract meaningful text ({0})")]
    ExtractionExhausted(String),

    #[error("Model invocation failed: {0}")]
    ModelInvocationFailed(#[from] ModelError),

    #[error("Storage failure: {0}")]
    Storage(StorageError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),
}

impl From<StorageError> for ProcessError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

/// Model answer plus how it was obtained. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResult {
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_type: Option<PdfKind>,
    pub extraction_source: StrategyTag,
    pub extracted_content_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    /// Raw model output, never validated.
    pub response: String,
}

pub struct DocumentProcessor {
    storage: FileStorage,
    extractor: Extractor,
    model: Arc<dyn ChatModel>,
    models: ModelConfig,
}

impl DocumentProcessor {
    pub fn new(storage: FileStorage, extractor: Extractor, model: Arc<dyn ChatModel>, models: ModelConfig) -> Self {
        Self {
            storage,
            extractor,
            model,
            models,
        }
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Classify, extract and prompt for the stored file `file_id`.
    ///
    /// Nothing is cached: every call re-runs the whole cascade.
    pub async fn process(&self, file_id: &str) -> Result<AiResult, ProcessError> {
        let file = self.storage.lookup(file_id).await?;
        tracing::info!(file_id, content_type = %file.content_type, "Processing file");

        let extraction = self.extractor.classify_and_extract(&file).await?;
        let text = match extraction.result {
            ExtractionResult::Extracted(text) => text,
            ExtractionResult::Unsupported(content_type) => {
                return Err(ProcessError::UnsupportedContentType(content_type))
            }
            ExtractionResult::Exhausted { failures } => {
                let reasons = failures
                    .iter()
                    .map(|(tag, reason)| format!("{tag}: {reason}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(ProcessError::ExtractionExhausted(reasons));
            }
        };

        let request = self.build_request(extraction.verdict, &text);
        let response = self.model.complete(&request).await?;
        tracing::info!(file_id, model = %request.model, response_chars = response.len(), "Model responded");

        let page_count = match extraction.verdict {
            Some(PdfKind::Image) => Some(text.page_images.len()),
            _ => None,
        };
        Ok(AiResult {
            content_type: file.content_type,
            pdf_type: extraction.verdict,
            extraction_source: text.source,
            extracted_content_length: text.content.chars().count(),
            page_count,
            response,
        })
    }

    fn build_request(&self, verdict: Option<PdfKind>, text: &ExtractedText) -> ChatRequest {
        match verdict {
            Some(PdfKind::Text) => route_request(&self.models.text_model, &text.content),
            Some(PdfKind::Image) if !text.page_images.is_empty() => document_images_request(
                &self.models.vision_model,
                self.models.vision_max_tokens,
                &text.page_images,
            ),
            _ => summary_request(&self.models.summary_model, &text.content),
        }
    }
}
