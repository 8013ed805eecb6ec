use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A stored upload. Written once as a sidecar record next to the blob and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
    #[serde(rename = "uploadDate")]
    pub uploaded_at: String,
    pub path: PathBuf,
}

impl UploadedFile {
    /// Name of the relocated blob inside the upload directory (`<id><ext>`).
    pub fn stored_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_class(&self) -> ContentClass {
        ContentClass::of(&self.content_type)
    }
}

/// The three content families the extraction cascade knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Pdf,
    Image,
    PlainText,
    Unsupported,
}

impl ContentClass {
    pub fn of(content_type: &str) -> Self {
        match content_type {
            "application/pdf" => Self::Pdf,
            t if t.starts_with("image/") => Self::Image,
            t if t.starts_with("text/") => Self::PlainText,
            _ => Self::Unsupported,
        }
    }
}
