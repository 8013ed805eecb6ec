//! FTMS: File/Text Management System
//!
//! Stores uploaded blobs under generated identifiers, infers their content
//! type from the file name, and keeps a JSON sidecar record per file.

pub mod mime;
pub mod schema;
pub mod storage;

pub use schema::{ContentClass, UploadedFile};
pub use storage::{FileStorage, ReceivedBlob};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid metadata record for {id}: {source}")]
    Metadata {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}
