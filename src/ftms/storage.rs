use super::mime::{extension_of, guess_mime_type};
use super::schema::UploadedFile;
use super::StorageError;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// A blob that has been received but not yet stored under an identifier.
#[derive(Debug)]
pub struct ReceivedBlob {
    pub path: PathBuf,
    pub size: u64,
}

/// Manages uploaded files on disk. Each stored file is `<id><ext>` with a
/// `<id>_metadata.json` sidecar next to it.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    pub fn new(base_dir: &str) -> Self {
        let expanded = shellexpand::tilde(base_dir).to_string();
        Self {
            base_dir: PathBuf::from(expanded),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_dir).await?;
        Ok(())
    }

    /// Write freshly received bytes to a temporary file in the upload directory.
    pub async fn receive(&self, original_name: &str, data: &[u8]) -> Result<ReceivedBlob, StorageError> {
        self.ensure_dir().await?;
        let temp_name = format!("temp-{}{}", Uuid::new_v4(), extension_of(original_name));
        let path = self.base_dir.join(temp_name);
        if let Err(e) = fs::write(&path, data).await {
            discard(&path).await;
            return Err(e.into());
        }
        Ok(ReceivedBlob {
            path,
            size: data.len() as u64,
        })
    }

    /// Store a received blob under a fresh identifier and record its sidecar.
    ///
    /// On failure neither the temporary blob nor a half-relocated copy is
    /// left behind.
    pub async fn store(&self, blob: ReceivedBlob, original_name: &str) -> Result<UploadedFile, StorageError> {
        self.store_with_id(blob, original_name, Uuid::new_v4().to_string())
            .await
    }

    async fn store_with_id(
        &self,
        blob: ReceivedBlob,
        original_name: &str,
        id: String,
    ) -> Result<UploadedFile, StorageError> {
        let stored_path = self
            .base_dir
            .join(format!("{id}{}", extension_of(original_name)));

        let record = UploadedFile {
            id: id.clone(),
            original_name: original_name.to_string(),
            content_type: guess_mime_type(original_name).to_string(),
            size: blob.size,
            uploaded_at: Utc::now().to_rfc3339(),
            path: stored_path.clone(),
        };

        match self.relocate_and_record(&blob, &record).await {
            Ok(()) => {
                tracing::info!(
                    file_id = %record.id,
                    content_type = %record.content_type,
                    size = record.size,
                    "Stored upload"
                );
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(file_id = %id, error = %e, "Store failed, removing partial files");
                discard(&blob.path).await;
                discard(&stored_path).await;
                discard(&self.sidecar_path(&id)).await;
                Err(e)
            }
        }
    }

    /// Receive and store in one step.
    pub async fn store_bytes(&self, original_name: &str, data: &[u8]) -> Result<UploadedFile, StorageError> {
        let blob = self.receive(original_name, data).await?;
        self.store(blob, original_name).await
    }

    /// Load the record for `id`.
    pub async fn lookup(&self, id: &str) -> Result<UploadedFile, StorageError> {
        // Only canonical UUIDs name a record; anything else cannot escape the upload dir.
        if Uuid::parse_str(id).is_err() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let raw = match fs::read(self.sidecar_path(id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw).map_err(|source| StorageError::Metadata {
            id: id.to_string(),
            source,
        })
    }

    fn sidecar_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("{id}_metadata.json"))
    }

    async fn relocate_and_record(&self, blob: &ReceivedBlob, record: &UploadedFile) -> Result<(), StorageError> {
        fs::rename(&blob.path, &record.path).await?;
        let json = serde_json::to_vec_pretty(record).map_err(|source| StorageError::Metadata {
            id: record.id.clone(),
            source,
        })?;
        fs::write(self.sidecar_path(&record.id), json).await?;
        Ok(())
    }
}

async fn discard(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_in(dir: &tempfile::TempDir) -> FileStorage {
        FileStorage::new(dir.path().to_str().unwrap())
    }

    #[tokio::test]
    async fn store_then_lookup_round_trips_record() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);

        let stored = storage
            .store_bytes("Permit.PDF", b"%PDF-1.4 fake")
            .await
            .unwrap();
        assert_eq!(stored.content_type, "application/pdf");
        assert_eq!(stored.stored_name(), format!("{}.PDF", stored.id));
        assert!(stored.path.exists());

        let found = storage.lookup(&stored.id).await.unwrap();
        assert_eq!(found.original_name, "Permit.PDF");
        assert_eq!(found.content_type, "application/pdf");
        assert_eq!(found.size, 13);
        assert_eq!(found, stored);
    }

    #[tokio::test]
    async fn temp_blob_is_relocated_not_copied() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);

        let blob = storage.receive("notes.txt", b"hello").await.unwrap();
        let temp_path = blob.path.clone();
        assert!(temp_path.exists());

        storage.store(blob, "notes.txt").await.unwrap();
        assert!(!temp_path.exists());

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.ends_with("_metadata.json")));
        assert!(names.iter().all(|n| !n.starts_with("temp-")));
    }

    #[tokio::test]
    async fn unknown_extension_is_recorded_as_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        let stored = storage.store_bytes("bundle.zip", b"PK").await.unwrap();
        assert_eq!(stored.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn lookup_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        let missing = Uuid::new_v4().to_string();
        assert!(matches!(
            storage.lookup(&missing).await,
            Err(StorageError::NotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn lookup_rejects_non_uuid_ids() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        assert!(matches!(
            storage.lookup("../etc/passwd").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn failed_store_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        let blob = ReceivedBlob {
            path: dir.path().join("temp-missing.pdf"),
            size: 10,
        };
        let err = storage.store(blob, "missing.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_sidecar_write_removes_relocated_blob() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_in(&dir);
        let id = Uuid::new_v4().to_string();
        // A directory in the sidecar's place makes the metadata write fail after the rename.
        std::fs::create_dir(storage.sidecar_path(&id)).unwrap();

        let blob = storage.receive("permit.pdf", b"%PDF-1.4").await.unwrap();
        let temp_path = blob.path.clone();
        let err = storage
            .store_with_id(blob, "permit.pdf", id.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Io(_)));
        assert!(!temp_path.exists());
        assert!(!dir.path().join(format!("{id}.pdf")).exists());
        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![format!("{id}_metadata.json")]);
    }
}
