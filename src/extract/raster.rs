use super::ExtractError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use uuid::Uuid;

/// Renders PDF pages to PNG files.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Render every page of `pdf` into `out_dir`, one `page-<n>.png` per page.
    async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<(), ExtractError>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    binary: String,
    dpi: u32,
}

impl Pdftoppm {
    pub fn new(binary: impl Into<String>, dpi: u32) -> Self {
        Self {
            binary: binary.into(),
            dpi,
        }
    }
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self::new("pdftoppm", 150)
    }
}

#[async_trait]
impl PageRasterizer for Pdftoppm {
    async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<(), ExtractError> {
        let output = Command::new(&self.binary)
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(pdf)
            .arg(out_dir.join("page"))
            .output()
            .await
            .map_err(|e| ExtractError::Rasterize(format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Rasterize(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Scoped directory for one request's rendered pages.
///
/// The directory and everything in it is removed when the guard drops.
#[derive(Debug)]
pub struct PageDir {
    path: PathBuf,
}

impl PageDir {
    /// Create `<root>/<file_id>_pages_<nonce>`.
    pub async fn create(root: &Path, file_id: &str) -> Result<Self, ExtractError> {
        let path = root.join(format!("{file_id}_pages_{}", Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PNG files in the directory ordered by their page number.
    pub async fn pages(&self) -> Result<Vec<(u32, PathBuf)>, ExtractError> {
        let mut entries = tokio::fs::read_dir(&self.path).await?;
        let mut pages = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png")) {
                pages.push((page_number(&path), path));
            }
        }
        pages.sort();
        Ok(pages)
    }
}

impl Drop for PageDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove page images"
            ),
        }
    }
}

/// `page-07.png` -> 7. Names without a trailing number sort first.
fn page_number(path: &Path) -> u32 {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|stem| stem.rsplit(['-', '_']).next())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}
