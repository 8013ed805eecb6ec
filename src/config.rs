//! Runtime configuration loaded from TOML, with environment overrides.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_FILTER: &str = "docpipe=info,tower_http=warn";

/// Uploads larger than this are rejected.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_filter: Option<String>,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub extraction: ExtractionConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub upload_dir: String,
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: "./uploads".into(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// A PDF text layer must be longer than this to count as text-bearing.
    pub min_pdf_text_chars: usize,
    pub min_ocr_chars: usize,
    pub min_plain_text_chars: usize,
    pub ocr_language: String,
    pub raster_dpi: u32,
    pub tesseract_bin: String,
    pub pdftoppm_bin: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_pdf_text_chars: crate::extract::PDF_TEXT_THRESHOLD,
            min_ocr_chars: crate::extract::MIN_MEANINGFUL_CHARS,
            min_plain_text_chars: crate::extract::MIN_MEANINGFUL_CHARS,
            ocr_language: "eng".into(),
            raster_dpi: 150,
            tesseract_bin: "tesseract".into(),
            pdftoppm_bin: "pdftoppm".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Route extraction from text-bearing PDFs.
    pub text_model: String,
    /// Page images of image-bearing PDFs.
    pub vision_model: String,
    /// Plain text and OCR'd images.
    pub summary_model: String,
    pub vision_max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            text_model: "gpt-4o".into(),
            vision_model: "gpt-4o".into(),
            summary_model: "gpt-4o-mini".into(),
            vision_max_tokens: 1000,
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Lookup order: explicit path, `$DOCPIPE_CONFIG`, the platform config
    /// directory. A missing default file means built-in defaults; a missing
    /// explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os("DOCPIPE_CONFIG").map(PathBuf::from);
        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.model.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            if !url.trim().is_empty() {
                self.model.base_url = url;
            }
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "docpipe").map(|dirs| dirs.config_dir().join("config.toml"))
}
