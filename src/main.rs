use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use docpipe::config::Config;
use docpipe::extract::{preview, ExtractionResult, Extractor};
use docpipe::ftms::mime::guess_mime_type;
use docpipe::ftms::UploadedFile;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "docpipe")]
#[command(about = "Upload documents, extract their text, and ask an LLM about them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to bind (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides the config file and $PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Classify and extract a local file without storing it or calling the model
    Extract {
        /// File to extract
        file: PathBuf,

        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, host, port } => {
            let mut config = Config::load(config.as_deref())?;
            init_tracing(&config);
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            docpipe::gateway::run(config).await
        }
        Command::Extract { file, config } => {
            let config = Config::load(config.as_deref())?;
            init_tracing(&config);
            extract_local(&config, &file).await
        }
    }
}

fn init_tracing(config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .init();
}

async fn extract_local(config: &Config, path: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file = UploadedFile {
        id: Uuid::new_v4().to_string(),
        content_type: guess_mime_type(&name).to_string(),
        original_name: name,
        size: metadata.len(),
        uploaded_at: Utc::now().to_rfc3339(),
        path: path.to_path_buf(),
    };

    let extractor = Extractor::from_config(&config.extraction, &std::env::temp_dir());
    let extraction = extractor
        .classify_and_extract(&file)
        .await
        .with_context(|| format!("Extraction failed for {}", path.display()))?;

    println!("File:         {}", file.original_name);
    println!("Content type: {}", file.content_type);
    if let Some(kind) = extraction.verdict {
        println!("PDF type:     {kind:?}");
    }
    match extraction.result {
        ExtractionResult::Extracted(text) => {
            println!("Strategy:     {}", text.source);
            println!("Characters:   {}", text.content.chars().count());
            if !text.page_images.is_empty() {
                println!("Pages:        {}", text.page_images.len());
            }
            println!();
            println!("{}", preview(&text.content, 2000));
        }
        ExtractionResult::Unsupported(content_type) => {
            anyhow::bail!("Unsupported content type: {content_type}");
        }
        ExtractionResult::Exhausted { failures } => {
            for (tag, reason) in &failures {
                println!("{tag}: {reason}");
            }
            anyhow::bail!("No strategy produced meaningful text");
        }
    }
    Ok(())
}
