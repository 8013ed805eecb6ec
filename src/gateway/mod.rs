//! HTTP gateway: upload, AI processing and health endpoints.
//!
//! Routes:
//! - `POST /api/upload` stores a multipart `file` field
//! - `POST /api/ai/{file_id}` runs extraction and the model over a stored file
//! - `GET /health`

pub mod error;

pub use error::ApiError;

use crate::config::Config;
use crate::extract::Extractor;
use crate::ftms::mime::{is_allowed_upload, OCTET_STREAM};
use crate::ftms::FileStorage;
use crate::llm::OpenAiClient;
use crate::pipeline::DocumentProcessor;
use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{ConnectInfo, DefaultBodyLimit, Multipart, Path, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Headroom on top of the upload ceiling for multipart boundaries and headers.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<DocumentProcessor>,
    pub max_upload_bytes: usize,
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes + MULTIPART_OVERHEAD;
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/ai/{file_id}", post(process))
        .route("/health", get(health))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(log_requests))
        .layer(CorsLayer::permissive())
}

/// Build the processor from `config`, bind, and serve until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    let storage = FileStorage::new(&config.storage.upload_dir);
    storage
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create upload directory {}", storage.base_dir().display()))?;

    if config.model.api_key.is_none() {
        tracing::warn!("No API key configured; /api/ai requests will fail until OPENAI_API_KEY is set");
    }

    let extractor = Extractor::from_config(&config.extraction, storage.base_dir());
    let model = OpenAiClient::new(&config.model).context("Failed to build model client")?;
    let processor = DocumentProcessor::new(storage, extractor, Arc::new(model), config.model.clone());
    let app = router(AppState {
        processor: Arc::new(processor),
        max_upload_bytes: config.storage.max_upload_bytes,
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "Server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
    }
}

async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let client = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "-".into());
    tracing::info!(method = %req.method(), uri = %req.uri(), client = %client, "Request");
    next.run(req).await
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    success: bool,
    message: &'static str,
    content_type: String,
    file_name: String,
    file_id: String,
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;
    let mut received = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let declared = field.content_type().unwrap_or(OCTET_STREAM).to_string();
        if !is_allowed_upload(&declared) {
            return Err(ApiError::InvalidFileType(declared));
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await?;
        received = Some((name, bytes));
        break;
    }

    let (name, bytes) = received.ok_or(ApiError::MissingFile)?;
    if bytes.len() > state.max_upload_bytes {
        return Err(ApiError::TooLarge {
            limit: state.max_upload_bytes,
        });
    }

    let record = state.processor.storage().store_bytes(&name, &bytes).await?;
    let file_name = record.stored_name();
    Ok(Json(UploadResponse {
        success: true,
        message: "File uploaded and stored successfully",
        content_type: record.content_type,
        file_name,
        file_id: record.id,
    }))
}

async fn process(State(state): State<AppState>, Path(file_id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    let result = state.processor.process(&file_id).await?;

    let mut body = json!({
        "success": true,
        "fileId": file_id,
        "contentType": result.content_type,
        "result": result.response,
        "extractedContentLength": result.extracted_content_length,
    });
    if let Some(kind) = result.pdf_type {
        body["pdfType"] = json!(kind);
    }
    if let Some(pages) = result.page_count {
        body["pageCount"] = json!(pages);
    }
    Ok(Json(body))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "OK", "message": "Server is running" }))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Route not found" })))
}
