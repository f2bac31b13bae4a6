use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, warn};
use url::Url;

use crate::config::Config;
use crate::download::ImageDownloader;
use crate::error::ExtractionError;
use crate::extract;
use crate::fetch::PageFetcher;
use crate::models::{ExtractResponse, ExtractTextRequest, ExtractUrlRequest, ExtractedContent};

// ── Shared state ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: PageFetcher,
    pub downloader: ImageDownloader,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ExtractionError> {
        Ok(Self {
            fetcher: PageFetcher::new(&config.http)?,
            downloader: ImageDownloader::new(&config.http)?,
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/extract", post(extract_text_endpoint))
        .route("/extract/url", post(extract_url_endpoint))
        .with_state(state)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn root() -> impl IntoResponse {
    Json(json!({"message": "Xiaohongshu content extraction API"}))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn extract_text_endpoint(
    State(state): State<AppState>,
    Json(req): Json<ExtractTextRequest>,
) -> Response {
    respond(run_text_extraction(&state, req).await)
}

async fn extract_url_endpoint(
    State(state): State<AppState>,
    Json(req): Json<ExtractUrlRequest>,
) -> Response {
    respond(run_url_extraction(&state, req).await)
}

async fn run_text_extraction(
    state: &AppState,
    req: ExtractTextRequest,
) -> Result<ExtractResponse, ExtractionError> {
    let (url, content) = extract::extract_from_text(&state.fetcher, &req.text).await?;
    finish(state, url, content, req.download_images, req.save_dir.as_deref()).await
}

async fn run_url_extraction(
    state: &AppState,
    req: ExtractUrlRequest,
) -> Result<ExtractResponse, ExtractionError> {
    validate_url(&req.url)?;
    let content = extract::extract_post(&state.fetcher, &req.url).await?;
    finish(state, req.url, content, req.download_images, req.save_dir.as_deref()).await
}

// ── Shared request tail ──────────────────────────────────────────────────────

async fn finish(
    state: &AppState,
    source_url: String,
    content: ExtractedContent,
    download_images: bool,
    save_dir: Option<&str>,
) -> Result<ExtractResponse, ExtractionError> {
    // A record with neither title nor description is not a usable extraction.
    if !content.has_text() {
        warn!(url = %source_url, "extraction yielded no title or description");
        return Err(ExtractionError::ExtractionEmpty);
    }

    let mut saved_images = None;
    if download_images && !content.image_urls.is_empty() {
        let dir = resolve_save_dir(&state.config.image_root, save_dir)?;
        let paths = state.downloader.download_all(&content.image_urls, &dir).await;
        if paths.is_empty() {
            return Err(ExtractionError::ImageDownloadFailed(content.image_urls.len()));
        }
        info!(
            saved = paths.len(),
            requested = content.image_urls.len(),
            dir = %dir.display(),
            "images saved"
        );
        saved_images = Some(
            paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        );
    }

    Ok(ExtractResponse {
        content,
        source_url,
        saved_images,
    })
}

fn respond(result: Result<ExtractResponse, ExtractionError>) -> Response {
    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            let status = match &e {
                ExtractionError::NoUrlFound
                | ExtractionError::InvalidUrl(_)
                | ExtractionError::InvalidSaveDir(_) => StatusCode::BAD_REQUEST,
                ExtractionError::Unparseable | ExtractionError::ExtractionEmpty => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ExtractionError::Upstream(_) | ExtractionError::Request(_) => {
                    StatusCode::BAD_GATEWAY
                }
                ExtractionError::ImageDownloadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let detail = match &e {
                ExtractionError::Request(msg) => format!("Upstream request failed: {}", msg),
                other => other.to_string(),
            };
            warn!(%status, error = %e, "extraction request failed");
            (status, Json(json!({"detail": detail}))).into_response()
        }
    }
}

// ── Input validation ─────────────────────────────────────────────────────────

fn validate_url(url: &str) -> Result<(), ExtractionError> {
    let parsed =
        Url::parse(url).map_err(|_| ExtractionError::InvalidUrl("Invalid URL".to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ExtractionError::InvalidUrl(
            "Only http and https URLs are allowed".to_string(),
        ));
    }
    Ok(())
}

/// Resolve a request's `save_dir` under the configured image root.
fn resolve_save_dir(root: &Path, save_dir: Option<&str>) -> Result<PathBuf, ExtractionError> {
    let Some(relative) = save_dir.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(root.to_path_buf());
    };
    let relative = Path::new(relative);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ExtractionError::InvalidSaveDir(
            "save_dir must be a relative path inside the image directory".to_string(),
        ));
    }
    Ok(root.join(relative))
}
