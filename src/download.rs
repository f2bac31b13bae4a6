use std::path::{Path, PathBuf};

use reqwest::header::CONTENT_TYPE;
use tracing::{info, warn};
use url::Url;

use crate::config::HttpSettings;
use crate::error::ExtractionError;
use crate::fetch::{build_client, classify_request_error};

// ── Constants ────────────────────────────────────────────────────────────────

const DEFAULT_EXTENSION: &str = ".jpg";
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];
const CONTENT_TYPE_EXTENSIONS: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/webp", ".webp"),
];

// ── Per-image failure ────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum ImageError {
    #[error("{0}")]
    Request(ExtractionError),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("write failed for {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ── Downloader ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ImageDownloader {
    client: reqwest::Client,
}

impl ImageDownloader {
    pub fn new(settings: &HttpSettings) -> Result<Self, ExtractionError> {
        let builder = reqwest::ClientBuilder::new()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.image_timeout);
        Ok(Self {
            client: build_client(builder, settings)?,
        })
    }

    /// Download every URL into `dir`, returning the paths that were written.
    ///
    /// A failed image is logged and skipped; the rest of the batch continues.
    /// The result keeps input order and may be shorter than `urls`.
    pub async fn download_all(&self, urls: &[String], dir: &Path) -> Vec<PathBuf> {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!(dir = %dir.display(), error = %e, "cannot create image directory");
            return Vec::new();
        }

        let mut written = Vec::with_capacity(urls.len());
        for (index, url) in urls.iter().enumerate() {
            match self.download_one(index, url, dir).await {
                Ok(path) => {
                    info!(path = %path.display(), "downloaded image");
                    written.push(path);
                }
                Err(e) => warn!(url = %url, error = %e, "skipping image"),
            }
        }
        written
    }

    async fn download_one(&self, index: usize, url: &str, dir: &Path) -> Result<PathBuf, ImageError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageError::Request(classify_request_error(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status(status.as_u16()));
        }

        let extension = extension_for_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::Request(classify_request_error(e)))?;

        let path = dir.join(file_name_for(url, index, extension));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| ImageError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

// ── File naming ──────────────────────────────────────────────────────────────

/// Extension inferred from a `Content-Type` header, `.jpg` when unknown.
pub fn extension_for_content_type(content_type: Option<&str>) -> &'static str {
    let content_type = content_type.unwrap_or("").to_ascii_lowercase();
    CONTENT_TYPE_EXTENSIONS
        .iter()
        .find(|(mime, _)| content_type.contains(mime))
        .map(|(_, ext)| *ext)
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Local file name for the image at `index` (0-based) in the batch.
///
/// Uses the URL's last path segment, or `image_<n>` when there is none, and
/// appends `extension` unless the name already ends in an image extension.
pub fn file_name_for(url: &str, index: usize, extension: &str) -> String {
    let base = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.last().map(str::to_string))
        })
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| format!("image_{}", index + 1));

    let lower = base.to_ascii_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        base
    } else {
        format!("{}{}", base, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::time::Duration;
    use tempfile::TempDir;

    fn downloader() -> ImageDownloader {
        ImageDownloader::new(&HttpSettings::default()).unwrap()
    }

    #[test]
    fn content_type_maps_to_extension() {
        assert_eq!(extension_for_content_type(Some("image/jpeg")), ".jpg");
        assert_eq!(extension_for_content_type(Some("image/png")), ".png");
        assert_eq!(extension_for_content_type(Some("image/webp; q=1")), ".webp");
        assert_eq!(extension_for_content_type(Some("text/plain")), ".jpg");
        assert_eq!(extension_for_content_type(None), ".jpg");
    }

    #[test]
    fn file_name_from_last_segment() {
        assert_eq!(
            file_name_for("https://ci.xiaohongshu.com/abc/photo.PNG", 0, ".jpg"),
            "photo.PNG"
        );
        assert_eq!(
            file_name_for("https://sns-webpic.xhscdn.com/202410/1040g2sg!nd_dft_wlteh_webp_3", 0, ".webp"),
            "1040g2sg!nd_dft_wlteh_webp_3.webp"
        );
        assert_eq!(
            file_name_for("https://img.example/a/b.jpeg?x=1", 2, ".png"),
            "b.jpeg"
        );
    }

    #[test]
    fn file_name_synthesized_without_path_segment() {
        assert_eq!(file_name_for("https://img.example/", 0, ".png"), "image_1.png");
        assert_eq!(file_name_for("https://img.example", 2, ".jpg"), "image_3.jpg");
        assert_eq!(file_name_for("https://img.example/dir/", 4, ".webp"), "image_5.webp");
    }

    #[tokio::test]
    async fn png_without_extension_is_saved_as_png() {
        let mut server = Server::new_async().await;
        let _image = server
            .mock("GET", "/img/abc")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body([0x89u8, b'P', b'N', b'G'])
            .create_async()
            .await;
        let dir = TempDir::new().unwrap();

        let paths = downloader()
            .download_all(&[format!("{}/img/abc", server.url())], dir.path())
            .await;
        assert_eq!(paths, vec![dir.path().join("abc.png")]);
        assert_eq!(std::fs::read(&paths[0]).unwrap(), vec![0x89u8, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn unknown_content_type_defaults_to_jpg() {
        let mut server = Server::new_async().await;
        let _image = server
            .mock("GET", "/img/plain")
            .with_status(200)
            .with_header("content-type", "text/plain")
            .with_body("not really an image")
            .create_async()
            .await;
        let dir = TempDir::new().unwrap();

        let paths = downloader()
            .download_all(&[format!("{}/img/plain", server.url())], dir.path())
            .await;
        assert_eq!(paths.len(), 1);
        assert!(paths[0].to_string_lossy().ends_with("plain.jpg"));
    }

    #[tokio::test]
    async fn failed_image_is_skipped_and_order_kept() {
        let mut server = Server::new_async().await;
        let mut mocks = Vec::new();
        for (path, status) in [("/img/one", 200), ("/img/two", 404), ("/img/three", 200)] {
            let mock = server
                .mock("GET", path)
                .with_status(status)
                .with_header("content-type", "image/jpeg")
                .with_body("jpeg")
                .create_async()
                .await;
            mocks.push(mock);
        }
        let dir = TempDir::new().unwrap();
        let urls: Vec<String> = ["one", "two", "three"]
            .iter()
            .map(|n| format!("{}/img/{}", server.url(), n))
            .collect();

        let paths = downloader().download_all(&urls, dir.path()).await;
        assert_eq!(
            paths,
            vec![dir.path().join("one.jpg"), dir.path().join("three.jpg")]
        );
        assert!(!dir.path().join("two.jpg").exists());
    }

    #[tokio::test]
    async fn creates_missing_directories_idempotently() {
        let mut server = Server::new_async().await;
        let image = server
            .mock("GET", "/img/x.webp")
            .with_status(200)
            .with_header("content-type", "image/webp")
            .with_body("webp")
            .expect(2)
            .create_async()
            .await;
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a").join("b");
        let urls = vec![format!("{}/img/x.webp", server.url())];

        let first = downloader().download_all(&urls, &nested).await;
        let second = downloader().download_all(&urls, &nested).await;
        assert_eq!(first, vec![nested.join("x.webp")]);
        assert_eq!(first, second);
        image.assert_async().await;
    }

    #[tokio::test]
    async fn all_failures_yield_empty_result() {
        let dir = TempDir::new().unwrap();
        let urls = vec!["not a url".to_string(), "http://127.0.0.1:9/x.jpg".to_string()];
        assert!(downloader().download_all(&urls, dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn timed_out_image_is_skipped() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let stalled = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });
        let mut server = Server::new_async().await;
        let _fast = server
            .mock("GET", "/img/fast.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body("png")
            .create_async()
            .await;
        let settings = HttpSettings {
            image_timeout: Duration::from_secs(1),
            ..HttpSettings::default()
        };
        let dir = TempDir::new().unwrap();
        let urls = vec![
            format!("http://{}/img/slow.png", stalled),
            format!("{}/img/fast.png", server.url()),
        ];

        let paths = ImageDownloader::new(&settings)
            .unwrap()
            .download_all(&urls, dir.path())
            .await;
        assert_eq!(paths, vec![dir.path().join("fast.png")]);
    }
}
