use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use tracing::{debug, instrument};

use crate::config::HttpSettings;
use crate::error::ExtractionError;

// ── Constants ────────────────────────────────────────────────────────────────

// The site serves different markup to non-browser clients and other locales.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8";

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FetchedPage {
    /// URL after redirects; short links resolve to the canonical post.
    pub url: String,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

// ── HTTP fetch ───────────────────────────────────────────────────────────────

impl PageFetcher {
    pub fn new(settings: &HttpSettings) -> Result<Self, ExtractionError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
        );

        let builder = reqwest::ClientBuilder::new()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.page_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers);

        Ok(Self {
            client: build_client(builder, settings)?,
        })
    }

    /// One GET, no retry. Any non-2xx status is a failure.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, ExtractionError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "page request rejected");
            return Err(ExtractionError::Upstream(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(classify_request_error)?;
        debug!(final_url = %final_url, bytes = body.len(), "page fetched");

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

/// Apply the TLS and proxy settings both clients share, then build.
pub(crate) fn build_client(
    mut builder: reqwest::ClientBuilder,
    settings: &HttpSettings,
) -> Result<reqwest::Client, ExtractionError> {
    if settings.insecure_ssl {
        builder = builder.danger_accept_invalid_certs(true);
    }
    if let Some(proxy) = &settings.proxy {
        let proxy = reqwest::Proxy::all(proxy.as_str())
            .map_err(|e| ExtractionError::Request(format!("Invalid proxy: {}", e)))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| ExtractionError::Request(e.to_string()))
}

pub(crate) fn classify_request_error(e: reqwest::Error) -> ExtractionError {
    if e.is_timeout() {
        ExtractionError::Request(format!("TimeoutError: {}", e))
    } else if e.is_connect() {
        ExtractionError::Request(format!("ConnectError: {}", e))
    } else {
        ExtractionError::Request(format!("RequestError: {}", e))
    }
}
