//! Page retrieval over HTTP.
//!
//! [`validate_url`] enforces the request invariant (absolute http/https URL)
//! before any network access. [`HttpFetcher`] is the seam the extractor calls
//! through; [`ReqwestFetcher`] is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use url::Url;

use crate::{FolioError, Result};

/// Desktop browser identification. Many sites refuse requests from agents
/// that do not look like a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Accept-Language header sent with every request.
    pub accept_language: String,
    /// Largest response body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: BROWSER_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.9,zh-CN;q=0.8".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// A successfully retrieved page, owned by a single extraction call.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// URL after redirects.
    pub final_url: Url,
    /// Response body decoded with the declared charset, UTF-8 otherwise.
    pub raw_html: String,
    /// HTTP status code of the final response.
    pub http_status: u16,
    /// Declared `Content-Type`, if any.
    pub content_type: Option<String>,
}

/// Retrieves a page for the extractor.
///
/// Implementations must return [`FolioError::Fetch`] for non-2xx responses
/// so the upstream status reaches the caller.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument>;
}

/// Validates an extraction URL.
///
/// The URL must be non-empty, absolute, use the `http` or `https` scheme and
/// name a host. Every failure is [`FolioError::InvalidInput`].
pub fn validate_url(url: &str) -> Result<Url> {
    let url = url.trim();
    if url.is_empty() {
        return Err(FolioError::InvalidInput("URL is required".to_string()));
    }

    let parsed = Url::parse(url).map_err(|e| FolioError::InvalidInput(format!("Invalid URL format: {}", e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FolioError::InvalidInput(format!(
            "Invalid URL format: unsupported scheme {:?} (expected http or https)",
            parsed.scheme()
        )));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(FolioError::InvalidInput("Invalid URL format: missing host".to_string()));
    }

    Ok(parsed)
}

/// Returns true when a `Content-Type` value names an HTML (or untyped text) body.
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    matches!(mime.as_str(), "" | "text/html" | "application/xhtml+xml" | "text/plain")
}

/// Extracts the `charset` parameter of a `Content-Type` value.
pub fn content_type_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim().eq_ignore_ascii_case("charset").then(|| value.trim().trim_matches('"'))
    })
}

/// Decodes a body by its declared charset.
///
/// Unknown or missing labels fall back to UTF-8. A byte order mark takes
/// precedence over the label and malformed sequences become U+FFFD.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(content_type_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

/// [`HttpFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    config: FetchConfig,
}

impl ReqwestFetcher {
    /// Builds a client with the configured timeout and User-Agent.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FolioError::HttpError)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn transport_error(&self, err: reqwest::Error) -> FolioError {
        if err.is_timeout() { FolioError::Timeout { timeout: self.config.timeout } } else { FolioError::HttpError(err) }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedDocument> {
        let mut response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(ACCEPT_LANGUAGE, &self.config.accept_language)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FolioError::Fetch {
                status: Some(status.as_u16()),
                message: status.canonical_reason().unwrap_or("unexpected status").to_string(),
            });
        }

        let content_type =
            response.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).map(str::to_string);
        if let Some(content_type) = &content_type
            && !is_html_content_type(content_type)
        {
            return Err(FolioError::UnsupportedContentType(content_type.clone()));
        }

        let limit = self.config.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(FolioError::BodyTooLarge { limit });
        }

        let final_url = response.url().clone();
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.transport_error(e))? {
            if body.len() + chunk.len() > limit {
                return Err(FolioError::BodyTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(url = %final_url, status = status.as_u16(), bytes = body.len(), "fetched page");

        Ok(FetchedDocument {
            final_url,
            raw_html: decode_body(&body, content_type.as_deref()),
            http_status: status.as_u16(),
            content_type,
        })
    }
}
