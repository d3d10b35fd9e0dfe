//! Main extraction API.
//!
//! [`Extractor`] runs the whole pipeline: validate the URL, fetch the page,
//! strip global noise, resolve the title, resolve the content block and clean
//! it up. The only suspension point is the fetch.
//!
//! # Example
//!
//! ```rust,no_run
//! use folio_core::Extractor;
//!
//! # #[tokio::main]
//! # async fn main() -> folio_core::Result<()> {
//! let extractor = Extractor::new()?;
//! let result = extractor.extract("https://example.com/article").await?;
//! println!("{}: {} bytes", result.title, result.content.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::extract::{ExtractConfig, resolve_content, resolve_title};
use crate::fetch::{FetchConfig, HttpFetcher, ReqwestFetcher, validate_url};
use crate::parse::Document;
use crate::postprocess::postprocess_html;
use crate::result::ExtractionResult;
use crate::{FolioError, Result, Stage};

/// Extracts the readable title and body of web pages.
///
/// An `Extractor` holds only immutable configuration and a fetcher, so one
/// instance can serve concurrent calls; each call owns its own document.
#[derive(Clone)]
pub struct Extractor {
    config: ExtractConfig,
    fetcher: Arc<dyn HttpFetcher>,
}

impl Extractor {
    /// Creates an extractor with default heuristics and a `reqwest` fetcher.
    pub fn new() -> Result<Self> {
        Self::with_fetch_config(ExtractConfig::default(), FetchConfig::default())
    }

    /// Creates an extractor with custom heuristics and fetch settings.
    pub fn with_fetch_config(config: ExtractConfig, fetch_config: FetchConfig) -> Result<Self> {
        let fetcher = ReqwestFetcher::new(fetch_config)?;
        Self::with_fetcher(config, Arc::new(fetcher))
    }

    /// Creates an extractor that retrieves pages through `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::InvalidSelector`] if any selector table in
    /// `config` is invalid.
    pub fn with_fetcher(config: ExtractConfig, fetcher: Arc<dyn HttpFetcher>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Fetches `url` and extracts its title and content.
    ///
    /// # Errors
    ///
    /// - [`FolioError::InvalidInput`] for a malformed URL, before any request.
    /// - [`FolioError::Fetch`] and the other fetch-stage errors when retrieval fails.
    /// - [`FolioError::ExtractionFailed`] when no content survives cleanup.
    pub async fn extract(&self, url: &str) -> Result<ExtractionResult> {
        self.extract_with_cancel(url, &CancellationToken::new()).await
    }

    /// Like [`extract`](Self::extract), abandoning the fetch when `cancel` fires.
    pub async fn extract_with_cancel(&self, url: &str, cancel: &CancellationToken) -> Result<ExtractionResult> {
        let url = validate_url(url)?;

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FolioError::Cancelled { stage: Stage::Fetch }),
            fetched = self.fetcher.fetch(&url) => fetched?,
        };

        self.extract_document(&fetched.raw_html, &url, &fetched.final_url)
    }

    /// Extracts from HTML that was already retrieved from `url`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use folio_core::Extractor;
    ///
    /// let html = "<html><head><title>T</title></head><body><p>Hello</p></body></html>";
    /// let extractor = Extractor::new().unwrap();
    /// let result = extractor.extract_html(html, "https://example.com/").unwrap();
    /// assert_eq!(result.title, "T");
    /// assert_eq!(result.content, "<p>Hello</p>");
    /// ```
    pub fn extract_html(&self, html: &str, url: &str) -> Result<ExtractionResult> {
        let url = validate_url(url)?;
        self.extract_document(html, &url, &url)
    }

    fn extract_document(&self, html: &str, url: &Url, base_url: &Url) -> Result<ExtractionResult> {
        let doc = Document::parse_sanitized(html, &self.config.preprocess)?;

        let title = resolve_title(&doc, &self.config)?;
        let extracted = resolve_content(&doc, &self.config)?;
        let content = postprocess_html(&extracted.content, &title, base_url, &self.config.postprocess)?;

        if content.is_empty() {
            return Err(FolioError::ExtractionFailed);
        }

        tracing::info!(url = %url, source = ?extracted.source, chars = content.len(), "extracted content");

        Ok(ExtractionResult::new(title, content, url.to_string()))
    }
}

/// Convenience function: fetch and extract with default settings.
pub async fn extract(url: &str) -> Result<ExtractionResult> {
    Extractor::new()?.extract(url).await
}
