//! Error types for Folio operations.
//!
//! This module defines the main error type [`FolioError`] which represents
//! every failure of the extraction and pagination pipelines, and [`Stage`],
//! which names the pipeline step a failure belongs to.
//!
//! # Example
//!
//! ```rust
//! use folio_core::{FolioError, Result, Stage};
//!
//! fn require_content(html: &str) -> Result<&str> {
//!     if html.trim().is_empty() {
//!         return Err(FolioError::EmptyContent);
//!     }
//!     Ok(html)
//! }
//!
//! let err = require_content("   ").unwrap_err();
//! assert_eq!(err.stage(), Stage::Render);
//! ```

use std::fmt;

use thiserror::Error;

/// Pipeline step a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Input validation before any work is done.
    Validate,
    /// Network retrieval of the page.
    Fetch,
    /// HTML sanitizing and DOM construction.
    Parse,
    /// Title and content heuristics.
    Extract,
    /// Surface construction and raster capture.
    Render,
    /// Page document assembly and serialization.
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validate => "validate",
            Stage::Fetch => "fetch",
            Stage::Parse => "parse",
            Stage::Extract => "extract",
            Stage::Render => "render",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// Main error type for extraction and pagination.
///
/// # Example
///
/// ```rust,no_run
/// use folio_core::{FolioError, Extractor};
///
/// # async fn run() -> folio_core::Result<()> {
/// let extractor = Extractor::new()?;
/// match extractor.extract("https://example.com/post").await {
///     Ok(result) => println!("{}", result.title),
///     Err(FolioError::Fetch { status: Some(status), .. }) => println!("upstream said {status}"),
///     Err(e) => println!("{} failed: {}", e.stage(), e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum FolioError {
    /// The caller supplied a missing or malformed value.
    ///
    /// Raised for empty URLs, unparseable URLs and non-http(s) schemes
    /// before any network access happens.
    #[error("{0}")]
    InvalidInput(String),

    /// The remote server answered with a non-success status.
    #[error("Failed to fetch URL: {message}")]
    Fetch { status: Option<u16>, message: String },

    /// HTTP transport errors from reqwest (DNS, TLS, connection resets).
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The response body is larger than the configured cap.
    #[error("Response body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The response declared a content type that is not HTML.
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// HTML could not be rewritten or parsed.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// A configured CSS selector is not valid.
    #[error("Invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },

    /// Every heuristic ran and the content is still empty.
    #[error("Unable to extract content from the webpage")]
    ExtractionFailed,

    /// Pagination was asked to render blank content.
    #[error("Content is empty")]
    EmptyContent,

    /// The render surface could not be captured.
    #[error("Render failed: {0}")]
    Render(String),

    /// The paginated document could not be assembled or saved.
    #[error("Write failed: {0}")]
    Write(String),

    /// A cancellation token fired while the pipeline was suspended.
    #[error("Cancelled during {stage}")]
    Cancelled { stage: Stage },
}

impl FolioError {
    /// Returns the pipeline stage that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            FolioError::InvalidInput(_) => Stage::Validate,
            FolioError::Fetch { .. }
            | FolioError::HttpError(_)
            | FolioError::Timeout { .. }
            | FolioError::BodyTooLarge { .. }
            | FolioError::UnsupportedContentType(_) => Stage::Fetch,
            FolioError::HtmlParseError(_) | FolioError::InvalidSelector { .. } => Stage::Parse,
            FolioError::ExtractionFailed => Stage::Extract,
            FolioError::EmptyContent | FolioError::Render(_) => Stage::Render,
            FolioError::Write(_) => Stage::Write,
            FolioError::Cancelled { stage } => *stage,
        }
    }
}

/// Result type alias for FolioError.
pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FolioError::InvalidInput("Invalid URL format".to_string());
        assert_eq!(err.to_string(), "Invalid URL format");
    }

    #[test]
    fn test_fetch_error_message() {
        let err = FolioError::Fetch { status: Some(404), message: "Not Found".to_string() };
        assert!(err.to_string().contains("Not Found"));
        assert_eq!(err.stage(), Stage::Fetch);
    }

    #[test]
    fn test_timeout_error() {
        let err = FolioError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(FolioError::ExtractionFailed.stage(), Stage::Extract);
        assert_eq!(FolioError::EmptyContent.stage(), Stage::Render);
        assert_eq!(FolioError::Write("disk full".into()).stage(), Stage::Write);
        assert_eq!(FolioError::HtmlParseError("bad".into()).stage().to_string(), "parse");
    }

    #[test]
    fn test_cancelled_keeps_stage() {
        let err = FolioError::Cancelled { stage: Stage::Render };
        assert_eq!(err.stage(), Stage::Render);
        assert_eq!(err.to_string(), "Cancelled during render");
    }
}
