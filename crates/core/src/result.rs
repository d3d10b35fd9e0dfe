//! Extraction output and its renderings.
//!
//! [`ExtractionResult`] is the value returned by the extractor and the body
//! of a successful wire response.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::parse::Document;

/// Output format options for extracted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The extracted HTML fragment.
    Html,
    /// Markdown converted from the fragment, title as a level-one heading.
    Markdown,
    /// Plain text (all tags stripped).
    PlainText,
    /// The `{title, content, url}` object.
    Json,
}

/// Readable title and body of one page.
///
/// Invariants: `title` is non-empty plain text and `content` is a non-empty
/// HTML fragment without `<script>` or `<style>` elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Resolved page title.
    pub title: String,
    /// Cleaned HTML fragment.
    pub content: String,
    /// Normalized request URL.
    pub url: String,
}

impl ExtractionResult {
    pub fn new(title: String, content: String, url: String) -> Self {
        Self { title, content, url }
    }

    /// Text of the content with every tag stripped.
    pub fn text_content(&self) -> String {
        Document::parse(&self.content).text_content()
    }

    /// Converts content to the specified format.
    pub fn to_format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Html => Ok(self.content.clone()),
            OutputFormat::Markdown => self.to_markdown(),
            OutputFormat::PlainText => Ok(self.text_content()),
            OutputFormat::Json => self.to_json(),
        }
    }

    /// Gets content as Markdown, prefixed by the title heading.
    pub fn to_markdown(&self) -> Result<String> {
        Ok(format!("# {}\n\n{}", self.title, html_to_markdown(&self.content)?))
    }

    /// Gets the result as a JSON object string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| crate::FolioError::Write(e.to_string()))
    }
}

/// Convert HTML to Markdown using htmd crate
#[cfg(feature = "markdown")]
fn html_to_markdown(html: &str) -> Result<String> {
    htmd::convert(html).map_err(|e| crate::FolioError::Write(format!("markdown conversion: {e}")))
}

/// Fallback HTML to text conversion when markdown feature is disabled
#[cfg(not(feature = "markdown"))]
fn html_to_markdown(html: &str) -> Result<String> {
    Ok(Document::parse(html).text_content())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractionResult {
        ExtractionResult::new(
            "Test Article".to_string(),
            "<p>This is a <strong>test</strong> article.</p>".to_string(),
            "https://example.com/".to_string(),
        )
    }

    #[test]
    fn test_text_content() {
        assert_eq!(sample().text_content(), "This is a test article.");
    }

    #[test]
    fn test_to_format_html() {
        let result = sample();
        assert_eq!(result.to_format(OutputFormat::Html).unwrap(), result.content);
    }

    #[test]
    fn test_serialization_shape() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["title"], "Test Article");
        assert_eq!(json["url"], "https://example.com/");
        assert!(json["content"].as_str().unwrap().starts_with("<p>"));
        assert_eq!(json.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_to_markdown_has_title_heading() {
        let markdown = sample().to_markdown().unwrap();
        assert!(markdown.starts_with("# Test Article\n\n"));
        assert!(markdown.contains("test"));
    }

    #[test]
    fn test_to_format_markdown_propagates_result() {
        let markdown = sample().to_format(OutputFormat::Markdown).unwrap();
        assert_eq!(markdown, sample().to_markdown().unwrap());
        assert!(markdown.contains("**test**"));
    }
}
