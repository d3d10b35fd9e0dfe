//! HTML parsing and DOM queries.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! HTML and navigating the DOM tree using CSS selectors. A `Document` is
//! read-only: subtrees are copied out by serializing them, never edited in place.
//!
//! # Example
//!
//! ```rust
//! use folio_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html);
//! let paragraph = doc.select_first("p.content").unwrap().unwrap();
//! assert_eq!(paragraph.text(), "Paragraph");
//! ```

use scraper::{Html, Selector};

use crate::preprocess::{self, PreprocessConfig};
use crate::{FolioError, Result};

/// Represents a parsed HTML document.
///
/// # Example
///
/// ```rust
/// use folio_core::parse::Document;
///
/// let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html);
/// assert_eq!(doc.title(), Some("Test".to_string()));
/// ```
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string without sanitizing.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Strips global noise from the raw page, then parses it.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::InvalidSelector`] if a configured noise selector is
    /// invalid, or [`FolioError::HtmlParseError`] if the page cannot be rewritten.
    pub fn parse_sanitized(html: &str, config: &PreprocessConfig) -> Result<Self> {
        let cleaned = preprocess::preprocess_html(html, config)?;
        Ok(Self::parse(&cleaned))
    }

    /// Selects the first element in document order matching a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::InvalidSelector`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use folio_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html);
    /// let first = doc.select_first("p.content").unwrap().unwrap();
    /// assert_eq!(first.text(), "First");
    /// ```
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Gets the trimmed text of the `<title>` element, if present and non-empty.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| normalize_text(&el.text().collect::<String>()))
            .filter(|title| !title.is_empty())
    }

    /// Gets the `<body>` element. The HTML parser always synthesizes one.
    pub fn body(&'_ self) -> Option<Element<'_>> {
        let selector = Selector::parse("body").ok()?;
        self.html.select(&selector).next().map(|el| Element { element: el })
    }

    /// Gets all text content from the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

/// A wrapper around scraper's ElementRef.
///
/// # Example
///
/// ```rust
/// use folio_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html);
/// let link = doc.select_first("a").unwrap().unwrap();
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Serializes the children of this element.
    ///
    /// The returned string is an independent snapshot of the subtree; editing
    /// it never affects the document.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the concatenated text nodes within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element.value().attr(name)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| FolioError::InvalidSelector { selector: selector.to_string(), message: e.to_string() })
}

/// Trims and collapses internal whitespace runs into single spaces.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
