//! Noise removal on serialized HTML.
//!
//! Everything here operates on strings through `lol_html` rewriters, so a
//! removal never touches a parsed [`Document`](crate::Document). Callers that
//! need a modified copy of a subtree serialize it first and strip the copy.
//!
//! The rewriter streams tags as written and does not infer end tags, so input
//! must be a serialization with every element explicitly closed. Raw pages go
//! through [`normalize_html`] first.

use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

use crate::{FolioError, Result};

/// Elements stripped from the whole page before any heuristic runs.
pub const GLOBAL_NOISE: &[&str] = &["script", "style", "nav", "header", "footer", "aside", ".advertisement", ".ads"];

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Configuration for the global noise strip.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Selectors removed from the raw page, together with their content.
    pub noise_selectors: Vec<String>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { noise_selectors: GLOBAL_NOISE.iter().map(|s| s.to_string()).collect() }
    }
}

/// Strips global noise from a raw page.
///
/// This runs once per extraction, before the heuristics, so the title and
/// content rules never see noise nodes. The page is normalized first, so an
/// unclosed `<p class="ads">` ends where the HTML parser ends it.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> Result<String> {
    strip_elements(&normalize_html(html), &config.noise_selectors)
}

/// Parses a page and serializes it back with every implied end tag written out.
pub fn normalize_html(html: &str) -> String {
    Html::parse_document(html).html()
}

/// Checks that every selector is accepted by the rewriter.
pub fn validate_selectors(selectors: &[String]) -> Result<()> {
    for selector in selectors {
        selector
            .parse::<lol_html::Selector>()
            .map_err(|e| FolioError::InvalidSelector { selector: selector.clone(), message: e.to_string() })?;
    }
    Ok(())
}

/// Removes every element matching any of `selectors`, content included.
pub fn strip_elements(html: &str, selectors: &[String]) -> Result<String> {
    if selectors.is_empty() {
        return Ok(html.to_string());
    }
    validate_selectors(selectors)?;

    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: selectors
                .iter()
                .map(|selector| {
                    lol_html::element!(selector.as_str(), |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter.write(html.as_bytes()).map_err(|e| FolioError::HtmlParseError(e.to_string()))?;
    rewriter.end().map_err(|e| FolioError::HtmlParseError(e.to_string()))?;

    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Removes HTML comment nodes.
pub fn remove_comments(html: &str) -> String {
    COMMENT_RE.replace_all(html, "").into_owned()
}
