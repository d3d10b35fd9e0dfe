use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::parse::normalize_text;
use crate::{FolioError, Result};

static SCRIPT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static STYLE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static STRAY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</?(?:script|style)\b[^>]*>").unwrap());
static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());

/// Configuration for the final cleanup of accepted content
#[derive(Debug, Clone)]
pub struct PostProcessConfig {
    /// Drop the first `<h1>` whose text equals the resolved title
    pub dedupe_title_heading: bool,
    /// Make `a[href]` and `img[src]` absolute against the page URL
    pub resolve_urls: bool,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self { dedupe_title_heading: true, resolve_urls: true }
    }
}

/// Final pass over an accepted content block.
///
/// Script and style blocks are removed last, after every other rewrite, so no
/// step can reintroduce them. The result is trimmed.
pub fn postprocess_html(html: &str, title: &str, base_url: &Url, config: &PostProcessConfig) -> Result<String> {
    let mut processed = html.to_string();

    if config.dedupe_title_heading {
        processed = remove_title_heading(&processed, title)?;
    }

    if config.resolve_urls {
        processed = convert_relative_urls(&processed, base_url)?;
    }

    Ok(strip_script_and_style(&processed).trim().to_string())
}

/// Remove `<script>` and `<style>` blocks, and any unpaired tags left behind
pub fn strip_script_and_style(html: &str) -> String {
    let without_scripts = SCRIPT_BLOCK_RE.replace_all(html, "");
    let without_styles = STYLE_BLOCK_RE.replace_all(&without_scripts, "");
    STRAY_TAG_RE.replace_all(&without_styles, "").into_owned()
}

/// Remove the first `<h1>` repeating the title.
///
/// The parser locates the heading by its position among all `<h1>` elements;
/// the rewriter then removes the element at that position, so markup quoted
/// inside attribute values is never matched.
fn remove_title_heading(html: &str, title: &str) -> Result<String> {
    let title = normalize_text(title);
    if title.is_empty() {
        return Ok(html.to_string());
    }

    let fragment = Html::parse_fragment(html);
    let Some(target) =
        fragment.select(&H1_SELECTOR).position(|h| normalize_text(&h.text().collect::<String>()) == title)
    else {
        return Ok(html.to_string());
    };

    let mut seen = 0;
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("h1", |el| {
                if seen == target {
                    el.remove();
                }
                seen += 1;
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter.write(html.as_bytes()).map_err(|e| FolioError::HtmlParseError(e.to_string()))?;
    rewriter.end().map_err(|e| FolioError::HtmlParseError(e.to_string()))?;

    Ok(String::from_utf8_lossy(&output).into_owned())
}

/// Convert relative link and image URLs to absolute URLs
pub fn convert_relative_urls(html: &str, base_url: &Url) -> Result<String> {
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                lol_html::element!("a[href]", |el| {
                    if let Some(href) = el.get_attribute("href")
                        && !href.starts_with('#')
                        && let Ok(absolute) = base_url.join(&href)
                    {
                        el.set_attribute("href", absolute.as_str()).ok();
                    }
                    Ok(())
                }),
                lol_html::element!("img[src]", |el| {
                    if let Some(src) = el.get_attribute("src")
                        && let Ok(absolute) = base_url.join(&src)
                    {
                        el.set_attribute("src", absolute.as_str()).ok();
                    }
                    Ok(())
                }),
            ],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter.write(html.as_bytes()).map_err(|e| FolioError::HtmlParseError(e.to_string()))?;
    rewriter.end().map_err(|e| FolioError::HtmlParseError(e.to_string()))?;

    Ok(String::from_utf8_lossy(&output).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/blog/").unwrap()
    }

    #[test]
    fn test_strip_script_and_style() {
        let html = r#"<p>a</p><SCRIPT type="text/javascript">var x = "<p>";</SCRIPT><style>
            p { color: red }
        </style><p>b</p><script src="x.js">"#;

        let result = strip_script_and_style(html);
        assert_eq!(result, "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_remove_title_heading() {
        let html = "<h1>Real Title</h1><p>Body</p>";
        assert_eq!(remove_title_heading(html, "Real Title").unwrap(), "<p>Body</p>");
    }

    #[test]
    fn test_remove_title_heading_only_first_match() {
        let html = "<h1>Same</h1><p>x</p><h1>Same</h1>";
        assert_eq!(remove_title_heading(html, "Same").unwrap(), "<p>x</p><h1>Same</h1>");
    }

    #[test]
    fn test_remove_title_heading_keeps_other_headings() {
        let html = "<h1>Chapter One</h1><p>Body</p>";
        assert_eq!(remove_title_heading(html, "Real Title").unwrap(), html);
    }

    #[test]
    fn test_remove_title_heading_ignores_markup_in_attributes() {
        let html = r#"<p><img alt="<h1>Real Title</h1>"></p><h1>Real Title</h1><p>Body</p>"#;
        assert_eq!(
            remove_title_heading(html, "Real Title").unwrap(),
            r#"<p><img alt="<h1>Real Title</h1>"></p><p>Body</p>"#
        );
    }

    #[test]
    fn test_remove_title_heading_skips_earlier_headings() {
        let html = "<h1>Intro</h1><h1>  Real\n Title </h1><p>Body</p>";
        assert_eq!(remove_title_heading(html, "Real Title").unwrap(), "<h1>Intro</h1><p>Body</p>");
    }

    #[test]
    fn test_convert_relative_urls() {
        let html = r##"<a href="/about">About</a><a href="post.html">Post</a><a href="#top">Top</a><img src="image.jpg">"##;

        let result = convert_relative_urls(html, &base()).unwrap();
        assert!(result.contains(r#"href="https://example.com/about""#));
        assert!(result.contains(r#"href="https://example.com/blog/post.html""#));
        assert!(result.contains(r##"href="#top""##));
        assert!(result.contains(r#"src="https://example.com/blog/image.jpg""#));
    }

    #[test]
    fn test_postprocess_full_pipeline() {
        let html = "  <h1>T</h1><p>Body <a href=\"/x\">x</a></p><script>evil()</script>  ";
        let result = postprocess_html(html, "T", &base(), &PostProcessConfig::default()).unwrap();
        assert_eq!(result, r#"<p>Body <a href="https://example.com/x">x</a></p>"#);
    }

    #[test]
    fn test_postprocess_preserves_heading_when_disabled() {
        let config = PostProcessConfig { dedupe_title_heading: false, resolve_urls: false };
        let result = postprocess_html("<h1>T</h1><p>Body</p>", "T", &base(), &config).unwrap();
        assert_eq!(result, "<h1>T</h1><p>Body</p>");
    }
}
