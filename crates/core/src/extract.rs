//! Title and content heuristics.
//!
//! Both heuristics walk a priority-ordered rule table and stop at the first
//! rule whose result passes an explicit acceptance predicate. Table order is
//! the confidence ranking: semantic HTML5 tags first, common CMS class names
//! next, generic containers last.

use crate::parse::{Document, normalize_text};
use crate::postprocess::PostProcessConfig;
use crate::preprocess::{self, GLOBAL_NOISE, PreprocessConfig};
use crate::{FolioError, Result};

/// Title used when no rule and no `<title>` element yields text.
pub const UNTITLED: &str = "Untitled";

/// Where a title rule reads its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleSource {
    /// Text content of the element.
    Text,
    /// Value of the named attribute (e.g. `content` on a `<meta>` tag).
    Attribute(String),
}

/// One entry of the title priority table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRule {
    pub selector: String,
    pub source: TitleSource,
}

impl TitleRule {
    pub fn text(selector: &str) -> Self {
        Self { selector: selector.to_string(), source: TitleSource::Text }
    }

    pub fn attribute(selector: &str, attribute: &str) -> Self {
        Self { selector: selector.to_string(), source: TitleSource::Attribute(attribute.to_string()) }
    }
}

fn default_title_rules() -> Vec<TitleRule> {
    vec![
        TitleRule::text("h1"),
        TitleRule::text("article h1"),
        TitleRule::text(".post-title"),
        TitleRule::text(".article-title"),
        TitleRule::text("title"),
        TitleRule::attribute(r#"[property="og:title"]"#, "content"),
    ]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Configuration for content extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Title rules, highest confidence first.
    pub title_rules: Vec<TitleRule>,
    /// Title used when every rule and the `<title>` fallback come up empty.
    pub placeholder_title: String,
    /// Content container selectors, highest confidence first.
    pub content_selectors: Vec<String>,
    /// Selectors stripped from each candidate snapshot before measuring it.
    pub candidate_noise: Vec<String>,
    /// Selectors stripped from the body snapshot when no candidate is accepted.
    pub body_noise: Vec<String>,
    /// A candidate is accepted only when its serialized length exceeds this
    /// many characters. Shorter matches are treated as false positives.
    pub min_content_chars: usize,
    /// Global noise strip applied before parsing.
    pub preprocess: PreprocessConfig,
    /// Final cleanup of the accepted content.
    pub postprocess: PostProcessConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        let mut body_noise = strings(GLOBAL_NOISE);
        body_noise.push(".comments".to_string());

        Self {
            title_rules: default_title_rules(),
            placeholder_title: UNTITLED.to_string(),
            content_selectors: strings(&[
                "article",
                ".post-content",
                ".article-content",
                ".entry-content",
                "main",
                ".content",
                "#content",
                r#"[role="article"]"#,
            ]),
            candidate_noise: strings(&[
                "script",
                "style",
                "nav",
                ".comments",
                ".share-buttons",
                ".sidebar",
                ".related-posts",
            ]),
            body_noise,
            min_content_chars: 100,
            preprocess: PreprocessConfig::default(),
            postprocess: PostProcessConfig::default(),
        }
    }
}

impl ExtractConfig {
    /// Creates a new builder for ExtractConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use folio_core::ExtractConfig;
    ///
    /// let config = ExtractConfig::builder()
    ///     .min_content_chars(250)
    ///     .content_selectors(["article", "#post"])
    ///     .build();
    /// assert_eq!(config.content_selectors, vec!["article", "#post"]);
    /// ```
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::new()
    }

    /// Checks every selector table up front, so a bad table fails before
    /// any network access.
    pub fn validate(&self) -> Result<()> {
        for rule in &self.title_rules {
            scraper::Selector::parse(&rule.selector).map_err(|e| FolioError::InvalidSelector {
                selector: rule.selector.clone(),
                message: e.to_string(),
            })?;
        }
        for selector in &self.content_selectors {
            scraper::Selector::parse(selector)
                .map_err(|e| FolioError::InvalidSelector { selector: selector.clone(), message: e.to_string() })?;
        }
        preprocess::validate_selectors(&self.candidate_noise)?;
        preprocess::validate_selectors(&self.body_noise)?;
        preprocess::validate_selectors(&self.preprocess.noise_selectors)
    }
}

/// Builder for ExtractConfig.
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ExtractConfig::default() }
    }

    /// Replaces the title rule table.
    pub fn title_rules(mut self, rules: Vec<TitleRule>) -> Self {
        self.config.title_rules = rules;
        self
    }

    /// Sets the placeholder title.
    pub fn placeholder_title(mut self, value: impl Into<String>) -> Self {
        self.config.placeholder_title = value.into();
        self
    }

    /// Replaces the content selector table.
    pub fn content_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.content_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the candidate acceptance threshold.
    pub fn min_content_chars(mut self, value: usize) -> Self {
        self.config.min_content_chars = value;
        self
    }

    /// Sets whether a heading repeating the title is dropped from the content.
    pub fn dedupe_title_heading(mut self, value: bool) -> Self {
        self.config.postprocess.dedupe_title_heading = value;
        self
    }

    /// Sets whether links and images are made absolute against the page URL.
    pub fn resolve_urls(mut self, value: bool) -> Self {
        self.config.postprocess.resolve_urls = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ExtractConfig {
        self.config
    }
}

impl Default for ExtractConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Which rule produced the accepted content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// A container selector from the priority table.
    Selector(String),
    /// The whole body, used when no candidate passed the threshold.
    BodyFallback,
}

/// The content block chosen by [`resolve_content`], before final cleanup.
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    /// Serialized, noise-stripped HTML fragment.
    pub content: String,
    /// Rule that produced it.
    pub source: ContentSource,
}

/// Resolves the page title.
///
/// Walks [`ExtractConfig::title_rules`] and returns the first non-empty value,
/// reading only the first match of each rule. Falls back to the `<title>`
/// element and then to the placeholder, so the result is never empty.
pub fn resolve_title(doc: &Document, config: &ExtractConfig) -> Result<String> {
    for rule in &config.title_rules {
        let Some(element) = doc.select_first(&rule.selector)? else {
            continue;
        };

        let title = match &rule.source {
            TitleSource::Text => normalize_text(&element.text()),
            TitleSource::Attribute(name) => element.attr(name).map(normalize_text).unwrap_or_default(),
        };

        if !title.is_empty() {
            tracing::debug!(selector = %rule.selector, "title resolved");
            return Ok(title);
        }
    }

    if let Some(title) = doc.title() {
        return Ok(title);
    }

    tracing::debug!("no title found, using placeholder");
    Ok(config.placeholder_title.clone())
}

/// Takes a noise-stripped snapshot of the first element matching `selector`.
///
/// The document is never modified: the subtree is serialized and the copy is
/// stripped, so later candidates see the pristine tree.
pub fn candidate_snapshot(doc: &Document, selector: &str, noise: &[String]) -> Result<Option<String>> {
    match doc.select_first(selector)? {
        Some(element) => preprocess::strip_elements(&element.inner_html(), noise).map(Some),
        None => Ok(None),
    }
}

/// Resolves the content block.
///
/// Each container selector is tried in order; the first snapshot longer than
/// [`ExtractConfig::min_content_chars`] wins. When none qualifies the whole
/// body is used, whatever its length.
pub fn resolve_content(doc: &Document, config: &ExtractConfig) -> Result<ExtractedContent> {
    for selector in &config.content_selectors {
        let Some(snapshot) = candidate_snapshot(doc, selector, &config.candidate_noise)? else {
            continue;
        };

        let chars = snapshot.chars().count();
        if chars > config.min_content_chars {
            tracing::debug!(selector = %selector, chars, "content candidate accepted");
            return Ok(ExtractedContent { content: snapshot, source: ContentSource::Selector(selector.clone()) });
        }
        tracing::debug!(selector = %selector, chars, "content candidate below threshold");
    }

    tracing::warn!("no content candidate passed the threshold, falling back to body");
    let body = doc.body().map(|body| body.inner_html()).unwrap_or_default();
    let stripped = preprocess::strip_elements(&body, &config.body_noise)?;

    Ok(ExtractedContent { content: preprocess::remove_comments(&stripped), source: ContentSource::BodyFallback })
}
