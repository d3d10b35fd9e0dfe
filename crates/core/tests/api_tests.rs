//! Library API integration tests
use std::sync::Arc;
use std::time::Duration;

use folio_core::testing::{RecordingWriter, SolidCapture, StaticFetcher};
use folio_core::*;

const FIXTURES: &[&str] =
    &["article.html", "short_candidates.html", "cms_post.html", "noisy.html", "cjk.html", "empty_content.html"];

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

fn offline_extractor() -> Extractor {
    Extractor::with_fetcher(ExtractConfig::default(), Arc::new(StaticFetcher::new())).unwrap()
}

fn sanitized(html: &str) -> Document {
    Document::parse_sanitized(html, &PreprocessConfig::default()).unwrap()
}

#[test]
fn test_article_fixture() {
    let result = offline_extractor().extract_html(&fixture("article.html"), "https://notes.example.com/posts/ownership").unwrap();

    assert_eq!(result.title, "Understanding Ownership");
    assert!(result.content.contains("Ownership is a set of rules"));
    assert!(result.content.contains("Borrowing lets code refer to a value"));
    assert!(result.content.contains(r#"src="https://notes.example.com/images/ownership.png""#));
    assert!(result.content.contains(r#"href="https://notes.example.com/tags/memory""#));
    assert!(!result.content.contains("<h1>Understanding Ownership</h1>"));
    assert!(!result.content.contains("Share this post"));
    assert!(!result.content.contains("Previous post"));
    assert!(!result.content.contains("Great write-up"));
    assert!(!result.content.contains("injected"));
}

#[test]
fn test_short_candidates_fall_back_to_body() {
    let html = fixture("short_candidates.html");
    let doc = sanitized(&html);

    let extracted = resolve_content(&doc, &ExtractConfig::default()).unwrap();
    assert_eq!(extracted.source, ContentSource::BodyFallback);

    let result = offline_extractor().extract_html(&html, "https://example.com/").unwrap();
    assert_eq!(result.title, "Fallback Page");
    assert!(result.content.contains("keeps its real text in a plain wrapper"));
    assert!(result.content.contains("Too short."));
    assert!(!result.content.contains("First!"));
    assert!(!result.content.contains("tracking pixel"));
    assert!(!result.content.contains("Footer links"));
}

#[test]
fn test_cms_post_fixture() {
    let html = fixture("cms_post.html");
    let doc = sanitized(&html);

    let extracted = resolve_content(&doc, &ExtractConfig::default()).unwrap();
    assert_eq!(extracted.source, ContentSource::Selector(".post-content".to_string()));

    let result = offline_extractor().extract_html(&html, "https://example.com/notes/2-0").unwrap();
    assert_eq!(result.title, "Release Notes for Version 2.0");
    assert!(result.content.contains("redesigned configuration format"));
    assert!(!result.content.contains("Release Notes for 1.9"));
    assert!(!result.content.contains("newsletter"));
}

#[test]
fn test_noisy_fixture() {
    let result = offline_extractor().extract_html(&fixture("noisy.html"), "https://example.com/").unwrap();

    assert_eq!(result.title, "Noisy Page Heading");
    assert!(result.content.contains("Pages in the wild"));
    assert!(!result.content.contains("Sponsored"));
    assert!(!result.content.contains("Buy now"));
}

#[test]
fn test_cjk_fixture() {
    let result = offline_extractor().extract_html(&fixture("cjk.html"), "https://example.cn/post/1").unwrap();

    assert_eq!(result.title, "深入理解所有权");
    assert!(result.content.contains("所有权是一组规则"));
    assert_eq!(document_file_name(&result.title), "深入理解所有权.pdf");
}

#[test]
fn test_empty_fixture_fails() {
    let err = offline_extractor().extract_html(&fixture("empty_content.html"), "https://example.com/").unwrap_err();
    assert!(matches!(err, FolioError::ExtractionFailed));
    assert_eq!(err.stage(), Stage::Extract);
}

#[test]
fn test_no_script_or_style_survives() {
    let extractor = offline_extractor();

    for name in FIXTURES {
        let Ok(result) = extractor.extract_html(&fixture(name), "https://example.com/") else {
            continue;
        };
        let lower = result.content.to_lowercase();
        assert!(!lower.contains("<script"), "{name} leaked a script");
        assert!(!lower.contains("<style"), "{name} leaked a style block");
        assert!(!result.content.is_empty(), "{name} returned empty content");
        assert!(!result.title.is_empty(), "{name} returned an empty title");
    }
}

#[test]
fn test_article_beats_later_content_container() {
    let html = r#"<html><body>
        <div class="content"><p>The generic container also holds more than one hundred characters of text, so it passes the threshold too.</p></div>
        <article><p>The article element holds more than one hundred characters of text and must win because it is listed first.</p></article>
    </body></html>"#;

    let extracted = resolve_content(&sanitized(html), &ExtractConfig::default()).unwrap();

    assert_eq!(extracted.source, ContentSource::Selector("article".to_string()));
    assert!(extracted.content.contains("must win"));
}

#[test]
fn test_extraction_is_idempotent_over_fixture() {
    let extractor = offline_extractor();
    let html = fixture("article.html");

    let first = extractor.extract_html(&html, "https://notes.example.com/posts/ownership").unwrap();
    let second = extractor.extract_html(&html, "https://notes.example.com/posts/ownership").unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_fetch_then_extract() {
    let url = "https://notes.example.com/posts/ownership";
    let fetcher = Arc::new(StaticFetcher::new().with_page(url, fixture("article.html")));
    let extractor = Extractor::with_fetcher(ExtractConfig::default(), fetcher.clone()).unwrap();

    let result = extractor.extract(url).await.unwrap();

    assert_eq!(result.title, "Understanding Ownership");
    assert_eq!(result.url, url);
    assert_eq!(fetcher.call_count(), 1);
}

#[test]
fn test_result_output_formats() {
    let result = offline_extractor().extract_html(&fixture("article.html"), "https://notes.example.com/").unwrap();

    #[cfg(feature = "markdown")]
    {
        let md = result.to_format(OutputFormat::Markdown).unwrap();
        assert!(md.starts_with("# Understanding Ownership"));
    }

    let json: serde_json::Value = serde_json::from_str(&result.to_format(OutputFormat::Json).unwrap()).unwrap();
    assert_eq!(json["title"], "Understanding Ownership");

    let text = result.to_format(OutputFormat::PlainText).unwrap();
    assert!(text.contains("Ownership is a set of rules"));
    assert!(!text.contains('<'));
}

#[tokio::test]
async fn test_extract_then_paginate() {
    let result = offline_extractor().extract_html(&fixture("article.html"), "https://notes.example.com/").unwrap();
    let config = PageConfig { settle_delay: Duration::ZERO, ..PageConfig::default() };
    let paginator = Paginator::with_capture(config, Arc::new(SolidCapture::new(1588, 5000)));

    let document = paginator.paginate(&result.title, &result.content).await.unwrap();

    // 5000 px at 1588 px wide is about 661 mm, three A4 pages.
    assert_eq!(document.page_count(), 3);
    assert_eq!(document.file_name, "understanding_ownership.pdf");

    let mut writer = RecordingWriter::default();
    document.write_to(&mut writer).unwrap();
    assert_eq!(writer.images, 1);
    assert_eq!(writer.pages, vec![PageSize::A4; 3]);

    let pdf = document.to_pdf().unwrap();
    assert_eq!(lopdf::Document::load_mem(&pdf).unwrap().get_pages().len(), 3);
}
