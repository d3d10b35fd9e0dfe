//! CLI integration tests
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("folio")
}

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

#[test]
fn test_cli_file_input_json() {
    let output = cmd().args(["extract", &get_fixture_path("article.html")]).assert().success().get_output().clone();

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["title"], "Understanding Ownership");
    assert_eq!(json["url"], "http://localhost/");
    assert!(json["content"].as_str().unwrap().contains("Ownership is a set of rules"));
}

#[test]
fn test_cli_stdin_input() {
    let html = std::fs::read_to_string(get_fixture_path("cms_post.html")).unwrap();
    cmd()
        .args(["extract", "-f", "html", "-"])
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::contains("redesigned configuration format"));
}

#[test]
fn test_cli_base_url() {
    cmd()
        .args(["extract", "-f", "html", "--base-url", "https://notes.example.com/posts/x", &get_fixture_path("article.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://notes.example.com/images/ownership.png"));
}

#[test]
fn test_cli_markdown_format() {
    cmd()
        .args(["extract", "-f", "markdown", &get_fixture_path("article.html")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Understanding Ownership"));
}

#[test]
fn test_cli_text_format() {
    cmd()
        .args(["extract", "-f", "text", &get_fixture_path("cjk.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("所有权是一组规则"))
        .stdout(predicate::str::contains("<p>").not());
}

#[test]
fn test_cli_keep_title_heading() {
    cmd()
        .args(["extract", "-f", "html", "--keep-title-heading", &get_fixture_path("article.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Understanding Ownership</h1>"));
}

#[test]
fn test_cli_output_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("output.json");

    cmd()
        .args(["extract", "-o", output.to_str().unwrap()])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("Understanding Ownership"));
}

#[test]
fn test_cli_invalid_file() {
    cmd().args(["extract", "nonexistent.html"]).assert().failure().stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_cli_empty_content() {
    cmd()
        .args(["extract", &get_fixture_path("empty_content.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to extract content from the webpage"));
}

#[test]
fn test_cli_invalid_base_url() {
    cmd()
        .args(["extract", "--base-url", "not-a-url", &get_fixture_path("article.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid URL format"));
}

#[test]
fn test_cli_verbose() {
    cmd()
        .args(["-v", "extract", &get_fixture_path("article.html")])
        .assert()
        .success()
        .stderr(predicate::str::contains("Folio"));
}

#[test]
fn test_cli_paginate_empty_content() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("out.pdf");

    cmd()
        .args(["paginate", "--title", "Empty", "-o", output.to_str().unwrap(), "-"])
        .write_stdin("   \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Content is empty"));

    assert!(!output.exists());
}

#[test]
fn test_cli_paginate_missing_renderer() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("out.pdf");

    cmd()
        .args(["paginate", "--renderer", "folio-no-such-renderer-binary", "--settle-ms", "0"])
        .args(["-o", output.to_str().unwrap(), "-"])
        .write_stdin("<p>Body</p>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Render failed"));
}

#[test]
fn test_cli_paginate_rejects_nan_scale() {
    cmd()
        .args(["paginate", "--scale", "NaN", "-"])
        .write_stdin("<p>Body</p>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--scale must be a positive number"));
}

#[test]
fn test_cli_completions() {
    cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("folio"));
}

#[test]
fn test_cli_requires_subcommand() {
    cmd().assert().failure();
}
