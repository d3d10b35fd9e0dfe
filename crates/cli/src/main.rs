mod echo;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use folio_core::{
    CommandCapture, CommandCaptureConfig, ExtractConfig, ExtractionResult, Extractor, FetchConfig, OutputFormat,
    PageConfig, PageSize, Paginator,
};
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Base URL for HTML read from a file or stdin.
const LOCAL_BASE_URL: &str = "http://localhost/";

/// Extract readable content from web pages and paginate it into PDF
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author = "Folio Contributors")]
#[command(version)]
#[command(about = "Extract readable content from web pages and paginate it into PDF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the title and main content of a page
    Extract(ExtractArgs),
    /// Render HTML content into a paginated PDF
    Paginate(PaginateArgs),
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Output format for extracted content
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Html,
    Markdown,
    Text,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Html => OutputFormat::Html,
            Format::Markdown => OutputFormat::Markdown,
            Format::Text => OutputFormat::PlainText,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Page {
    A4,
    Letter,
}

impl From<Page> for PageSize {
    fn from(page: Page) -> Self {
        match page {
            Page::A4 => PageSize::A4,
            Page::Letter => PageSize::LETTER,
        }
    }
}

#[derive(clap::Args, Debug)]
struct FetchArgs {
    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Minimum character count for a content candidate to be accepted
    #[arg(long, default_value = "100", value_name = "NUM")]
    min_chars: usize,

    /// Keep a leading heading that repeats the title
    #[arg(long)]
    keep_title_heading: bool,

    /// Base URL for resolving links when reading a file or stdin
    #[arg(long, value_name = "URL", default_value = LOCAL_BASE_URL)]
    base_url: String,
}

#[derive(clap::Args, Debug)]
struct ExtractArgs {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", value_name = "FORMAT")]
    format: Format,

    #[command(flatten)]
    fetch: FetchArgs,
}

#[derive(clap::Args, Debug)]
struct PaginateArgs {
    /// URL to extract and paginate, HTML content file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Document title (default: the extracted title for URLs)
    #[arg(short, long)]
    title: Option<String>,

    /// Output file (default: derived from the title)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// HTML-to-image program used to capture the page surface
    #[arg(long, default_value = "wkhtmltoimage", value_name = "PROGRAM")]
    renderer: PathBuf,

    /// Let the renderer read local files referenced by the content
    #[arg(long)]
    allow_local_files: bool,

    /// Page size
    #[arg(long, value_enum, default_value = "a4")]
    page: Page,

    /// Capture scale factor
    #[arg(long, default_value = "2.0")]
    scale: f32,

    /// Delay before capture in milliseconds
    #[arg(long, default_value = "300", value_name = "MS")]
    settle_ms: u64,

    #[command(flatten)]
    fetch: FetchArgs,
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

fn build_extractor(args: &FetchArgs) -> anyhow::Result<Extractor> {
    let config = ExtractConfig::builder()
        .min_content_chars(args.min_chars)
        .dedupe_title_heading(!args.keep_title_heading)
        .build();

    let mut fetch_config = FetchConfig { timeout: args.timeout, ..Default::default() };
    if let Some(user_agent) = &args.user_agent {
        fetch_config.user_agent = user_agent.clone();
    }

    Extractor::with_fetch_config(config, fetch_config).context("Failed to configure extractor")
}

/// Cancels `token` on Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            token.cancel();
        }
    });
}

async fn extract_input(
    input: &str, args: &FetchArgs, cancel: &CancellationToken, verbose: bool, total: usize,
) -> anyhow::Result<ExtractionResult> {
    let extractor = build_extractor(args)?;

    if is_url(input) {
        if verbose {
            echo::print_step(1, total, &format!("Fetching from {}", input.bright_white().underline()));
        }
        extractor.extract_with_cancel(input, cancel).await.context("Failed to extract content")
    } else {
        if verbose {
            echo::print_step(1, total, &format!("Reading from {}", if input == "-" { "stdin" } else { input }));
        }
        let html = read_input(input)?;
        if verbose {
            echo::print_field("Size", &echo::format_size(html.len()));
        }
        extractor.extract_html(&html, &args.base_url).context("Failed to extract content")
    }
}

async fn run_extract(args: &ExtractArgs, cancel: &CancellationToken, verbose: bool) -> anyhow::Result<()> {
    let start = Instant::now();
    let result = extract_input(&args.input, &args.fetch, cancel, verbose, 2).await?;
    let extract_time = start.elapsed();

    if verbose {
        echo::print_extraction_details(&result);
        echo::print_step(2, 2, &format!("Writing {:?} output", args.format));
    }

    let output = result.to_format(args.format.into()).context("Failed to format output")?;

    match &args.output {
        Some(path) => {
            fs::write(path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => println!("{}", output),
    }

    if verbose {
        echo::print_timing_summary(start.elapsed(), &[("Extract", extract_time)]);
    }

    Ok(())
}

async fn run_paginate(args: &PaginateArgs, cancel: &CancellationToken, verbose: bool) -> anyhow::Result<()> {
    let start = Instant::now();

    let (title, content) = if is_url(&args.input) {
        let result = extract_input(&args.input, &args.fetch, cancel, verbose, 3).await?;
        if verbose {
            echo::print_extraction_details(&result);
        }
        (args.title.clone().unwrap_or(result.title), result.content)
    } else {
        if verbose {
            echo::print_step(1, 3, "Reading content");
        }
        (args.title.clone().unwrap_or_default(), read_input(&args.input)?)
    };
    let read_time = start.elapsed();

    if verbose {
        echo::print_step(2, 3, &format!("Rendering with {}", args.renderer.display()));
    }

    let config = PageConfig {
        page: args.page.into(),
        scale: args.scale,
        settle_delay: Duration::from_millis(args.settle_ms),
        ..Default::default()
    };
    let capture = CommandCapture::new(CommandCaptureConfig {
        program: args.renderer.clone(),
        allow_local_files: args.allow_local_files,
        ..Default::default()
    });
    let paginator = Paginator::with_capture(config, Arc::new(capture));

    let render_start = Instant::now();
    let document = paginator.paginate_with_cancel(&title, &content, cancel).await.context("Failed to paginate")?;
    let render_time = render_start.elapsed();

    if verbose {
        echo::print_pagination_details(&document);
        echo::print_step(3, 3, "Writing PDF");
    }

    let bytes = document.to_pdf().context("Failed to build PDF")?;
    let path = args.output.clone().unwrap_or_else(|| PathBuf::from(&document.file_name));
    fs::write(&path, &bytes).with_context(|| format!("Failed to write to file: {}", path.display()))?;

    echo::print_success(&format!(
        "{} page(s), {} written to {}",
        document.page_count(),
        echo::format_size(bytes.len()),
        path.display().bright_white()
    ));

    if verbose {
        echo::print_timing_summary(start.elapsed(), &[("Read", read_time), ("Render", render_time)]);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    match cli.command {
        Command::Extract(args) => {
            cancel_on_ctrl_c(cancel.clone());
            run_extract(&args, &cancel, cli.verbose).await
        }
        Command::Paginate(args) => {
            if !(args.scale.is_finite() && args.scale > 0.0) {
                bail!("--scale must be a positive number");
            }
            cancel_on_ctrl_c(cancel.clone());
            run_paginate(&args, &cancel, cli.verbose).await
        }
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "folio", &mut io::stdout());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    if let Err(err) = run(cli).await {
        echo::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}
