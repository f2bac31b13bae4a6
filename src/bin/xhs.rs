use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use xhs_extractor::extract::extract_post;
use xhs_extractor::locate::locate_post_url;
use xhs_extractor::{Config, ExtractedContent, ImageDownloader, PageFetcher};

/// Extract the title, text and images of a Xiaohongshu post
#[derive(Parser, Debug)]
#[command(name = "xhs", version)]
struct Cli {
    /// Post link or pasted share text; prompted for when omitted
    url: Option<String>,

    /// Directory to save images into
    #[arg(short, long, default_value = "images")]
    output: PathBuf,

    /// Verbose logging and hints on failure
    #[arg(short, long)]
    debug: bool,

    /// Only print the extracted fields
    #[arg(long)]
    no_download: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let input = match cli.url.clone() {
        Some(url) => url,
        None => prompt("Enter a Xiaohongshu link: ")?,
    };
    let url = normalize_input(&input);

    let config = Config::from_env()?;
    let fetcher = PageFetcher::new(&config.http)?;

    println!("Processing link: {}", url);
    let content = match extract_post(&fetcher, &url).await {
        Ok(content) if content.has_text() => content,
        Ok(_) => return Ok(failure(&cli, "the page carried no title or description")),
        Err(e) => return Ok(failure(&cli, &e.to_string())),
    };

    print_content(&content);

    if content.image_urls.is_empty() {
        println!("\nNo images found");
    } else if !cli.no_download {
        println!("\nDownloading images to {} ...", cli.output.display());
        let downloader = ImageDownloader::new(&config.http)?;
        let saved = downloader
            .download_all(&content.image_urls, &cli.output)
            .await;
        println!("Downloaded {} of {} images", saved.len(), content.image_urls.len());
    }

    Ok(ExitCode::SUCCESS)
}

/// Prefer a post link found in pasted text; otherwise treat the input as a URL.
fn normalize_input(input: &str) -> String {
    if let Ok(url) = locate_post_url(input) {
        return url.to_string();
    }
    let trimmed = input.trim();
    if trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush().context("failed to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read link from stdin")?;
    Ok(line.trim().to_string())
}

fn print_content(content: &ExtractedContent) {
    let show = |v: &Option<String>| v.clone().unwrap_or_default();

    println!("\n=== Xiaohongshu post ===");
    println!("Title: {}", show(&content.title));
    println!("\nContent:\n{}", show(&content.content));
    println!("\nImages: {}", content.image_urls.len());

    if content.has_engagement() {
        println!("Likes: {}", show(&content.likes));
        println!("Comments: {}", show(&content.comments));
        println!("Collects: {}", show(&content.collects));
    }
}

fn failure(cli: &Cli, reason: &str) -> ExitCode {
    eprintln!("Could not extract content ({}), check the link or network connection", reason);
    if cli.debug {
        eprintln!(
            "Hint: links look like https://www.xiaohongshu.com/explore/... or http://xhslink.com/..."
        );
    }
    ExitCode::FAILURE
}
