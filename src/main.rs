//! novelsync CLI - incremental web novel downloader.

use anyhow::{Context, Result};
use clap::Parser;
use novelsync::config::Config;
use novelsync::console::Console;
use novelsync::scrapers::{FetchContext, NovelScraper, StrategyRegistry, TocOptions};
use novelsync::store::{JsonStore, NovelStore};
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Incremental web novel downloader.
#[derive(Parser, Debug)]
#[command(name = "novelsync")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Table-of-contents URL of the novel.
    novel_url: String,

    /// Ignore saved progress and walk every listing page.
    #[arg(long)]
    all: bool,

    /// First listing page to read (1-based).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    start_page: Option<u32>,

    /// Config file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Discover and download without saving anything.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    novelsync::logging::init(config.scraping.debug)?;

    console.section("novelsync - Web Novel Downloader");

    config.validate().context("Invalid configuration")?;
    console.success("Configuration loaded");

    let novel_url = Url::parse(&args.novel_url)
        .with_context(|| format!("Invalid novel URL: {}", args.novel_url))?;

    let registry =
        StrategyRegistry::with_sites(&config.sites).context("Failed to register site strategies")?;
    let ctx = FetchContext::new(config.scraping.clone()).context("Failed to create HTTP client")?;

    let cancel = ctx.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let scraper = NovelScraper::new(Arc::new(registry), ctx);
    let strategy = scraper.strategy_for(&novel_url)?;
    console.success(&format!("Using strategy for {}", strategy.authority()));

    let store = JsonStore::new(config.store_dir()?);
    let (resume_marker, saved_page) = if args.all {
        (None, None)
    } else {
        let marker = store
            .last_saved_chapter_url(&novel_url)
            .await
            .context("Failed to read saved progress")?;
        let saved_page = store
            .last_toc_page(&novel_url)
            .await
            .context("Failed to read saved progress")?;
        (marker, saved_page)
    };

    match &resume_marker {
        Some(marker) => console.info(&format!("Resuming after {}", marker)),
        None => console.info("No saved progress, reading the whole table of contents"),
    }

    let mut options = TocOptions::resume(resume_marker, saved_page);
    if let Some(page) = args.start_page {
        options.start_page = page;
    }

    console.step("Walking table of contents...");
    let novel = scraper
        .novel(&novel_url, &options)
        .await
        .context("Failed to read novel")?;

    console.success(&format!("Found: {}", console.novel_line(&novel)));
    console.info(&format!(
        "{} new chapters listed up to {}",
        console.count(novel.chapter_urls.len()),
        novel.last_toc_page_url
    ));

    if novel.chapter_urls.is_empty() {
        console.section("Already up to date");
        return Ok(());
    }

    console.step("Downloading chapters...");
    let chapters = scraper
        .chapters(&novel)
        .await
        .context("Chapter download interrupted")?;

    for chapter in &chapters {
        println!("{}", console.chapter_line(chapter));
    }

    let empty = chapters.iter().filter(|c| !c.has_content()).count();
    if empty > 0 {
        console.warning(&format!("{} chapters came back without content", empty));
    }

    if args.dry_run {
        console.info("Dry run, nothing saved");
    } else {
        let inserted = store
            .upsert(&novel, &chapters)
            .await
            .context("Failed to save chapters")?;
        console.success(&format!(
            "Saved {} new chapters to {}",
            console.count(inserted),
            store.path_for(&novel.url).display()
        ));
    }

    console.section("Done!");
    Ok(())
}
