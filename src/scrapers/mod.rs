//! Discovery and extraction engine.
//!
//! Site-specific behaviour lives entirely in [`SiteStrategy`] data; the
//! loader, paginator, chapter fetcher and assembler are shared by all sites.

pub mod assembler;
pub mod chapters;
pub mod extract;
pub mod loader;
pub mod registry;
pub mod strategy;
pub mod toc;

pub use assembler::assemble;
pub use chapters::fetch_all;
pub use loader::FetchContext;
pub use registry::StrategyRegistry;
pub use strategy::{SelectorConfig, SiteStrategy, StrategyConfig};
pub use toc::{TocOptions, TocWalk, paginate};

use crate::config::{MAX_DELAY_SEC, ScrapingConfig};
use crate::error::ScraperError;
use crate::models::{ChapterRecord, NovelRecord};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Entry point tying the registry to one fetch context.
pub struct NovelScraper {
    registry: Arc<StrategyRegistry>,
    ctx: FetchContext,
}

impl NovelScraper {
    pub fn new(registry: Arc<StrategyRegistry>, ctx: FetchContext) -> Self {
        Self { registry, ctx }
    }

    pub fn context(&self) -> &FetchContext {
        &self.ctx
    }

    /// Strategy for the site hosting `url`.
    pub fn strategy_for(&self, url: &Url) -> Result<Arc<SiteStrategy>, ScraperError> {
        self.registry.resolve(url)
    }

    /// Walks the table of contents at `url` and builds the novel record.
    pub async fn novel(&self, url: &Url, options: &TocOptions) -> Result<NovelRecord, ScraperError> {
        let strategy = self.strategy_for(url)?;
        assemble(&self.ctx, &strategy, url, options).await
    }

    /// Downloads the chapters listed in `novel`.
    pub async fn chapters(&self, novel: &NovelRecord) -> Result<Vec<ChapterRecord>, ScraperError> {
        let strategy = self.strategy_for(&novel.url)?;
        fetch_all(&self.ctx, &strategy, &novel.chapter_urls).await
    }
}

/// Common HTTP client configuration for scrapers.
pub fn create_http_client(config: &ScrapingConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .cookie_store(true)
        .min_tls_version(reqwest::tls::Version::TLS_1_2)
        .timeout(Duration::from_secs(config.timeout_sec))
        .build()
}

/// Applies rate limiting delay.
pub async fn rate_limit(delay_sec: f64) {
    let delay = delay_duration(delay_sec);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Converts a configured delay to a `Duration`, capped at [`MAX_DELAY_SEC`].
/// NaN and non-positive values mean no delay.
pub fn delay_duration(delay_sec: f64) -> Duration {
    if delay_sec.is_nan() || delay_sec <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(delay_sec.min(MAX_DELAY_SEC)).unwrap_or(Duration::ZERO)
}

/// Resolves a link against the scheme and host of `page`.
///
/// Absolute links are returned unchanged; relative ones, with or without a
/// leading slash, hang off the site root. Query-only links stay on `page`.
pub fn absolute_url(page: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let mut root = page.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);

    if href.starts_with('?') {
        return page.join(href).ok();
    }
    root.join(href).ok()
}
