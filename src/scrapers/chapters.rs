//! Concurrent chapter download.

use super::extract::extract_chapter;
use super::loader::FetchContext;
use super::strategy::SiteStrategy;
use crate::error::ScraperError;
use crate::models::ChapterRecord;
use futures::future::join_all;
use std::time::Instant;
use tracing::{debug, error, info};
use url::Url;

/// Downloads and extracts every chapter in `urls`.
///
/// At most `concurrency` pages are in flight at once. The result has one
/// record per input URL, in input order; a chapter that fails to load gets a
/// record with an empty title and the sentinel body. Only cancellation fails
/// the batch.
pub async fn fetch_all(
    ctx: &FetchContext,
    strategy: &SiteStrategy,
    urls: &[Url],
) -> Result<Vec<ChapterRecord>, ScraperError> {
    info!(count = urls.len(), "getting chapters");
    let started = Instant::now();

    let results = join_all(urls.iter().map(|url| fetch_chapter(ctx, strategy, url))).await;
    let chapters = results.into_iter().collect::<Result<Vec<_>, _>>()?;

    let empty = chapters.iter().filter(|c| !c.has_content()).count();
    info!(
        count = chapters.len(),
        empty,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "finished getting chapters"
    );
    Ok(chapters)
}

/// Downloads one chapter while holding a fetch slot.
pub async fn fetch_chapter(
    ctx: &FetchContext,
    strategy: &SiteStrategy,
    url: &Url,
) -> Result<ChapterRecord, ScraperError> {
    let _permit = ctx.acquire().await?;
    let started = Instant::now();
    debug!(%url, "navigating to chapter");

    let content = match ctx.load(url).await {
        Ok(doc) => extract_chapter(&doc, strategy),
        Err(ScraperError::Cancelled) => return Err(ScraperError::Cancelled),
        Err(e) => {
            error!(%url, error = %e, "chapter failed, keeping empty record");
            return Ok(ChapterRecord::empty(url.clone()));
        }
    };

    debug!(
        %url,
        title = %content.title,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "chapter processed"
    );
    Ok(ChapterRecord::new(url.clone(), content.title, content.body))
}
