//! Builds a complete [`NovelRecord`] for one table of contents.

use super::absolute_url;
use super::extract::extract_novel_metadata;
use super::loader::FetchContext;
use super::strategy::SiteStrategy;
use super::toc::{TocOptions, paginate};
use crate::error::ScraperError;
use crate::models::NovelRecord;
use tracing::info;
use url::Url;

/// Drops the last path segment, e.g. `/novel/x/chapters` becomes `/novel/x/`.
pub fn metadata_url(toc_url: &Url) -> Result<Url, ScraperError> {
    let mut url = toc_url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| ScraperError::InvalidUrl(toc_url.to_string()))?
        .pop_if_empty()
        .pop()
        .push("");
    Ok(url)
}

/// Walks the table of contents, then reads metadata and resolves every link.
pub async fn assemble(
    ctx: &FetchContext,
    strategy: &SiteStrategy,
    toc_url: &Url,
    options: &TocOptions,
) -> Result<NovelRecord, ScraperError> {
    info!(%toc_url, "getting novel data");
    let walk = paginate(ctx, strategy, toc_url, options).await?;

    let info_url = if strategy.novel_info_on_different_page() {
        metadata_url(toc_url)?
    } else {
        toc_url.clone()
    };
    let meta = {
        let doc = ctx.load(&info_url).await?;
        extract_novel_metadata(&doc, strategy)
    };

    let resolve = |href: Option<&str>| href.and_then(|h| absolute_url(toc_url, h));

    let latest_chapter_url =
        resolve(meta.latest_chapter.as_deref()).or_else(|| walk.chapter_urls.last().cloned());

    let novel = NovelRecord {
        url: toc_url.clone(),
        title: meta.title,
        author: meta.author,
        rating: meta.rating,
        description: meta.description,
        genres: meta.genres,
        alternative_names: meta.alternative_names,
        status: meta.status,
        is_completed: meta.is_completed,
        thumbnail_url: resolve(meta.thumbnail.as_deref()),
        last_toc_page_url: walk.last_page_url,
        last_toc_page: walk.last_page,
        first_chapter_url: resolve(meta.first_chapter.as_deref()),
        latest_chapter_url,
        latest_chapter_title: meta.latest_chapter_title,
        chapter_urls: walk.chapter_urls,
    };

    info!(
        title = novel.title.as_deref().unwrap_or("<untitled>"),
        new_chapters = novel.chapter_urls.len(),
        completed = novel.is_completed,
        "novel data assembled"
    );
    Ok(novel)
}
