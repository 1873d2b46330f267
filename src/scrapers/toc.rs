//! Table-of-contents pagination.
//!
//! Finds the last listing page, then walks listing pages in order and
//! collects chapter links that come after the resume marker.

use super::absolute_url;
use super::extract::{chapter_hrefs, last_page_value, parse_page_number};
use super::loader::FetchContext;
use super::strategy::SiteStrategy;
use crate::error::ScraperError;
use tracing::{error, info, warn};
use url::Url;

/// Options for one walk.
#[derive(Debug, Clone)]
pub struct TocOptions {
    /// URL of the last chapter the caller already has. Empty means none.
    pub resume_marker: Option<String>,

    /// Walk every page up to the last one instead of stopping after the start page.
    pub full_backfill: bool,

    /// First listing page to walk.
    pub start_page: u32,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            resume_marker: None,
            full_backfill: false,
            start_page: 1,
        }
    }
}

impl TocOptions {
    /// Options for an incremental run from saved progress.
    ///
    /// With a marker the walk starts at the listing page saved with it and
    /// continues to the last page, so pages added since then are read too.
    /// Without one every page from the first is read.
    pub fn resume(marker: Option<String>, saved_page: Option<u32>) -> Self {
        let marker = marker.filter(|m| !m.trim().is_empty());
        let start_page = match marker {
            Some(_) => saved_page.filter(|&page| page > 0).unwrap_or(1),
            None => 1,
        };
        Self {
            resume_marker: marker,
            full_backfill: true,
            start_page,
        }
    }
}

/// Result of a walk.
#[derive(Debug, Clone, PartialEq)]
pub struct TocWalk {
    /// New chapter URLs in page order, then document order.
    pub chapter_urls: Vec<Url>,

    /// Index of the last listing page, offset applied.
    pub last_page: u32,

    pub last_page_url: Url,
}

/// Tracks whether the resume marker has been passed.
#[derive(Debug, Clone)]
pub struct Boundary {
    marker: Option<Url>,
    passed: bool,
}

impl Boundary {
    /// Creates a boundary. The marker is resolved against `base` so relative
    /// and absolute spellings of the same chapter compare equal.
    pub fn new(marker: Option<&str>, base: &Url) -> Self {
        let marker = marker
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .and_then(|m| {
                let resolved = absolute_url(base, m);
                if resolved.is_none() {
                    warn!(marker = m, "resume marker is not a valid URL");
                }
                resolved
            });
        let passed = marker.is_none();
        Self { marker, passed }
    }

    /// Whether chapters are being accumulated on pages that are not new.
    pub fn is_passed(&self) -> bool {
        self.passed
    }

    /// Filters the links of one listing page.
    ///
    /// Links up to and including the marker are dropped unless `page_is_new`,
    /// in which case everything except the marker itself is kept.
    pub fn collect(&mut self, hrefs: &[String], base: &Url, page_is_new: bool) -> Vec<Url> {
        let mut urls = Vec::new();
        for href in hrefs {
            let Some(url) = absolute_url(base, href) else {
                warn!(href = %href, "skipping unparseable chapter link");
                continue;
            };

            if !self.passed && self.marker.as_ref() == Some(&url) {
                self.passed = true;
            } else if self.passed || page_is_new {
                urls.push(url);
            }
        }
        urls
    }
}

/// Loads the first listing page and reads the last page index from it.
pub async fn discover_last_page(
    ctx: &FetchContext,
    strategy: &SiteStrategy,
    toc_url: &Url,
) -> Result<u32, ScraperError> {
    let raw = {
        let doc = ctx.load(toc_url).await?;
        last_page_value(&doc, strategy)
    };

    let parse_error = |reason: String| ScraperError::PaginationParse {
        url: toc_url.to_string(),
        reason,
    };

    let raw = raw.ok_or_else(|| parse_error("last page link not found".to_string()))?;
    let page = parse_page_number(&raw)
        .ok_or_else(|| parse_error(format!("'{}' is not a page number", raw)))?;

    let last_page = i64::from(page) + i64::from(strategy.page_offset());
    let last_page = u32::try_from(last_page).map_err(|_| {
        parse_error(format!(
            "page {} with offset {} is out of range",
            page,
            strategy.page_offset()
        ))
    })?;

    info!(%toc_url, %raw, last_page, "discovered listing pages");
    Ok(last_page)
}

/// Walks listing pages from `options.start_page` to the last page.
///
/// A listing page that fails to load contributes no chapters. Only the
/// last-page discovery and cancellation are fatal.
pub async fn paginate(
    ctx: &FetchContext,
    strategy: &SiteStrategy,
    toc_url: &Url,
    options: &TocOptions,
) -> Result<TocWalk, ScraperError> {
    let last_page = discover_last_page(ctx, strategy, toc_url).await?;
    let last_page_url = strategy.page_url(toc_url, last_page)?;

    let start = options.start_page.max(1);
    let mut boundary = Boundary::new(options.resume_marker.as_deref(), toc_url);
    let mut chapter_urls = Vec::new();

    for page in start..=last_page {
        let page_url = strategy.page_url(toc_url, page)?;
        let page_is_new = page > start;
        info!(url = %page_url, page, "navigating to listing page");

        let hrefs = match ctx.load(&page_url).await {
            Ok(doc) => chapter_hrefs(&doc, strategy),
            Err(ScraperError::Cancelled) => return Err(ScraperError::Cancelled),
            Err(e) => {
                error!(url = %page_url, error = %e, "listing page failed, skipping");
                continue;
            }
        };

        let found = boundary.collect(&hrefs, toc_url, page_is_new);
        info!(page, links = hrefs.len(), new = found.len(), "listing page scanned");
        chapter_urls.extend(found);

        if !options.full_backfill && !page_is_new {
            break;
        }
    }

    info!(%toc_url, chapters = chapter_urls.len(), "table of contents walked");
    Ok(TocWalk {
        chapter_urls,
        last_page,
        last_page_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://novelfull.com/supremacy-games.html").unwrap()
    }

    fn hrefs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn strings(urls: &[Url]) -> Vec<&str> {
        urls.iter().map(Url::as_str).collect()
    }

    #[test]
    fn test_resume_options() {
        let options = TocOptions::resume(Some("/c-5".to_string()), Some(2));
        assert_eq!(options.resume_marker.as_deref(), Some("/c-5"));
        assert_eq!(options.start_page, 2);
        assert!(options.full_backfill);

        let options = TocOptions::resume(Some("/c-5".to_string()), None);
        assert_eq!(options.start_page, 1);

        let options = TocOptions::resume(None, Some(4));
        assert_eq!(options.resume_marker, None);
        assert_eq!(options.start_page, 1);
        assert!(options.full_backfill);

        let options = TocOptions::resume(Some("  ".to_string()), Some(4));
        assert_eq!(options.resume_marker, None);
        assert_eq!(options.start_page, 1);
    }

    #[test]
    fn test_marker_on_page() {
        let mut boundary = Boundary::new(Some("/c-50"), &base());
        let urls = boundary.collect(&hrefs(&["/c-49", "/c-50", "/c-51", "/c-52"]), &base(), false);
        assert_eq!(
            strings(&urls),
            vec!["https://novelfull.com/c-51", "https://novelfull.com/c-52"]
        );
        assert!(boundary.is_passed());
    }

    #[test]
    fn test_marker_matches_across_spellings() {
        let mut boundary = Boundary::new(Some("https://novelfull.com/c-50"), &base());
        let urls = boundary.collect(&hrefs(&["c-49", "c-50", "c-51"]), &base(), false);
        assert_eq!(strings(&urls), vec!["https://novelfull.com/c-51"]);
    }

    #[test]
    fn test_no_marker_accumulates_everything() {
        for marker in [None, Some(""), Some("   ")] {
            let mut boundary = Boundary::new(marker, &base());
            let urls = boundary.collect(&hrefs(&["/c-1", "/c-2"]), &base(), false);
            assert_eq!(urls.len(), 2);
        }
    }

    #[test]
    fn test_marker_absent_from_first_page() {
        let mut boundary = Boundary::new(Some("/c-10"), &base());
        let urls = boundary.collect(&hrefs(&["/c-49", "/c-50"]), &base(), false);
        assert!(urls.is_empty());
        assert!(!boundary.is_passed());
    }

    #[test]
    fn test_new_page_takes_everything_but_marker() {
        let mut boundary = Boundary::new(Some("/c-10"), &base());
        let urls = boundary.collect(&hrefs(&["/c-51", "/c-52"]), &base(), true);
        assert_eq!(urls.len(), 2);

        let mut boundary = Boundary::new(Some("/c-51"), &base());
        let urls = boundary.collect(&hrefs(&["/c-51", "/c-52"]), &base(), true);
        assert_eq!(strings(&urls), vec!["https://novelfull.com/c-52"]);
    }

    #[test]
    fn test_boundary_carries_across_pages() {
        let mut boundary = Boundary::new(Some("/c-3"), &base());
        let first = boundary.collect(&hrefs(&["/c-1", "/c-2", "/c-3"]), &base(), false);
        assert!(first.is_empty());
        let second = boundary.collect(&hrefs(&["/c-4"]), &base(), false);
        assert_eq!(strings(&second), vec!["https://novelfull.com/c-4"]);
    }

    #[test]
    fn test_default_options() {
        let options = TocOptions::default();
        assert_eq!(options.start_page, 1);
        assert!(!options.full_backfill);
        assert!(options.resume_marker.is_none());
    }
}
