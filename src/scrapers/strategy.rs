//! Per-site extraction rules.
//!
//! A strategy is pure data: CSS selectors plus pagination parameters for one
//! source host. Strategies come from [`builtin`] or from the `[[sites]]`
//! section of the config file and are compiled once at start-up.

use crate::error::ScraperError;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

/// Placeholder substituted with the listing page index in pagination templates.
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Selector strings as they appear in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub title: String,
    pub author: String,
    /// Ratings are only parsed when this is set.
    pub rating: Option<String>,
    pub description: String,
    pub genres: String,
    pub alternative_names: Option<String>,
    pub status: String,
    /// Image element whose `src` is the cover.
    pub thumbnail: String,
    /// Anchors to chapters on a listing page.
    pub chapter_links: String,
    pub chapter_title: String,
    /// Paragraph nodes of a chapter body.
    pub chapter_content: String,
    /// Tried when `chapter_content` finds too few paragraphs.
    pub alternative_chapter_content: String,
    /// Link to the last listing page.
    pub last_toc_page: String,
    /// Attribute of `last_toc_page` holding the page number. Empty means the node text.
    pub last_toc_page_number_attribute: String,
    pub latest_chapter: Option<String>,
}

/// One `[[sites]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Scheme and host (and port, if not the default), e.g. `https://novelfull.com`.
    pub authority: String,

    pub selectors: SelectorConfig,

    /// Appended to the table of contents URL, `{page}` is replaced by the page index.
    pub pagination_template: String,

    /// Added to the page number read from the last-page link.
    #[serde(default)]
    pub page_offset: i32,

    /// Token whose presence in the lower-cased status marks a completed novel.
    #[serde(default = "default_completed_status")]
    pub completed_status: String,

    /// Metadata lives one path segment above the chapter index.
    #[serde(default)]
    pub novel_info_on_different_page: bool,
}

fn default_completed_status() -> String {
    "completed".to_string()
}

/// Compiled selectors.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub title: Selector,
    pub author: Selector,
    pub rating: Option<Selector>,
    pub description: Selector,
    pub genres: Selector,
    pub alternative_names: Option<Selector>,
    pub status: Selector,
    pub thumbnail: Selector,
    pub chapter_links: Selector,
    pub chapter_title: Selector,
    pub chapter_content: Selector,
    pub alternative_chapter_content: Selector,
    pub last_toc_page: Selector,
    pub latest_chapter: Option<Selector>,
}

fn compile(field: &'static str, selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|_| ScraperError::InvalidSelector {
        field,
        selector: selector.to_string(),
    })
}

fn compile_opt(field: &'static str, selector: Option<&str>) -> Result<Option<Selector>, ScraperError> {
    selector
        .filter(|s| !s.trim().is_empty())
        .map(|s| compile(field, s))
        .transpose()
}

impl Selectors {
    fn compile(config: &SelectorConfig) -> Result<Self, ScraperError> {
        Ok(Self {
            title: compile("title", &config.title)?,
            author: compile("author", &config.author)?,
            rating: compile_opt("rating", config.rating.as_deref())?,
            description: compile("description", &config.description)?,
            genres: compile("genres", &config.genres)?,
            alternative_names: compile_opt("alternative_names", config.alternative_names.as_deref())?,
            status: compile("status", &config.status)?,
            thumbnail: compile("thumbnail", &config.thumbnail)?,
            chapter_links: compile("chapter_links", &config.chapter_links)?,
            chapter_title: compile("chapter_title", &config.chapter_title)?,
            chapter_content: compile("chapter_content", &config.chapter_content)?,
            alternative_chapter_content: compile(
                "alternative_chapter_content",
                &config.alternative_chapter_content,
            )?,
            last_toc_page: compile("last_toc_page", &config.last_toc_page)?,
            latest_chapter: compile_opt("latest_chapter", config.latest_chapter.as_deref())?,
        })
    }
}

/// Extraction rules for one source host. Immutable once built.
#[derive(Debug, Clone)]
pub struct SiteStrategy {
    authority: String,
    selectors: Selectors,
    last_page_attribute: String,
    pagination_template: String,
    page_offset: i32,
    completed_status: String,
    novel_info_on_different_page: bool,
}

impl SiteStrategy {
    /// Compiles a strategy from its configuration.
    pub fn from_config(config: &StrategyConfig) -> Result<Self, ScraperError> {
        let authority = authority_of(&Url::parse(&config.authority)?);
        if !config.pagination_template.contains(PAGE_PLACEHOLDER) {
            return Err(ScraperError::InvalidUrl(format!(
                "pagination template for {} lacks {}",
                authority, PAGE_PLACEHOLDER
            )));
        }

        Ok(Self {
            authority,
            selectors: Selectors::compile(&config.selectors)?,
            last_page_attribute: config.selectors.last_toc_page_number_attribute.trim().to_string(),
            pagination_template: config.pagination_template.clone(),
            page_offset: config.page_offset,
            completed_status: config.completed_status.to_lowercase(),
            novel_info_on_different_page: config.novel_info_on_different_page,
        })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    /// Attribute holding the last page number; empty means the node text.
    pub fn last_page_attribute(&self) -> &str {
        &self.last_page_attribute
    }

    pub fn page_offset(&self) -> i32 {
        self.page_offset
    }

    pub fn completed_status(&self) -> &str {
        &self.completed_status
    }

    pub fn novel_info_on_different_page(&self) -> bool {
        self.novel_info_on_different_page
    }

    /// Builds the URL of listing page `page` for the given table of contents.
    ///
    /// Any query or fragment already on `toc_url` is dropped first.
    pub fn page_url(&self, toc_url: &Url, page: u32) -> Result<Url, ScraperError> {
        let mut base = toc_url.clone();
        base.set_query(None);
        base.set_fragment(None);
        let suffix = self
            .pagination_template
            .replace(PAGE_PLACEHOLDER, &page.to_string());
        Ok(Url::parse(&format!("{}{}", base.as_str(), suffix))?)
    }

    /// Classifies a raw status string.
    pub fn is_completed(&self, status: &str) -> bool {
        !self.completed_status.is_empty() && status.to_lowercase().contains(&self.completed_status)
    }
}

/// Scheme, host and non-default port of a URL, e.g. `https://novelfull.com`.
pub fn authority_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Strategies shipped with the crate.
pub fn builtin() -> Vec<StrategyConfig> {
    vec![novelfull(), webnovelpub()]
}

fn novelfull() -> StrategyConfig {
    StrategyConfig {
        authority: "https://novelfull.com".to_string(),
        selectors: SelectorConfig {
            title: "h3.title".to_string(),
            author: r#"div.info a[href*="/author/"]"#.to_string(),
            rating: Some(r#"span[itemprop="ratingValue"]"#.to_string()),
            description: "div.desc-text p".to_string(),
            genres: r#"div.info a[href*="/genre/"]"#.to_string(),
            alternative_names: None,
            status: r#"div.info a[href*="/status/"]"#.to_string(),
            thumbnail: "div.book img".to_string(),
            chapter_links: "ul.list-chapter li a".to_string(),
            chapter_title: "a.chapter-title".to_string(),
            chapter_content: "#chapter-content p".to_string(),
            alternative_chapter_content: "#chapter-content div".to_string(),
            last_toc_page: "li.last a".to_string(),
            // data-page is zero-based
            last_toc_page_number_attribute: "data-page".to_string(),
            latest_chapter: Some("ul.l-chapters li a".to_string()),
        },
        pagination_template: "?page={page}".to_string(),
        page_offset: 1,
        completed_status: "completed".to_string(),
        novel_info_on_different_page: false,
    }
}

fn webnovelpub() -> StrategyConfig {
    StrategyConfig {
        authority: "https://www.webnovelpub.com".to_string(),
        selectors: SelectorConfig {
            title: "h1.novel-title".to_string(),
            author: r#"div.author span[itemprop="author"]"#.to_string(),
            rating: Some("div.rating-star strong".to_string()),
            // meta tag: no text, value lives in the content attribute
            description: r#"meta[itemprop="description"]"#.to_string(),
            genres: "div.categories ul li a".to_string(),
            alternative_names: Some("div.main-head div.alternative-title".to_string()),
            status: "div.header-stats span:last-child strong".to_string(),
            thumbnail: "figure.cover img".to_string(),
            chapter_links: "ul.chapter-list li a".to_string(),
            chapter_title: "span.chapter-title".to_string(),
            chapter_content: "#chapter-container p".to_string(),
            alternative_chapter_content: "#chapter-container div".to_string(),
            last_toc_page: "ul.pagination li:last-child a".to_string(),
            last_toc_page_number_attribute: "href".to_string(),
            latest_chapter: Some("div.body p.latest a".to_string()),
        },
        pagination_template: "?page={page}".to_string(),
        page_offset: 0,
        completed_status: "completed".to_string(),
        novel_info_on_different_page: true,
    }
}
