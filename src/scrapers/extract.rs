//! Field extraction from parsed documents.
//!
//! Every single-field extraction treats "no matching node" as an absent value,
//! never as an error. The chapter-body heuristics are plain functions of
//! paragraph counts so they can be tested without a network.

use super::strategy::SiteStrategy;
use crate::models::NO_CONTENT;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Below this many primary paragraphs the alternate body selector is tried.
pub const MIN_PARAGRAPHS: usize = 5;

/// Bodies with fewer line breaks than this are replaced by the sentinel.
pub const MIN_LINE_BREAKS: usize = 5;

static PAGE_PARAM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]page=(\d+)").unwrap());

/// Raw novel metadata as found on the page. Links are not yet absolute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NovelMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub rating: Option<f64>,
    pub description: Vec<String>,
    pub genres: Vec<String>,
    pub alternative_names: Option<Vec<String>>,
    pub status: Option<String>,
    pub is_completed: bool,
    pub thumbnail: Option<String>,
    pub first_chapter: Option<String>,
    pub latest_chapter: Option<String>,
    pub latest_chapter_title: Option<String>,
}

/// Title and body of one chapter page.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterContent {
    pub title: String,
    pub body: String,
}

/// Collected, trimmed text of an element.
pub fn text_of(elem: ElementRef) -> String {
    elem.text().collect::<String>().trim().to_string()
}

/// Text of the first node matching `selector`.
pub fn select_text(doc: &Html, selector: &Selector) -> Option<String> {
    match doc.select(selector).next() {
        Some(elem) => Some(text_of(elem)),
        None => {
            debug!(selector = ?selector, "no node matched");
            None
        }
    }
}

/// Text of every node matching `selector`, in document order.
pub fn select_texts(doc: &Html, selector: &Selector) -> Vec<String> {
    let texts: Vec<String> = doc.select(selector).map(text_of).collect();
    if texts.is_empty() {
        debug!(selector = ?selector, "no node matched");
    }
    texts
}

/// Value of `attr` on the first node matching `selector`.
pub fn select_attr(doc: &Html, selector: &Selector, attr: &str) -> Option<String> {
    let value = doc
        .select(selector)
        .next()
        .and_then(|elem| elem.value().attr(attr))
        .map(|v| v.trim().to_string());
    if value.is_none() {
        debug!(selector = ?selector, attr, "attribute not found");
    }
    value
}

/// Non-empty `href`s of the chapter links on a listing page, in document order.
pub fn chapter_hrefs(doc: &Html, strategy: &SiteStrategy) -> Vec<String> {
    doc.select(&strategy.selectors().chapter_links)
        .filter_map(|elem| elem.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// Raw value of the last listing page marker: the configured attribute, or the node text.
pub fn last_page_value(doc: &Html, strategy: &SiteStrategy) -> Option<String> {
    let selector = &strategy.selectors().last_toc_page;
    let attr = strategy.last_page_attribute();
    if attr.is_empty() {
        select_text(doc, selector)
    } else {
        select_attr(doc, selector, attr)
    }
}

/// Parses a listing page number.
///
/// Accepts plain integers, thousands separators (`1,204`) and links carrying
/// a `page=N` query parameter.
pub fn parse_page_number(raw: &str) -> Option<u32> {
    let plain: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if let Ok(n) = plain.parse() {
        return Some(n);
    }

    PAGE_PARAM_REGEX
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Extracts novel metadata. Any field may be absent; nothing here fails.
pub fn extract_novel_metadata(doc: &Html, strategy: &SiteStrategy) -> NovelMetadata {
    let s = strategy.selectors();

    let rating = s.rating.as_ref().and_then(|selector| {
        let raw = select_text(doc, selector)?;
        match raw.parse::<f64>() {
            Ok(rating) => Some(rating),
            Err(_) => {
                debug!(%raw, "rating is not a number");
                None
            }
        }
    });

    let status = select_text(doc, &s.status);
    let is_completed = status
        .as_deref()
        .is_some_and(|status| strategy.is_completed(status));

    let (latest_chapter, latest_chapter_title) = match &s.latest_chapter {
        Some(selector) => match doc.select(selector).next() {
            Some(elem) => (
                elem.value().attr("href").map(|h| h.trim().to_string()),
                Some(text_of(elem)),
            ),
            None => (None, None),
        },
        None => (None, None),
    };

    NovelMetadata {
        title: select_text(doc, &s.title),
        author: select_text(doc, &s.author),
        rating,
        description: extract_description(doc, &s.description),
        genres: select_texts(doc, &s.genres),
        alternative_names: s
            .alternative_names
            .as_ref()
            .map(|selector| select_texts(doc, selector)),
        status,
        is_completed,
        thumbnail: select_attr(doc, &s.thumbnail, "src")
            .filter(|src| !src.is_empty())
            .or_else(|| select_attr(doc, &s.thumbnail, "data-src")),
        first_chapter: chapter_hrefs(doc, strategy).into_iter().next(),
        latest_chapter,
        latest_chapter_title,
    }
}

/// Description paragraphs. When the nodes carry no text, reads the
/// `content` attribute of the first one (social metadata tags).
fn extract_description(doc: &Html, selector: &Selector) -> Vec<String> {
    let paragraphs = select_texts(doc, selector);
    if paragraphs.is_empty() || paragraphs.iter().any(|p| !p.is_empty()) {
        return paragraphs;
    }

    debug!("description text is empty, reading content attribute");
    select_attr(doc, selector, "content")
        .filter(|content| !content.is_empty())
        .into_iter()
        .collect()
}

/// Whether the alternate body selector should be tried.
pub fn needs_alternate(primary_count: usize) -> bool {
    primary_count < MIN_PARAGRAPHS
}

/// Whether the alternate result replaces the primary one. The two are never merged.
pub fn prefer_alternate(primary_count: usize, alternate_count: usize) -> bool {
    needs_alternate(primary_count) && alternate_count > primary_count
}

/// Whether a joined body is too thin to keep.
pub fn is_thin(body: &str) -> bool {
    body.trim().is_empty() || body.matches('\n').count() < MIN_LINE_BREAKS
}

/// Joins paragraphs with newlines, substituting the sentinel for thin results.
pub fn finalize_body(paragraphs: &[String]) -> String {
    let body = paragraphs.join("\n");
    if is_thin(&body) {
        NO_CONTENT.to_string()
    } else {
        body
    }
}

/// Extracts a chapter's title and body, applying the alternate-selector
/// fallback and the thin-content sentinel.
pub fn extract_chapter(doc: &Html, strategy: &SiteStrategy) -> ChapterContent {
    let s = strategy.selectors();
    let title = select_text(doc, &s.chapter_title).unwrap_or_default();

    let mut paragraphs = select_texts(doc, &s.chapter_content);
    if needs_alternate(paragraphs.len()) {
        let alternate = select_texts(doc, &s.alternative_chapter_content);
        warn!(
            title = %title,
            primary = paragraphs.len(),
            alternate = alternate.len(),
            "few paragraphs, tried alternate selector"
        );
        if prefer_alternate(paragraphs.len(), alternate.len()) {
            paragraphs = alternate;
        }
    }

    let body = finalize_body(&paragraphs);
    if body == NO_CONTENT {
        warn!(title = %title, "no usable content");
    }

    ChapterContent { title, body }
}
