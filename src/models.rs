//! Records produced by the discovery and extraction engine.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

/// Body stored when a chapter page yielded no usable text.
pub const NO_CONTENT: &str = "No content found";

static DIGITS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Metadata for one novel plus the chapters discovered since the resume marker.
///
/// Every URL field is absolute; the assembler resolves them before returning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NovelRecord {
    /// URL the novel was requested with (the table of contents).
    pub url: Url,

    pub title: Option<String>,

    pub author: Option<String>,

    /// Site rating, only present when the strategy configures a selector.
    pub rating: Option<f64>,

    /// Description paragraphs in document order.
    pub description: Vec<String>,

    pub genres: Vec<String>,

    pub alternative_names: Option<Vec<String>>,

    /// Raw status text as shown by the site.
    pub status: Option<String>,

    /// Whether `status` contains the strategy's completed token.
    pub is_completed: bool,

    pub thumbnail_url: Option<Url>,

    /// The last listing page at the time of the walk.
    pub last_toc_page_url: Url,

    /// Index of `last_toc_page_url`. Later runs start walking from here.
    #[serde(default)]
    pub last_toc_page: u32,

    pub first_chapter_url: Option<Url>,

    pub latest_chapter_url: Option<Url>,

    pub latest_chapter_title: Option<String>,

    /// Chapters newer than the resume marker, in traversal order.
    pub chapter_urls: Vec<Url>,
}

/// One downloaded chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterRecord {
    /// Source URL, unique within a novel.
    pub url: Url,

    pub title: String,

    /// Paragraphs joined with `\n`, or [`NO_CONTENT`].
    pub body: String,

    /// First run of digits in the title, 0 when there is none.
    pub number: u32,

    pub fetched_at: DateTime<Utc>,
}

impl ChapterRecord {
    /// Builds a record, deriving the sequence number from the title.
    pub fn new(url: Url, title: String, body: String) -> Self {
        let number = sequence_number(&title);
        Self {
            url,
            title,
            body,
            number,
            fetched_at: Utc::now(),
        }
    }

    /// Record for a chapter whose page could not be fetched or parsed.
    pub fn empty(url: Url) -> Self {
        Self::new(url, String::new(), NO_CONTENT.to_string())
    }

    /// Returns true if extraction produced the sentinel instead of text.
    pub fn has_content(&self) -> bool {
        self.body != NO_CONTENT
    }
}

/// Parses the first run of digits in a chapter title.
///
/// Titles without digits, or with a number too large for `u32`, yield 0.
pub fn sequence_number(title: &str) -> u32 {
    DIGITS_REGEX
        .find(title)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_number() {
        assert_eq!(sequence_number("Chapter 42: Dawn"), 42);
        assert_eq!(sequence_number("Epilogue"), 0);
        assert_eq!(sequence_number("Vol 2 Chapter 7"), 2);
        assert_eq!(sequence_number(""), 0);
        assert_eq!(sequence_number("Chapter 99999999999999"), 0);
    }

    #[test]
    fn test_empty_record_uses_sentinel() {
        let url = Url::parse("https://novelfull.com/c-1.html").unwrap();
        let record = ChapterRecord::empty(url.clone());
        assert_eq!(record.url, url);
        assert_eq!(record.body, NO_CONTENT);
        assert_eq!(record.number, 0);
        assert!(!record.has_content());
    }

    #[test]
    fn test_new_record_number() {
        let url = Url::parse("https://novelfull.com/c-12.html").unwrap();
        let record = ChapterRecord::new(url, "Chapter 12 - Rain".to_string(), "text".to_string());
        assert_eq!(record.number, 12);
        assert!(record.has_content());
    }
}
