//! Persistence of novels and their chapters.
//!
//! [`NovelStore`] is the seam the engine needs: the resume marker for a
//! novel and an idempotent upsert. [`JsonStore`] keeps one JSON file per
//! novel on disk.

use crate::error::StoreError;
use crate::models::{ChapterRecord, NovelRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Storage for novels and chapters, keyed by novel URL.
#[async_trait]
pub trait NovelStore: Send + Sync {
    /// URL of the last chapter saved for the novel, if any.
    async fn last_saved_chapter_url(&self, novel_url: &Url) -> Result<Option<String>, StoreError>;

    /// Listing page index recorded with the last saved novel, if any.
    async fn last_toc_page(&self, novel_url: &Url) -> Result<Option<u32>, StoreError>;

    /// Saves the novel record and chapters. Chapters already stored under the
    /// same URL are replaced in place. Returns how many chapters were new.
    async fn upsert(
        &self,
        novel: &NovelRecord,
        chapters: &[ChapterRecord],
    ) -> Result<usize, StoreError>;
}

/// Everything stored for one novel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredNovel {
    pub novel: NovelRecord,
    /// Chapters in the order they were first saved.
    pub chapters: Vec<ChapterRecord>,
}

/// JSON file store, one `<slug>.json` file per novel.
#[derive(Debug, Clone)]
pub struct JsonStore {
    directory: PathBuf,
}

impl JsonStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file holding `novel_url`.
    pub fn path_for(&self, novel_url: &Url) -> PathBuf {
        self.directory.join(format!("{}.json", slug(novel_url)))
    }

    /// Loads everything stored for a novel.
    pub async fn load(&self, novel_url: &Url) -> Result<Option<StoredNovel>, StoreError> {
        let path = self.path_for(novel_url);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, novel_url: &Url, stored: &StoredNovel) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let content = serde_json::to_string_pretty(stored)?;
        tokio::fs::write(self.path_for(novel_url), content).await?;
        Ok(())
    }
}

#[async_trait]
impl NovelStore for JsonStore {
    async fn last_saved_chapter_url(&self, novel_url: &Url) -> Result<Option<String>, StoreError> {
        Ok(self
            .load(novel_url)
            .await?
            .and_then(|stored| stored.chapters.last().map(|c| c.url.to_string())))
    }

    async fn last_toc_page(&self, novel_url: &Url) -> Result<Option<u32>, StoreError> {
        Ok(self
            .load(novel_url)
            .await?
            .map(|stored| stored.novel.last_toc_page)
            .filter(|&page| page > 0))
    }

    async fn upsert(
        &self,
        novel: &NovelRecord,
        chapters: &[ChapterRecord],
    ) -> Result<usize, StoreError> {
        let mut stored = match self.load(&novel.url).await? {
            Some(mut stored) => {
                stored.novel = novel.clone();
                stored
            }
            None => StoredNovel {
                novel: novel.clone(),
                chapters: Vec::new(),
            },
        };

        let mut inserted = 0;
        for chapter in chapters {
            match stored.chapters.iter_mut().find(|c| c.url == chapter.url) {
                Some(existing) => *existing = chapter.clone(),
                None => {
                    stored.chapters.push(chapter.clone());
                    inserted += 1;
                }
            }
        }

        self.save(&novel.url, &stored).await?;
        Ok(inserted)
    }
}

/// File-name-safe form of a URL: host and path, other characters as `-`.
fn slug(url: &Url) -> String {
    let raw = format!("{}{}", url.host_str().unwrap_or("local"), url.path());
    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '.' {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}
