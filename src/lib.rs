//! novelsync - incremental web novel discovery and extraction.
//!
//! This library provides functionality for:
//! - Describing how to read a site with per-host selector strategies
//! - Walking paginated tables of contents from a resume marker
//! - Downloading chapters concurrently with retry and extraction fallbacks
//! - Persisting novels and chapters between runs

pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod models;
pub mod scrapers;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use console::Console;
pub use error::{ConfigError, ScraperError, StoreError};
pub use models::{ChapterRecord, NO_CONTENT, NovelRecord};
pub use scrapers::{FetchContext, NovelScraper, SiteStrategy, StrategyRegistry, TocOptions};
pub use store::{JsonStore, NovelStore};
