//! Document loading with retry, concurrency cap and cancellation.

use super::{create_http_client, delay_duration, rate_limit};
use crate::config::ScrapingConfig;
use crate::error::ScraperError;
use reqwest::StatusCode;
use scraper::Html;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Shared state for one processing run.
///
/// Holds the HTTP client, the concurrency cap on chapter fetches and the
/// cancellation token. Construct one per run; clones share all three.
#[derive(Debug, Clone)]
pub struct FetchContext {
    client: reqwest::Client,
    config: ScrapingConfig,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl FetchContext {
    /// Creates a context from the scraping configuration.
    pub fn new(config: ScrapingConfig) -> Result<Self, ScraperError> {
        let client = create_http_client(&config)?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a context around an existing client.
    pub fn with_client(client: reqwest::Client, config: ScrapingConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self {
            client,
            config,
            permits,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ScrapingConfig {
        &self.config
    }

    /// Token that aborts every in-flight load of this context when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Number of fetch slots currently free.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for a fetch slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> Result<SemaphorePermit<'_>, ScraperError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ScraperError::Cancelled),
            permit = self.permits.acquire() => permit.map_err(|_| ScraperError::Cancelled),
        }
    }

    /// Fetches `url` and parses it into a document tree.
    ///
    /// Parsing is best-effort: malformed markup still yields a tree.
    pub async fn load(&self, url: &Url) -> Result<Html, ScraperError> {
        let text = self.fetch_text(url).await?;
        Ok(Html::parse_document(&text))
    }

    /// Fetches the body of `url` as text.
    ///
    /// A 503 is retried up to `retry_attempts` attempts in total with a fixed
    /// delay between attempts; any other failure status is returned at once.
    pub async fn fetch_text(&self, url: &Url) -> Result<String, ScraperError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ScraperError::Cancelled),
            result = self.fetch_with_retry(url) => result,
        }
    }

    async fn fetch_with_retry(&self, url: &Url) -> Result<String, ScraperError> {
        let max_attempts = self.config.retry_attempts.max(1);
        let retry_delay = delay_duration(self.config.retry_delay_sec);
        let mut attempt = 0;

        loop {
            attempt += 1;
            rate_limit(self.config.delay_between_requests_sec).await;

            debug!(%url, attempt, "GET");
            let response = self.client.get(url.as_str()).send().await?;
            let status = response.status();

            if status == StatusCode::SERVICE_UNAVAILABLE {
                warn!(%url, attempt, max_attempts, "service unavailable");
                if attempt >= max_attempts {
                    return Err(ScraperError::FetchExhausted {
                        url: url.to_string(),
                        attempts: attempt,
                    });
                }
                tokio::time::sleep(retry_delay).await;
                continue;
            }

            if !status.is_success() {
                return Err(ScraperError::Fetch {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            return Ok(response.text().await?);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_releases_on_drop() {
        let config = ScrapingConfig {
            concurrency: 2,
            ..ScrapingConfig::default()
        };
        let ctx = FetchContext::new(config).unwrap();
        assert_eq!(ctx.available_permits(), 2);
        {
            let _a = ctx.acquire().await.unwrap();
            let _b = ctx.acquire().await.unwrap();
            assert_eq!(ctx.available_permits(), 0);
        }
        assert_eq!(ctx.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_context_refuses_work() {
        let ctx = FetchContext::new(ScrapingConfig::default()).unwrap();
        ctx.cancellation_token().cancel();
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.acquire().await, Err(ScraperError::Cancelled)));

        let url = Url::parse("http://127.0.0.1:9/never").unwrap();
        assert!(matches!(ctx.load(&url).await, Err(ScraperError::Cancelled)));
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_allows_one() {
        let config = ScrapingConfig {
            concurrency: 0,
            ..ScrapingConfig::default()
        };
        let ctx = FetchContext::new(config).unwrap();
        assert_eq!(ctx.available_permits(), 1);
    }
}
