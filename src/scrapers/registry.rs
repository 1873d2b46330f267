//! Lookup table from site authority to strategy.

use super::strategy::{SiteStrategy, StrategyConfig, authority_of, builtin};
use crate::error::ScraperError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;
use url::Url;

/// Registry of available strategies, keyed by exact authority.
///
/// Populated at start-up and read-only afterwards; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<SiteStrategy>>,
}

impl StrategyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in strategies followed by `extra`.
    pub fn with_sites(extra: &[StrategyConfig]) -> Result<Self, ScraperError> {
        let mut registry = Self::new();
        for config in builtin().iter().chain(extra) {
            registry.register(SiteStrategy::from_config(config)?)?;
        }
        Ok(registry)
    }

    /// Adds a strategy. Fails if its authority is already taken.
    pub fn register(&mut self, strategy: SiteStrategy) -> Result<(), ScraperError> {
        let authority = strategy.authority().to_string();
        if self.strategies.contains_key(&authority) {
            return Err(ScraperError::DuplicateStrategy(authority));
        }
        self.strategies.insert(authority, Arc::new(strategy));
        Ok(())
    }

    /// Finds the strategy for the scheme, host and port of `url`.
    ///
    /// A miss is logged and returned as [`ScraperError::UnsupportedSite`] so
    /// callers can skip the novel.
    pub fn resolve(&self, url: &Url) -> Result<Arc<SiteStrategy>, ScraperError> {
        let authority = authority_of(url);
        match self.strategies.get(&authority) {
            Some(strategy) => Ok(Arc::clone(strategy)),
            None => {
                error!(%authority, "no scraper strategy registered");
                Err(ScraperError::UnsupportedSite(authority))
            }
        }
    }

    /// Registered authorities, sorted.
    pub fn authorities(&self) -> Vec<&str> {
        let mut all: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        all.sort_unstable();
        all
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> StrategyRegistry {
        StrategyRegistry::with_sites(&[]).unwrap()
    }

    #[test]
    fn test_builtins_registered() {
        let registry = registry();
        assert_eq!(
            registry.authorities(),
            vec!["https://novelfull.com", "https://www.webnovelpub.com"]
        );
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = registry();
        let config = builtin().remove(0);
        let err = registry
            .register(SiteStrategy::from_config(&config).unwrap())
            .unwrap_err();
        assert!(matches!(err, ScraperError::DuplicateStrategy(a) if a == "https://novelfull.com"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_from_config_rejected() {
        let extra = vec![builtin().remove(1)];
        assert!(matches!(
            StrategyRegistry::with_sites(&extra),
            Err(ScraperError::DuplicateStrategy(_))
        ));
    }

    #[test]
    fn test_resolve_is_exact() {
        let registry = registry();
        let url = Url::parse("https://novelfull.com/supremacy-games.html").unwrap();
        assert!(registry.resolve(&url).is_ok());

        // Different host, scheme or port do not match
        for other in [
            "https://www.novelfull.com/x.html",
            "http://novelfull.com/x.html",
            "https://novelfull.com:8443/x.html",
            "https://webnovelpub.com/novel/x",
        ] {
            let url = Url::parse(other).unwrap();
            assert!(
                matches!(registry.resolve(&url), Err(ScraperError::UnsupportedSite(_))),
                "{other} should not resolve"
            );
        }
    }

    #[test]
    fn test_resolve_returns_same_instance() {
        let registry = registry();
        let url = Url::parse("https://www.webnovelpub.com/novel/abc/chapters").unwrap();
        let first = registry.resolve(&url).unwrap();
        let second = registry.resolve(&url).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
