use crate::adapters::html::{first_image_src, image_selector};
use crate::domain::model::ResolutionResult;
use crate::domain::ports::{ImageSearch, Sleeper};
use crate::utils::error::Result;
use scraper::Selector;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Tries per ladder attempt.
    pub max_tries: u32,
    pub initial_backoff: Duration,
    /// Appended to the query after the raw query finds nothing.
    pub query_suffixes: Vec<String>,
    /// CSS class of result thumbnails.
    pub image_class: String,
    /// Keep trying when a page loads fine but holds no matching image.
    pub retry_on_empty: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_tries: 3,
            initial_backoff: Duration::from_secs(1),
            query_suffixes: vec!["product".to_string(), "image".to_string()],
            image_class: "mimg".to_string(),
            retry_on_empty: false,
        }
    }
}

/// Maps a query to at most one image URL. Never fails: every transport
/// or parse problem folds into `None`.
pub struct ImageResolver<S: ImageSearch, Z: Sleeper> {
    search: S,
    sleeper: Z,
    settings: ResolverSettings,
    selector: Selector,
}

impl<S: ImageSearch, Z: Sleeper> ImageResolver<S, Z> {
    /// Fails when `settings.image_class` does not form a valid selector.
    pub fn new(search: S, sleeper: Z, settings: ResolverSettings) -> Result<Self> {
        let selector = image_selector(&settings.image_class)?;
        Ok(Self {
            search,
            sleeper,
            settings,
            selector,
        })
    }

    pub fn sleeper(&self) -> &Z {
        &self.sleeper
    }

    pub async fn resolve(&self, query: &str) -> Option<String> {
        self.resolve_detailed(query).await.url
    }

    /// Raw query first, then one attempt per suffix, stopping at the first hit.
    pub async fn resolve_detailed(&self, query: &str) -> ResolutionResult {
        let candidates = std::iter::once(query.to_string()).chain(
            self.settings
                .query_suffixes
                .iter()
                .map(|suffix| format!("{} {}", query, suffix)),
        );

        let mut attempts_used = 0;
        for candidate in candidates {
            attempts_used += 1;
            if let Some(url) = self.fetch_once(&candidate).await {
                tracing::debug!("Resolved '{}' on attempt {}: {}", query, attempts_used, url);
                return ResolutionResult {
                    url: Some(url),
                    attempts_used,
                };
            }
        }

        tracing::debug!("No image found for '{}' after {} attempts", query, attempts_used);
        ResolutionResult {
            url: None,
            attempts_used,
        }
    }

    /// One ladder attempt with exponential backoff between failed tries.
    pub async fn fetch_once(&self, query: &str) -> Option<String> {
        let mut backoff = self.settings.initial_backoff;

        for try_no in 1..=self.settings.max_tries {
            let failure = match self.search.fetch(query).await {
                Ok(response) if response.status == 200 => {
                    match first_image_src(&response.body, &self.selector) {
                        Ok(Some(src)) => return Some(src),
                        Ok(None) if self.settings.retry_on_empty => {
                            tracing::debug!("No images for '{}' (try {}), retrying", query, try_no);
                            continue;
                        }
                        Ok(None) => {
                            tracing::debug!("No images for '{}'", query);
                            return None;
                        }
                        Err(e) => e.to_string(),
                    }
                }
                Ok(response) => format!("HTTP status {}", response.status),
                Err(e) => e.to_string(),
            };

            tracing::warn!(
                "Search for '{}' failed (try {}/{}): {}; backing off {:?}",
                query,
                try_no,
                self.settings.max_tries,
                failure,
                backoff
            );
            self.sleeper.sleep(backoff).await;
            backoff *= 2;
        }

        None
    }
}
