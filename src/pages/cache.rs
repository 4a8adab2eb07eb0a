//! Time-boxed cache of published page renders.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue};
use moka::future::Cache;

use crate::config::PageSettings;

/// Rendered HTML of published pages, keyed by request path.
///
/// An entry lives for the revalidation window; the first request after it
/// lapses renders afresh from the published scope. Draft renders never
/// enter this cache.
#[derive(Clone)]
pub struct PageCache {
    pages: Cache<String, Arc<str>>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(settings: &PageSettings) -> Self {
        let ttl = Duration::from_secs(settings.revalidate_secs);
        let pages = Cache::builder()
            .max_capacity(settings.cache_capacity)
            .time_to_live(ttl)
            .build();

        tracing::info!(
            cache_capacity = settings.cache_capacity,
            revalidate_secs = ttl.as_secs(),
            "page cache initialized"
        );

        Self { pages, ttl }
    }

    pub async fn get(&self, path: &str) -> Option<Arc<str>> {
        self.pages.get(path).await
    }

    pub async fn insert(&self, path: &str, html: Arc<str>) {
        self.pages.insert(path.to_string(), html).await;
    }

    /// Headers for a published response: shared caches may keep it for the
    /// revalidation window, browsers always revalidate.
    ///
    /// The same path renders drafts for a client holding the preview cookie,
    /// so stored copies are keyed on `Cookie`.
    pub fn published_headers(&self) -> HeaderMap {
        let ttl = self.ttl.as_secs();
        let value = format!("public, max-age=0, s-maxage={ttl}, stale-while-revalidate={ttl}");

        let mut headers = HeaderMap::new();
        if let Ok(val) = HeaderValue::from_str(&value) {
            headers.insert(header::CACHE_CONTROL, val);
        }
        headers.insert(header::VARY, HeaderValue::from_static("cookie"));
        headers
    }
}

/// Headers for any response that must not be stored: previews and errors.
pub fn private_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("private, no-store"),
    );
    headers
}
