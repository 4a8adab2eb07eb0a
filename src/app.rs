use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::get;
use axum::Router;
use axum_extra::extract::cookie::Key;

use crate::api;
use crate::config::Settings;
use crate::content::client::{ContentClient, ContentStore};
use crate::content::demo::DemoContentStore;
use crate::content::sanity::SanityContentStore;
use crate::error::AppError;
use crate::pages::cache::PageCache;
use crate::pages::routes;

/// Shared application state available to all request handlers.
///
/// Everything here is read-only after startup except the page cache,
/// which is safe for concurrent use.
#[derive(Clone)]
pub struct AppState {
    /// Typed content client, one instance for both visibility scopes.
    pub content: ContentClient,
    pub settings: Arc<Settings>,
    /// Signs and verifies the preview cookie.
    pub cookie_key: Key,
    pub page_cache: PageCache,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn ContentStore>, cookie_key: Key) -> Self {
        let page_cache = PageCache::new(&settings.pages);
        Self {
            content: ContentClient::new(store),
            settings: Arc::new(settings),
            cookie_key,
            page_cache,
        }
    }

    /// Build the state from validated settings, picking the content store
    /// according to `demo_mode`.
    pub fn from_settings(settings: Settings) -> Result<Self, AppError> {
        let cookie_key = settings.cookie_key()?;
        let store: Arc<dyn ContentStore> = if settings.demo_mode {
            tracing::info!("demo mode enabled, serving embedded content");
            Arc::new(DemoContentStore::seeded()?)
        } else {
            tracing::info!(
                project_id = %settings.sanity.project_id,
                dataset = %settings.sanity.dataset,
                use_cdn = settings.sanity.use_cdn,
                drafts_enabled = settings.sanity.token.is_some(),
                "using Sanity content store"
            );
            Arc::new(SanityContentStore::new(&settings.sanity)?)
        };
        Ok(Self::new(settings, store, cookie_key))
    }
}

/// The application router, without outer middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health::health_handler))
        .route("/api/draft", get(api::preview::enter_preview_handler))
        .route("/api/exit-preview", get(api::preview::exit_preview_handler))
        .route("/", get(routes::home_handler))
        .route("/blog", get(routes::blog_index_handler))
        .route("/blog/{slug}", get(routes::post_handler))
        .route("/projects", get(routes::projects_index_handler))
        .route("/projects/{slug}", get(routes::project_handler))
        .fallback(routes::not_found_handler)
        .with_state(state)
}
