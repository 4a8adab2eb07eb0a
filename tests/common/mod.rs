use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum_extra::extract::cookie::Key;

use portfolio::app::{router, AppState};
use portfolio::config::Settings;
use portfolio::content::client::ContentStore;
use portfolio::content::demo::DemoContentStore;
use portfolio::content::query::{Query, QueryParams, Visibility};
use portfolio::error::AppError;

/// Preview secret configured for every test environment.
pub const SECRET: &str = "abc123";

/// An application wired to the in-memory demo store.
///
/// The store is shared with the router, so tests can change content and
/// observe how pages react.
pub struct TestEnv {
    pub router: Router,
    pub store: Arc<DemoContentStore>,
    pub state: AppState,
}

impl TestEnv {
    pub fn start() -> Self {
        Self::start_with(|_| {})
    }

    /// Start with settings adjusted by `tweak` before the state is built.
    pub fn start_with(tweak: impl FnOnce(&mut Settings)) -> Self {
        let vars: HashMap<String, String> = [
            ("PORTFOLIO__PREVIEW__SECRET", SECRET),
            ("PORTFOLIO__DEMO_MODE", "true"),
            ("PORTFOLIO__SERVER__SITE_NAME", "Test Site"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut settings = Settings::load_from(None, vars).expect("Failed to load settings");
        tweak(&mut settings);
        settings.validate().expect("Invalid test settings");

        let store = Arc::new(DemoContentStore::seeded().expect("Failed to seed demo store"));
        let state = AppState::new(settings, store.clone(), Key::generate());

        Self {
            router: router(state.clone()),
            store,
            state,
        }
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .expect_success_by_default()
            .build(self.router.clone())
    }

    /// Build a `TestServer` that does NOT expect success by default (for
    /// redirects and error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .build(self.router.clone())
    }

    /// Same settings, but every store request fails. Returns the server and
    /// the state so tests can inspect the page cache.
    pub fn failing(&self) -> (axum_test::TestServer, AppState) {
        let settings = (*self.state.settings).clone();
        let state = AppState::new(settings, Arc::new(FailingStore), Key::generate());
        let server = axum_test::TestServer::builder()
            .save_cookies()
            .build(router(state.clone()));
        (server, state)
    }

    pub fn failing_server(&self) -> axum_test::TestServer {
        self.failing().0
    }
}

/// Detail the store reports on failure; must never reach a client.
pub const STORE_FAILURE: &str = "https://secret-project.api.sanity.io refused the connection";

/// A store whose every request fails, as when the network is down.
pub struct FailingStore;

#[async_trait]
impl ContentStore for FailingStore {
    async fn fetch(
        &self,
        _query: Query,
        _params: &QueryParams,
        _visibility: Visibility,
    ) -> Result<serde_json::Value, AppError> {
        Err(AppError::ContentFetch(STORE_FAILURE.into()))
    }
}

/// The `/api/draft` URL for a secret and slug.
pub fn draft_url(secret: &str, slug: &str) -> String {
    format!("/api/draft?secret={secret}&slug={slug}")
}
