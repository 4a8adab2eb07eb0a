use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::SanitySettings;
use crate::content::client::ContentStore;
use crate::content::query::{Query, QueryParams, Visibility};
use crate::error::AppError;

/// Longest slice of an error body kept in a log message.
const ERROR_BODY_LIMIT: usize = 512;

/// Sanity HTTP query API implementation of [`ContentStore`].
///
/// Published reads may go through the API CDN when enabled. Draft reads
/// always hit the live API and require a token, since the store only
/// exposes unreleased documents to authenticated callers.
pub struct SanityContentStore {
    http: reqwest::Client,
    api_url: String,
    cdn_url: Option<String>,
    token: Option<String>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
}

impl SanityContentStore {
    pub fn new(settings: &SanitySettings) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("portfolio/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        let endpoint = |host: &str| {
            format!(
                "https://{}.{}.sanity.io/v{}/data/query/{}",
                settings.project_id,
                host,
                settings.api_version(),
                settings.dataset
            )
        };

        Ok(Self {
            http,
            api_url: endpoint("api"),
            cdn_url: settings.use_cdn.then(|| endpoint("apicdn")),
            token: settings.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// The query endpoint used for the given scope.
    pub fn query_url(&self, visibility: Visibility) -> &str {
        match (visibility, &self.cdn_url) {
            (Visibility::Published, Some(cdn)) => cdn,
            _ => &self.api_url,
        }
    }
}

#[async_trait]
impl ContentStore for SanityContentStore {
    async fn fetch(
        &self,
        query: Query,
        params: &QueryParams,
        visibility: Visibility,
    ) -> Result<Value, AppError> {
        if visibility == Visibility::Drafts && self.token.is_none() {
            return Err(AppError::ContentFetch(
                "draft visibility requires an API token".into(),
            ));
        }

        let mut pairs = vec![
            ("query".to_string(), query.groq().to_string()),
            ("perspective".to_string(), visibility.perspective().to_string()),
        ];
        for (name, value) in params.iter() {
            // Parameters are JSON literals in the query string.
            let literal = serde_json::to_string(value)
                .map_err(|e| AppError::Internal(format!("Failed to encode parameter: {e}")))?;
            pairs.push((format!("${name}"), literal));
        }

        let mut request = self.http.get(self.query_url(visibility)).query(&pairs);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        tracing::debug!(query = ?query, perspective = visibility.perspective(), "querying content store");

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ContentFetch(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(AppError::ContentFetch(format!(
                "Store responded with {status}: {body}"
            )));
        }

        let payload: QueryResponse = response
            .json()
            .await
            .map_err(|e| AppError::ContentFetch(format!("Malformed response: {e}")))?;

        Ok(payload.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SanitySettings {
        SanitySettings {
            project_id: "abc123xy".to_string(),
            dataset: "production".to_string(),
            api_version: "2023-05-03".to_string(),
            token: None,
            use_cdn: false,
            timeout_secs: 10,
        }
    }

    #[test]
    fn test_query_url() {
        let store = SanityContentStore::new(&settings()).unwrap();
        assert_eq!(
            store.query_url(Visibility::Published),
            "https://abc123xy.api.sanity.io/v2023-05-03/data/query/production"
        );
        assert_eq!(
            store.query_url(Visibility::Drafts),
            store.query_url(Visibility::Published)
        );
    }

    #[test]
    fn test_cdn_only_serves_published() {
        let mut settings = settings();
        settings.use_cdn = true;
        let store = SanityContentStore::new(&settings).unwrap();
        assert_eq!(
            store.query_url(Visibility::Published),
            "https://abc123xy.apicdn.sanity.io/v2023-05-03/data/query/production"
        );
        assert_eq!(
            store.query_url(Visibility::Drafts),
            "https://abc123xy.api.sanity.io/v2023-05-03/data/query/production"
        );
    }

    #[tokio::test]
    async fn test_drafts_without_token_fail_before_network() {
        let store = SanityContentStore::new(&settings()).unwrap();
        let result = store
            .fetch(Query::PostBySlug, &QueryParams::new().with("slug", "x"), Visibility::Drafts)
            .await;
        match result {
            Err(AppError::ContentFetch(msg)) => assert!(msg.contains("token")),
            other => panic!("Expected ContentFetch error, got: {:?}", other),
        }
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let mut settings = settings();
        settings.token = Some(String::new());
        let store = SanityContentStore::new(&settings).unwrap();
        assert!(store.token.is_none());
    }
}
