use serde::Deserialize;

use crate::content::client::ContentClient;
use crate::content::query::Visibility;
use crate::error::AppError;
use crate::models::slug::Slug;
use crate::preview::secret::secrets_match;

/// Query string of `GET /api/draft`.
#[derive(Debug, Default, Deserialize)]
pub struct EnterPreviewQuery {
    pub secret: Option<String>,
    pub slug: Option<String>,
}

/// Query string of `GET /api/exit-preview`.
#[derive(Debug, Default, Deserialize)]
pub struct ExitPreviewQuery {
    pub redirect: Option<String>,
}

/// Core preview-entry logic, separated from the HTTP layer.
///
/// Validates the shared secret and the slug, then resolves the post through
/// the drafts scope so that unreleased posts can be previewed. Returns the
/// page the client should be sent to.
pub async fn process_enter_preview(
    content: &ContentClient,
    expected_secret: &str,
    query: EnterPreviewQuery,
) -> Result<String, AppError> {
    // 1. Validate the secret
    let secret = query.secret.unwrap_or_default();
    if !secrets_match(&secret, expected_secret) {
        return Err(AppError::Unauthorized("Invalid token".into()));
    }

    // 2. Require a slug
    let raw_slug = query.slug.unwrap_or_default();
    if raw_slug.is_empty() {
        return Err(AppError::BadRequest("No slug in the request".into()));
    }

    // 3. Resolve the post, drafts included. A slug that cannot name a
    //    document resolves to nothing.
    let Ok(slug) = Slug::parse(&raw_slug) else {
        return Err(AppError::NotFound("Invalid slug".into()));
    };
    let post = content
        .post_by_slug(&slug, Visibility::Drafts)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid slug".into()))?;

    // 4. Redirect to the post's canonical page with the preview marker
    Ok(format!(
        "/blog/{}?preview=true",
        urlencoding::encode(post.slug.as_str())
    ))
}

/// Status used for a rejected preview entry.
///
/// Every client-side rejection answers 401 unless distinct codes are enabled.
pub fn rejection_status(error: &AppError, distinct: bool) -> axum::http::StatusCode {
    use axum::http::StatusCode;

    match error {
        e if e.is_server_fault() => StatusCode::INTERNAL_SERVER_ERROR,
        e if distinct => e.status_code(),
        _ => StatusCode::UNAUTHORIZED,
    }
}

/// The exit target: a site-local path or `/`.
pub fn exit_target(redirect: Option<&str>) -> &str {
    match redirect {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}

/// Axum handler for `GET /api/draft`.
///
/// On success sets the signed preview cookie and answers with a temporary
/// redirect. Rejections carry a plain-text message and never touch the jar.
pub async fn enter_preview_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    jar: axum_extra::extract::SignedCookieJar,
    axum::extract::Query(query): axum::extract::Query<EnterPreviewQuery>,
) -> axum::response::Response {
    use axum::response::IntoResponse;

    match process_enter_preview(&state.content, &state.settings.preview.secret, query).await {
        Ok(target) => {
            let session = crate::preview::session::PreviewSession::start();
            tracing::info!(%target, "entering preview");
            let jar = jar.add(session.to_cookie(&state.settings.preview));
            (jar, axum::response::Redirect::temporary(&target)).into_response()
        }
        Err(e) => {
            let status = rejection_status(&e, state.settings.preview.distinct_status_codes);
            let message = if e.is_server_fault() {
                tracing::error!(error = %e, "preview entry failed");
                "Internal error".to_string()
            } else {
                tracing::info!(error = %e, "preview entry rejected");
                client_message(e)
            };
            (status, message).into_response()
        }
    }
}

/// Axum handler for `GET /api/exit-preview`.
pub async fn exit_preview_handler(
    jar: axum_extra::extract::SignedCookieJar,
    axum::extract::Query(query): axum::extract::Query<ExitPreviewQuery>,
) -> (axum_extra::extract::SignedCookieJar, axum::response::Redirect) {
    let target = exit_target(query.redirect.as_deref());
    let jar = jar.remove(crate::preview::session::PreviewSession::removal_cookie());
    (jar, axum::response::Redirect::temporary(target))
}

fn client_message(error: AppError) -> String {
    match error {
        AppError::Unauthorized(msg) | AppError::BadRequest(msg) | AppError::NotFound(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::client::MockContentStore;
    use crate::content::query::Query;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    const SECRET: &str = "abc123";

    fn query(secret: Option<&str>, slug: Option<&str>) -> EnterPreviewQuery {
        EnterPreviewQuery {
            secret: secret.map(str::to_string),
            slug: slug.map(str::to_string),
        }
    }

    fn untouched_store() -> ContentClient {
        let mut mock = MockContentStore::new();
        mock.expect_fetch().times(0);
        ContentClient::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_wrong_secret() {
        let result =
            process_enter_preview(&untouched_store(), SECRET, query(Some("wrong"), Some("hello-world")))
                .await;
        match result {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Invalid token"),
            other => panic!("Expected Unauthorized error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_secret() {
        let result =
            process_enter_preview(&untouched_store(), SECRET, query(None, Some("hello-world"))).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_secret_checked_before_slug() {
        let result = process_enter_preview(&untouched_store(), SECRET, query(Some("wrong"), None)).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_missing_or_empty_slug() {
        for slug in [None, Some("")] {
            let result =
                process_enter_preview(&untouched_store(), SECRET, query(Some(SECRET), slug)).await;
            match result {
                Err(AppError::BadRequest(msg)) => assert_eq!(msg, "No slug in the request"),
                other => panic!("Expected BadRequest error, got: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_malformed_slug_is_not_found() {
        let result = process_enter_preview(
            &untouched_store(),
            SECRET,
            query(Some(SECRET), Some("../etc/passwd")),
        )
        .await;
        match result {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Invalid slug"),
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_slug() {
        let mut mock = MockContentStore::new();
        mock.expect_fetch()
            .withf(|q, _, visibility| *q == Query::PostBySlug && *visibility == Visibility::Drafts)
            .times(1)
            .returning(|_, _, _| Ok(serde_json::Value::Null));
        let content = ContentClient::new(Arc::new(mock));

        let result =
            process_enter_preview(&content, SECRET, query(Some(SECRET), Some("does-not-exist"))).await;
        match result {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Invalid slug"),
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_uses_drafts_scope() {
        let mut mock = MockContentStore::new();
        mock.expect_fetch()
            .withf(|q, params, visibility| {
                *q == Query::PostBySlug
                    && params.get("slug") == Some("hello-world")
                    && *visibility == Visibility::Drafts
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(json!({
                    "_id": "drafts.post-hello-world",
                    "title": "Hello World",
                    "slug": { "current": "hello-world" }
                }))
            });
        let content = ContentClient::new(Arc::new(mock));

        let target =
            process_enter_preview(&content, SECRET, query(Some(SECRET), Some("hello-world")))
                .await
                .unwrap();
        assert_eq!(target, "/blog/hello-world?preview=true");
    }

    #[tokio::test]
    async fn test_untitled_draft_can_be_previewed() {
        let mut mock = MockContentStore::new();
        mock.expect_fetch().times(1).returning(|_, _, _| {
            Ok(json!({
                "_id": "drafts.post-fresh",
                "slug": { "current": "fresh-idea" }
            }))
        });
        let content = ContentClient::new(Arc::new(mock));

        let target =
            process_enter_preview(&content, SECRET, query(Some(SECRET), Some("fresh-idea")))
                .await
                .unwrap();
        assert_eq!(target, "/blog/fresh-idea?preview=true");
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut mock = MockContentStore::new();
        mock.expect_fetch()
            .returning(|_, _, _| Err(AppError::ContentFetch("timeout".into())));
        let content = ContentClient::new(Arc::new(mock));

        let result =
            process_enter_preview(&content, SECRET, query(Some(SECRET), Some("hello-world"))).await;
        assert!(matches!(result, Err(AppError::ContentFetch(_))));
    }

    #[test]
    fn test_rejection_status() {
        let bad = AppError::BadRequest("No slug in the request".into());
        let missing = AppError::NotFound("Invalid slug".into());
        let fault = AppError::ContentFetch("timeout".into());

        assert_eq!(rejection_status(&bad, false), StatusCode::UNAUTHORIZED);
        assert_eq!(rejection_status(&missing, false), StatusCode::UNAUTHORIZED);
        assert_eq!(rejection_status(&bad, true), StatusCode::BAD_REQUEST);
        assert_eq!(rejection_status(&missing, true), StatusCode::NOT_FOUND);
        assert_eq!(rejection_status(&fault, false), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_exit_target() {
        assert_eq!(exit_target(None), "/");
        assert_eq!(exit_target(Some("/blog")), "/blog");
        assert_eq!(exit_target(Some("//evil.example.com")), "/");
        assert_eq!(exit_target(Some("https://evil.example.com")), "/");
        assert_eq!(exit_target(Some("/\\evil.example.com")), "/");
        assert_eq!(exit_target(Some("")), "/");
    }
}
