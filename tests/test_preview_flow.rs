mod common;

use axum::http::StatusCode;
use cookie::Cookie;

use common::{draft_url, TestEnv, SECRET};
use portfolio::preview::session::PREVIEW_COOKIE;

#[tokio::test]
async fn wrong_secret_is_rejected_without_cookie() {
    let env = TestEnv::start();
    let server = env.server_permissive();

    let response = server.get(&draft_url("wrong", "hello-world")).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    response.assert_text("Invalid token");
    assert!(response.maybe_cookie(PREVIEW_COOKIE).is_none());

    server
        .get("/blog/upcoming-post")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_secret_is_rejected() {
    let env = TestEnv::start();
    let server = env.server_permissive();

    let response = server.get("/api/draft?slug=hello-world").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    response.assert_text("Invalid token");
}

#[tokio::test]
async fn missing_or_empty_slug_is_rejected() {
    let env = TestEnv::start();
    let server = env.server_permissive();

    for url in [format!("/api/draft?secret={SECRET}"), draft_url(SECRET, "")] {
        let response = server.get(&url).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_text("No slug in the request");
        assert!(response.maybe_cookie(PREVIEW_COOKIE).is_none());
    }
}

#[tokio::test]
async fn unknown_slug_is_rejected() {
    let env = TestEnv::start();
    let server = env.server_permissive();

    let response = server.get(&draft_url(SECRET, "does-not-exist")).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    response.assert_text("Invalid slug");
    assert!(response.maybe_cookie(PREVIEW_COOKIE).is_none());
}

#[tokio::test]
async fn valid_entry_redirects_and_starts_session() {
    let env = TestEnv::start();
    let server = env.server_permissive();

    let response = server.get(&draft_url(SECRET, "hello-world")).await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.header("location"),
        "/blog/hello-world?preview=true"
    );
    let cookie = response.cookie(PREVIEW_COOKIE);
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));

    // The session now shows drafts.
    let page = server.get("/blog/hello-world?preview=true").await;
    page.assert_status_ok();
    let html = page.text();
    assert!(html.contains("Hello World (revised)"));
    assert!(html.contains("You are in preview mode."));
    assert!(html.contains("/api/exit-preview"));
    assert_eq!(page.header("cache-control"), "private, no-store");
}

#[tokio::test]
async fn draft_only_post_can_be_previewed() {
    let env = TestEnv::start();
    let server = env.server_permissive();

    let response = server.get(&draft_url(SECRET, "upcoming-post")).await;
    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.header("location"),
        "/blog/upcoming-post?preview=true"
    );

    let page = server.get("/blog/upcoming-post").await;
    page.assert_status_ok();
    assert!(page.text().contains("Upcoming Post"));

    let listing = server.get("/blog").await;
    assert!(listing.text().contains("Upcoming Post"));
}

#[tokio::test]
async fn exit_returns_to_published_view() {
    let env = TestEnv::start();
    let server = env.server_permissive();

    server.get(&draft_url(SECRET, "upcoming-post")).await;
    server
        .get("/blog/upcoming-post")
        .await
        .assert_status_ok();

    let exit = server.get("/api/exit-preview").await;
    exit.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(exit.header("location"), "/");

    server
        .get("/blog/upcoming-post")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let published = server.get("/blog/hello-world").await;
    published.assert_status_ok();
    let html = published.text();
    assert!(!html.contains("(revised)"));
    assert!(!html.contains("You are in preview mode."));
}

#[tokio::test]
async fn exit_is_idempotent_and_honours_local_redirects() {
    let env = TestEnv::start();
    let server = env.server_permissive();

    let response = server.get("/api/exit-preview").await;
    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "/");

    let response = server.get("/api/exit-preview?redirect=/projects").await;
    assert_eq!(response.header("location"), "/projects");

    let response = server
        .get("/api/exit-preview?redirect=//evil.example.com")
        .await;
    assert_eq!(response.header("location"), "/");
}

#[tokio::test]
async fn repeated_entry_yields_same_target() {
    let env = TestEnv::start();
    let server = env.server_permissive();

    let first = server.get(&draft_url(SECRET, "hello-world")).await;
    server.get("/api/exit-preview").await;
    let second = server.get(&draft_url(SECRET, "hello-world")).await;

    assert_eq!(first.header("location"), second.header("location"));
}

#[tokio::test]
async fn preview_marker_alone_grants_nothing() {
    let env = TestEnv::start();
    let server = env.server_permissive();

    server
        .get("/blog/upcoming-post?preview=true")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let page = server.get("/blog/hello-world?preview=true").await;
    page.assert_status_ok();
    let html = page.text();
    assert!(!html.contains("(revised)"));
    assert!(!html.contains("You are in preview mode."));
}

#[tokio::test]
async fn tampered_cookie_is_treated_as_normal() {
    let env = TestEnv::start();
    let server = env.server_permissive();

    let issued = chrono::Utc::now().timestamp().to_string();
    let response = server
        .get("/blog/upcoming-post")
        .add_cookie(Cookie::new(PREVIEW_COOKIE, issued))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cookie_signed_with_another_key_is_rejected() {
    let env = TestEnv::start();
    let other = TestEnv::start();

    let foreign = other.server_permissive();
    let cookie = foreign
        .get(&draft_url(SECRET, "hello-world"))
        .await
        .cookie(PREVIEW_COOKIE);

    env.server_permissive()
        .get("/blog/upcoming-post")
        .add_cookie(cookie)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_session_is_treated_as_normal() {
    let env = TestEnv::start_with(|settings| settings.preview.max_age_secs = 1);
    let server = env.server_permissive();

    server
        .get(&draft_url(SECRET, "upcoming-post"))
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);

    tokio::time::sleep(std::time::Duration::from_millis(2_100)).await;

    server
        .get("/blog/upcoming-post")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn distinct_status_codes_when_enabled() {
    let env = TestEnv::start_with(|settings| settings.preview.distinct_status_codes = true);
    let server = env.server_permissive();

    server
        .get(&draft_url("wrong", "hello-world"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let response = server.get(&draft_url(SECRET, "")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_text("No slug in the request");

    let response = server.get(&draft_url(SECRET, "does-not-exist")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_text("Invalid slug");
}

#[tokio::test]
async fn store_failure_is_uniform_internal_error() {
    let env = TestEnv::start();
    let server = env.failing_server();

    let response = server.get(&draft_url(SECRET, "hello-world")).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    response.assert_text("Internal error");
    assert!(response.maybe_cookie(PREVIEW_COOKIE).is_none());
}
