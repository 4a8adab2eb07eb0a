use std::future::Future;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use leptos::prelude::*;

use crate::app::AppState;
use crate::components::layout::PageShell;
use crate::components::post::{PostArticle, PostList};
use crate::components::project::{ProjectArticle, ProjectList};
use crate::components::status::{NotFound, ServerError};
use crate::error::AppError;
use crate::models::document::DocumentKind;
use crate::models::slug::Slug;
use crate::pages::cache::private_headers;
use crate::preview::session::PreviewContext;
use crate::rendering::page::render_document;

/// Number of entries shown per section on the home page.
const HOME_SECTION_LEN: usize = 3;

/// Outcome of rendering a page body.
pub enum Rendered {
    /// A complete page. `cacheable` is false when part of it fell back to
    /// empty content after a fetch error.
    Page { html: String, cacheable: bool },
    NotFound,
    Failed,
}

/// Serve `path`, from the page cache when it can.
///
/// Previewing requests never read or fill the cache, and their responses
/// are marked uncacheable for shared caches too.
async fn serve<F, Fut>(state: &AppState, preview: PreviewContext, path: &str, render: F) -> Response
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Rendered>,
{
    if !preview.previewing {
        if let Some(html) = state.page_cache.get(path).await {
            tracing::debug!(path, "page cache hit");
            return html_response(StatusCode::OK, state.page_cache.published_headers(), &html);
        }
        tracing::debug!(path, "page cache miss, rendering");
    }

    match render().await {
        Rendered::Page { html, .. } if preview.previewing => {
            html_response(StatusCode::OK, private_headers(), &html)
        }
        Rendered::Page { html, cacheable } => {
            let html: Arc<str> = Arc::from(html);
            let headers = if cacheable {
                state.page_cache.insert(path, html.clone()).await;
                state.page_cache.published_headers()
            } else {
                private_headers()
            };
            html_response(StatusCode::OK, headers, &html)
        }
        Rendered::NotFound => not_found_response(state, preview),
        Rendered::Failed => server_error_response(state, preview),
    }
}

fn html_response(status: StatusCode, headers: HeaderMap, html: &str) -> Response {
    (status, headers, Html(html.to_string())).into_response()
}

/// Wrap page content in the site shell and render it.
fn shell<V>(
    state: &AppState,
    preview: PreviewContext,
    title: String,
    description: Option<String>,
    content: V,
) -> String
where
    V: IntoView + 'static,
{
    let site_name = state.settings.server.site_name.clone();
    let previewing = preview.previewing;
    render_document(move || {
        view! {
            <PageShell
                title=title
                site_name=site_name
                previewing=previewing
                description=description
            >
                {content}
            </PageShell>
        }
    })
}

fn not_found_response(state: &AppState, preview: PreviewContext) -> Response {
    let html = shell(state, preview, "Not Found".into(), None, view! { <NotFound/> });
    html_response(StatusCode::NOT_FOUND, private_headers(), &html)
}

fn server_error_response(state: &AppState, preview: PreviewContext) -> Response {
    let html = shell(state, preview, "Error".into(), None, view! { <ServerError/> });
    html_response(StatusCode::INTERNAL_SERVER_ERROR, private_headers(), &html)
}

/// Unwrap a listing fetch, falling back to an empty list on failure.
fn listing<T>(result: Result<Vec<T>, AppError>, what: &'static str) -> (Vec<T>, bool) {
    match result {
        Ok(items) => (items, true),
        Err(e) => {
            tracing::error!(error = %e, listing = what, "listing fetch failed, rendering empty");
            (Vec::new(), false)
        }
    }
}

pub async fn render_home(state: &AppState, preview: PreviewContext) -> Rendered {
    let visibility = preview.visibility();
    let (posts, posts_ok) = listing(state.content.posts(visibility).await, "posts");
    let (projects, projects_ok) = listing(state.content.projects(visibility).await, "projects");

    let posts: Vec<_> = posts.into_iter().take(HOME_SECTION_LEN).collect();
    let projects: Vec<_> = projects.into_iter().take(HOME_SECTION_LEN).collect();

    let html = shell(
        state,
        preview,
        "Home".into(),
        None,
        view! {
            <section class="recent-posts">
                <h2>"Latest posts"</h2>
                <PostList posts=posts/>
                <a href="/blog">"All posts"</a>
            </section>
            <section class="featured-projects">
                <h2>"Projects"</h2>
                <ProjectList projects=projects/>
                <a href="/projects">"All projects"</a>
            </section>
        },
    );
    Rendered::Page {
        html,
        cacheable: posts_ok && projects_ok,
    }
}

pub async fn render_blog_index(state: &AppState, preview: PreviewContext) -> Rendered {
    let (posts, cacheable) = listing(state.content.posts(preview.visibility()).await, "posts");
    let html = shell(
        state,
        preview,
        "Blog".into(),
        Some("Articles and notes.".into()),
        view! {
            <h1>"Blog"</h1>
            <PostList posts=posts/>
        },
    );
    Rendered::Page { html, cacheable }
}

pub async fn render_post(state: &AppState, preview: PreviewContext, slug: &Slug) -> Rendered {
    match state.content.post_by_slug(slug, preview.visibility()).await {
        Ok(Some(post)) => {
            let title = post.title.clone();
            let description = post
                .excerpt
                .clone()
                .unwrap_or_else(|| format!("Read {}", post.title));
            let html = shell(
                state,
                preview,
                title,
                Some(description),
                view! { <PostArticle post=post/> },
            );
            Rendered::Page {
                html,
                cacheable: true,
            }
        }
        Ok(None) => Rendered::NotFound,
        Err(e) => {
            tracing::error!(error = %e, %slug, "post fetch failed");
            Rendered::Failed
        }
    }
}

pub async fn render_projects_index(state: &AppState, preview: PreviewContext) -> Rendered {
    let (projects, cacheable) =
        listing(state.content.projects(preview.visibility()).await, "projects");
    let html = shell(
        state,
        preview,
        "Projects".into(),
        Some("Things I have built.".into()),
        view! {
            <h1>"Projects"</h1>
            <ProjectList projects=projects/>
        },
    );
    Rendered::Page { html, cacheable }
}

pub async fn render_project(state: &AppState, preview: PreviewContext, slug: &Slug) -> Rendered {
    match state.content.project_by_slug(slug, preview.visibility()).await {
        Ok(Some(project)) => {
            let title = project.title.clone();
            let description = project.description.clone();
            let html = shell(
                state,
                preview,
                title,
                Some(description),
                view! { <ProjectArticle project=project/> },
            );
            Rendered::Page {
                html,
                cacheable: true,
            }
        }
        Ok(None) => Rendered::NotFound,
        Err(e) => {
            tracing::error!(error = %e, %slug, "project fetch failed");
            Rendered::Failed
        }
    }
}

/// `GET /`
pub async fn home_handler(State(state): State<AppState>, preview: PreviewContext) -> Response {
    serve(&state, preview, "/", || render_home(&state, preview)).await
}

/// `GET /blog`
pub async fn blog_index_handler(
    State(state): State<AppState>,
    preview: PreviewContext,
) -> Response {
    serve(&state, preview, "/blog", || render_blog_index(&state, preview)).await
}

/// `GET /blog/{slug}`
pub async fn post_handler(
    State(state): State<AppState>,
    preview: PreviewContext,
    Path(slug): Path<String>,
) -> Response {
    let Ok(slug) = Slug::parse(&slug) else {
        return not_found_response(&state, preview);
    };
    let path = format!("/blog/{slug}");
    serve(&state, preview, &path, || render_post(&state, preview, &slug)).await
}

/// `GET /projects`
pub async fn projects_index_handler(
    State(state): State<AppState>,
    preview: PreviewContext,
) -> Response {
    serve(&state, preview, "/projects", || {
        render_projects_index(&state, preview)
    })
    .await
}

/// `GET /projects/{slug}`
pub async fn project_handler(
    State(state): State<AppState>,
    preview: PreviewContext,
    Path(slug): Path<String>,
) -> Response {
    let Ok(slug) = Slug::parse(&slug) else {
        return not_found_response(&state, preview);
    };
    let path = format!("/projects/{slug}");
    serve(&state, preview, &path, || render_project(&state, preview, &slug)).await
}

/// Router fallback for unknown paths.
pub async fn not_found_handler(State(state): State<AppState>, preview: PreviewContext) -> Response {
    not_found_response(&state, preview)
}

/// Render every published detail page into the cache.
///
/// Returns the number of pages cached. Kinds whose slugs cannot be listed
/// are skipped with a warning.
pub async fn prerender(state: &AppState) -> usize {
    let published = PreviewContext::default();
    let mut cached = 0;

    for kind in [DocumentKind::Post, DocumentKind::Project] {
        let slugs = match state.content.slugs(kind, published.visibility()).await {
            Ok(slugs) => slugs,
            Err(e) => {
                tracing::warn!(error = %e, %kind, "cannot list slugs for prerendering");
                continue;
            }
        };

        for slug in slugs {
            let (path, rendered) = match kind {
                DocumentKind::Post => (
                    format!("/blog/{slug}"),
                    render_post(state, published, &slug).await,
                ),
                _ => (
                    format!("/projects/{slug}"),
                    render_project(state, published, &slug).await,
                ),
            };
            if let Rendered::Page {
                html,
                cacheable: true,
            } = rendered
            {
                state.page_cache.insert(&path, Arc::from(html)).await;
                cached += 1;
            }
        }
    }

    tracing::info!(pages = cached, "prerendered published pages");
    cached
}
