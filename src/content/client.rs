use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::content::query::{Query, QueryParams, QueryShape, Visibility};
use crate::error::AppError;
use crate::models::document::{Document, DocumentKind, Post, Project};
use crate::models::slug::Slug;

/// Transport to the external document store.
///
/// Implementations execute a predeclared query in the requested visibility
/// scope and return the raw result payload. Abstracted as a trait so tests
/// can use a mock without a real store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch(
        &self,
        query: Query,
        params: &QueryParams,
        visibility: Visibility,
    ) -> Result<Value, AppError>;
}

/// Result of a typed fetch, shaped by the query.
#[derive(Debug, Clone)]
pub enum Fetched {
    One(Option<Document>),
    Many(Vec<Document>),
    Slugs(Vec<Slug>),
}

/// Typed client over a [`ContentStore`].
///
/// Every payload is decoded and validated here; nothing downstream sees raw
/// store JSON. The store is never mutated.
#[derive(Clone)]
pub struct ContentClient {
    store: Arc<dyn ContentStore>,
}

impl ContentClient {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Run `query` with `params` in the given scope and decode the result.
    pub async fn fetch(
        &self,
        query: Query,
        params: &QueryParams,
        visibility: Visibility,
    ) -> Result<Fetched, AppError> {
        if let Some(missing) = query
            .required_params()
            .iter()
            .find(|name| params.get(name).is_none())
        {
            return Err(AppError::Internal(format!(
                "query {query:?} requires parameter '{missing}'"
            )));
        }

        let raw = self.store.fetch(query, params, visibility).await?;
        decode(query, raw)
    }

    pub async fn post_by_slug(
        &self,
        slug: &Slug,
        visibility: Visibility,
    ) -> Result<Option<Post>, AppError> {
        match self
            .fetch(Query::PostBySlug, &QueryParams::slug(slug), visibility)
            .await?
        {
            Fetched::One(None) => Ok(None),
            Fetched::One(Some(Document::Post(post))) => Ok(Some(post)),
            other => Err(unexpected(Query::PostBySlug, &other)),
        }
    }

    pub async fn posts(&self, visibility: Visibility) -> Result<Vec<Post>, AppError> {
        let documents = self.many(Query::Posts, visibility).await?;
        Ok(documents
            .into_iter()
            .filter_map(|doc| match doc {
                Document::Post(post) => Some(post),
                _ => None,
            })
            .collect())
    }

    pub async fn project_by_slug(
        &self,
        slug: &Slug,
        visibility: Visibility,
    ) -> Result<Option<Project>, AppError> {
        match self
            .fetch(Query::ProjectBySlug, &QueryParams::slug(slug), visibility)
            .await?
        {
            Fetched::One(None) => Ok(None),
            Fetched::One(Some(Document::Project(project))) => Ok(Some(project)),
            other => Err(unexpected(Query::ProjectBySlug, &other)),
        }
    }

    pub async fn projects(&self, visibility: Visibility) -> Result<Vec<Project>, AppError> {
        let documents = self.many(Query::Projects, visibility).await?;
        Ok(documents
            .into_iter()
            .filter_map(|doc| match doc {
                Document::Project(project) => Some(project),
                _ => None,
            })
            .collect())
    }

    /// All slugs of the given kind that are visible in the scope.
    pub async fn slugs(
        &self,
        kind: DocumentKind,
        visibility: Visibility,
    ) -> Result<Vec<Slug>, AppError> {
        let query = match kind {
            DocumentKind::Post => Query::PostSlugs,
            DocumentKind::Project => Query::ProjectSlugs,
            other => {
                return Err(AppError::Internal(format!(
                    "no slug query is declared for {other}"
                )))
            }
        };
        match self.fetch(query, &QueryParams::new(), visibility).await? {
            Fetched::Slugs(slugs) => Ok(slugs),
            other => Err(unexpected(query, &other)),
        }
    }

    async fn many(&self, query: Query, visibility: Visibility) -> Result<Vec<Document>, AppError> {
        match self.fetch(query, &QueryParams::new(), visibility).await? {
            Fetched::Many(documents) => Ok(documents),
            other => Err(unexpected(query, &other)),
        }
    }
}

fn unexpected(query: Query, fetched: &Fetched) -> AppError {
    let shape = match fetched {
        Fetched::One(_) => "one",
        Fetched::Many(_) => "many",
        Fetched::Slugs(_) => "slugs",
    };
    AppError::Internal(format!("query {query:?} produced an unexpected {shape} result"))
}

/// Decode a raw payload according to the query's kind and shape.
///
/// A single-document payload that fails validation is an error. In list
/// payloads, invalid entries are logged and skipped so one broken document
/// does not take down a listing.
fn decode(query: Query, raw: Value) -> Result<Fetched, AppError> {
    let kind = query.kind();
    match query.shape() {
        QueryShape::One => match raw {
            Value::Null => Ok(Fetched::One(None)),
            value => Document::decode(kind, value)
                .map(|doc| Fetched::One(Some(doc)))
                .map_err(|e| AppError::ContentFetch(e.to_string())),
        },
        QueryShape::Many => {
            let items = expect_array(query, raw)?;
            let documents = items
                .into_iter()
                .filter_map(|item| match Document::decode(kind, item) {
                    Ok(doc) => Some(doc),
                    Err(e) => {
                        tracing::warn!(query = ?query, error = %e, "skipping invalid document");
                        None
                    }
                })
                .collect();
            Ok(Fetched::Many(documents))
        }
        QueryShape::Slugs => {
            let items = expect_array(query, raw)?;
            let slugs = items
                .into_iter()
                .filter_map(|item| match serde_json::from_value::<Slug>(item) {
                    Ok(slug) => Some(slug),
                    Err(e) => {
                        tracing::warn!(query = ?query, error = %e, "skipping invalid slug");
                        None
                    }
                })
                .collect();
            Ok(Fetched::Slugs(slugs))
        }
    }
}

fn expect_array(query: Query, raw: Value) -> Result<Vec<Value>, AppError> {
    match raw {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(AppError::ContentFetch(format!(
            "query {query:?} expected a list, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
