use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::content::client::ContentStore;
use crate::content::query::{Query, QueryParams, Visibility};
use crate::error::AppError;
use crate::models::document::DRAFT_PREFIX;

const DEMO_CONTENT: &str = include_str!("../../demo_data/content.json");

/// In-memory [`ContentStore`] used when `demo_mode` is enabled.
///
/// Holds raw store documents and answers the predeclared queries with the
/// same visibility rules as the real store: a document whose id starts with
/// `drafts.` is unreleased. The published scope hides it; the drafts scope
/// shows it in place of its released counterpart.
pub struct DemoContentStore {
    documents: RwLock<BTreeMap<String, Value>>,
}

impl DemoContentStore {
    /// A store seeded with the embedded demo content.
    pub fn seeded() -> Result<Self, AppError> {
        let documents: Vec<Value> = serde_json::from_str(DEMO_CONTENT)
            .map_err(|e| AppError::Internal(format!("Invalid demo content: {e}")))?;
        Self::from_documents(documents)
    }

    pub fn from_documents(documents: Vec<Value>) -> Result<Self, AppError> {
        let store = Self {
            documents: RwLock::new(BTreeMap::new()),
        };
        for doc in documents {
            store.upsert(doc)?;
        }
        Ok(store)
    }

    /// Insert or replace a raw document, keyed by its `_id`.
    pub fn upsert(&self, document: Value) -> Result<(), AppError> {
        let id = document
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::BadRequest("Document has no _id".into()))?
            .to_string();
        self.write().insert(id, document);
        Ok(())
    }

    /// Release a draft: its content replaces the published document.
    pub fn publish(&self, base_id: &str) -> bool {
        let mut documents = self.write();
        let Some(mut draft) = documents.remove(&format!("{DRAFT_PREFIX}{base_id}")) else {
            return false;
        };
        if let Some(obj) = draft.as_object_mut() {
            obj.insert("_id".to_string(), Value::String(base_id.to_string()));
        }
        documents.insert(base_id.to_string(), draft);
        true
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Value>> {
        self.documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Documents visible in the scope, keyed by their released id.
    fn visible(&self, visibility: Visibility) -> BTreeMap<String, Value> {
        let documents = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut visible = BTreeMap::new();
        for (id, doc) in documents.iter() {
            if let Some(base) = id.strip_prefix(DRAFT_PREFIX) {
                if visibility == Visibility::Drafts {
                    visible.insert(base.to_string(), doc.clone());
                }
            } else if visibility == Visibility::Published
                || !documents.contains_key(&format!("{DRAFT_PREFIX}{id}"))
            {
                visible.insert(id.clone(), doc.clone());
            }
        }
        visible
    }
}

#[async_trait]
impl ContentStore for DemoContentStore {
    async fn fetch(
        &self,
        query: Query,
        params: &QueryParams,
        visibility: Visibility,
    ) -> Result<Value, AppError> {
        let visible = self.visible(visibility);
        let kind = query.kind().as_str();
        let of_kind = visible
            .values()
            .filter(|doc| doc.get("_type").and_then(Value::as_str) == Some(kind));

        let result = match query {
            Query::PostBySlug | Query::ProjectBySlug => {
                let slug = params.get("slug").unwrap_or_default();
                of_kind
                    .filter(|doc| slug_of(doc) == Some(slug))
                    .min_by_key(|doc| doc.get("_id").and_then(Value::as_str).map(str::to_string))
                    .map(|doc| resolve_references(doc, &visible))
                    .unwrap_or(Value::Null)
            }
            Query::Posts => {
                let mut posts: Vec<&Value> = of_kind.filter(|doc| slug_of(doc).is_some()).collect();
                posts.sort_by_key(|doc| Reverse(string_field(doc, "publishedAt")));
                Value::Array(
                    posts
                        .into_iter()
                        .map(|doc| without_body(resolve_references(doc, &visible)))
                        .collect(),
                )
            }
            Query::Projects => {
                let mut projects: Vec<&Value> =
                    of_kind.filter(|doc| slug_of(doc).is_some()).collect();
                projects.sort_by_key(|doc| Reverse(string_field(doc, "_createdAt")));
                Value::Array(projects.into_iter().map(|doc| without_body(doc.clone())).collect())
            }
            Query::PostSlugs | Query::ProjectSlugs => Value::Array(
                of_kind
                    .filter_map(slug_of)
                    .map(|slug| Value::String(slug.to_string()))
                    .collect(),
            ),
        };

        Ok(result)
    }
}

fn slug_of(doc: &Value) -> Option<&str> {
    doc.get("slug")?.get("current")?.as_str()
}

fn string_field(doc: &Value, field: &str) -> Option<String> {
    doc.get(field).and_then(Value::as_str).map(str::to_string)
}

fn without_body(mut doc: Value) -> Value {
    if let Some(obj) = doc.as_object_mut() {
        obj.remove("body");
    }
    doc
}

/// Replace `author` and `categories` references with the referenced
/// documents, or `null` when the target is not visible.
fn resolve_references(doc: &Value, visible: &BTreeMap<String, Value>) -> Value {
    let deref = |reference: &Value| -> Value {
        reference
            .get("_ref")
            .and_then(Value::as_str)
            .and_then(|id| visible.get(id))
            .cloned()
            .unwrap_or(Value::Null)
    };

    let mut resolved = doc.clone();
    if let Some(obj) = resolved.as_object_mut() {
        if let Some(author) = obj.get("author").map(deref) {
            obj.insert("author".to_string(), author);
        }
        let categories: Option<Vec<Value>> = obj
            .get("categories")
            .and_then(Value::as_array)
            .map(|refs| refs.iter().map(deref).collect());
        if let Some(categories) = categories {
            obj.insert("categories".to_string(), Value::Array(categories));
        }
    }
    resolved
}
