use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::slug::Slug;

/// Prefix the store uses for unreleased document ids.
pub const DRAFT_PREFIX: &str = "drafts.";

/// Shown for drafts that have no title yet.
pub const UNTITLED: &str = "Untitled";

/// The content kinds served by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Post,
    Project,
    Author,
    Category,
}

impl DocumentKind {
    /// The `_type` name used by the content store.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Post => "post",
            DocumentKind::Project => "project",
            DocumentKind::Author => "author",
            DocumentKind::Category => "category",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blog post, with its author and categories denormalized by the query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    /// Required once released; a fresh draft may not have one yet.
    #[serde(default)]
    pub title: String,
    pub slug: Slug,
    /// Required once released; drafts may not have it yet.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Opaque image reference, passed through untouched.
    #[serde(default)]
    pub main_image: Option<Value>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default, deserialize_with = "present_entries")]
    pub categories: Vec<Category>,
    /// Portable-text body, only present on detail queries.
    #[serde(default)]
    pub body: Option<Value>,
}

/// A portfolio project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub slug: Slug,
    pub description: String,
    #[serde(default)]
    pub main_image: Option<Value>,
    #[serde(default, deserialize_with = "present_entries")]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub live_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// Post author. Denormalized projections omit the id.
#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default)]
    pub image: Option<Value>,
    #[serde(default)]
    pub bio: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A content record decoded from the store, tagged by kind.
#[derive(Debug, Clone)]
pub enum Document {
    Post(Post),
    Project(Project),
    Author(Author),
    Category(Category),
}

/// Why a store payload was refused at the client boundary.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed {kind}: {source}")]
    Malformed {
        kind: DocumentKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {kind}: {reason}")]
    Invalid { kind: DocumentKind, reason: String },
}

impl Document {
    /// Decode and validate a raw store document of a known kind.
    pub fn decode(kind: DocumentKind, raw: Value) -> Result<Self, DecodeError> {
        let malformed = |source| DecodeError::Malformed { kind, source };
        let document = match kind {
            DocumentKind::Post => Document::Post(serde_json::from_value(raw).map_err(malformed)?),
            DocumentKind::Project => {
                Document::Project(serde_json::from_value(raw).map_err(malformed)?)
            }
            DocumentKind::Author => {
                Document::Author(serde_json::from_value(raw).map_err(malformed)?)
            }
            DocumentKind::Category => {
                Document::Category(serde_json::from_value(raw).map_err(malformed)?)
            }
        };
        document.validate()
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Post(_) => DocumentKind::Post,
            Document::Project(_) => DocumentKind::Project,
            Document::Author(_) => DocumentKind::Author,
            Document::Category(_) => DocumentKind::Category,
        }
    }

    /// Refuse blank required fields. A draft post or project may still be
    /// untitled and gets a placeholder instead.
    fn validate(mut self) -> Result<Self, DecodeError> {
        let kind = self.kind();
        let (field, value, draft) = match &mut self {
            Document::Post(p) => ("title", &mut p.title, p.id.starts_with(DRAFT_PREFIX)),
            Document::Project(p) => ("title", &mut p.title, p.id.starts_with(DRAFT_PREFIX)),
            Document::Author(a) => ("name", &mut a.name, false),
            Document::Category(c) => ("title", &mut c.title, false),
        };
        if value.trim().is_empty() {
            if !draft {
                return Err(DecodeError::Invalid {
                    kind,
                    reason: format!("{field} is empty"),
                });
            }
            *value = UNTITLED.to_string();
        }
        Ok(self)
    }
}

/// Arrays from the store may be `null` and may contain `null` entries when a
/// reference points at a document that is not visible.
fn present_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let entries = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(entries.unwrap_or_default().into_iter().flatten().collect())
}
