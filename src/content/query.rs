use std::collections::BTreeMap;

use crate::models::document::DocumentKind;
use crate::models::slug::Slug;

/// Which documents a query may see.
///
/// A single client is parameterized by this scope; there is no separate
/// "draft client" that could be picked by mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Only released documents.
    #[default]
    Published,
    /// Every document, with unreleased edits overlaying released ones.
    Drafts,
}

impl Visibility {
    /// The store's name for this scope.
    pub fn perspective(&self) -> &'static str {
        match self {
            Visibility::Published => "published",
            Visibility::Drafts => "previewDrafts",
        }
    }
}

/// What a query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryShape {
    /// At most one document (`null` when nothing matches).
    One,
    /// An ordered list of documents.
    Many,
    /// A list of slugs.
    Slugs,
}

/// The predeclared query templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Posts,
    PostBySlug,
    PostSlugs,
    Projects,
    ProjectBySlug,
    ProjectSlugs,
}

const POSTS_GROQ: &str = concat!(
    r#"*[_type == "post" && defined(slug.current)] | order(publishedAt desc) {"#,
    r#"_id, title, publishedAt, excerpt, mainImage, slug, author->{name, slug, image}, categories[]->{title, description}"#,
    "}"
);

const POST_BY_SLUG_GROQ: &str = concat!(
    r#"*[_type == "post" && slug.current == $slug][0] {"#,
    r#"_id, title, publishedAt, excerpt, mainImage, slug, author->{name, slug, image}, categories[]->{title, description}, body"#,
    "}"
);

const PROJECTS_GROQ: &str = concat!(
    r#"*[_type == "project" && defined(slug.current)] | order(_createdAt desc) {"#,
    r#"_id, title, description, mainImage, technologies, liveUrl, githubUrl, slug"#,
    "}"
);

const PROJECT_BY_SLUG_GROQ: &str = concat!(
    r#"*[_type == "project" && slug.current == $slug][0] {"#,
    r#"_id, title, description, mainImage, technologies, liveUrl, githubUrl, slug, body"#,
    "}"
);

impl Query {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Query::Posts | Query::PostBySlug | Query::PostSlugs => DocumentKind::Post,
            Query::Projects | Query::ProjectBySlug | Query::ProjectSlugs => DocumentKind::Project,
        }
    }

    pub fn shape(&self) -> QueryShape {
        match self {
            Query::PostBySlug | Query::ProjectBySlug => QueryShape::One,
            Query::Posts | Query::Projects => QueryShape::Many,
            Query::PostSlugs | Query::ProjectSlugs => QueryShape::Slugs,
        }
    }

    /// Named parameters the template references.
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            Query::PostBySlug | Query::ProjectBySlug => &["slug"],
            _ => &[],
        }
    }

    /// The GROQ text sent to the store.
    pub fn groq(&self) -> &'static str {
        match self {
            Query::Posts => POSTS_GROQ,
            Query::PostBySlug => POST_BY_SLUG_GROQ,
            Query::PostSlugs => r#"*[_type == "post" && defined(slug.current)][].slug.current"#,
            Query::Projects => PROJECTS_GROQ,
            Query::ProjectBySlug => PROJECT_BY_SLUG_GROQ,
            Query::ProjectSlugs => {
                r#"*[_type == "project" && defined(slug.current)][].slug.current"#
            }
        }
    }
}

/// Named query parameters, bound by the store rather than spliced into
/// the query text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slug(slug: &Slug) -> Self {
        Self::new().with("slug", slug.as_str())
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.0.insert(name.to_string(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
