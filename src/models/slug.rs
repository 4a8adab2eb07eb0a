use std::fmt;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Maximum slug length accepted by the content schema.
pub const MAX_SLUG_LEN: usize = 96;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("slug is empty")]
    Empty,
    #[error("slug is longer than {MAX_SLUG_LEN} characters")]
    TooLong,
    #[error("slug contains invalid character {0:?}")]
    InvalidChar(char),
}

/// URL-safe key identifying a document within its kind.
///
/// Only ASCII letters, digits, `-`, `_` and `.` are accepted, so a slug can
/// be placed in a URL path segment without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slug(String);

impl Slug {
    pub fn parse(raw: &str) -> Result<Self, SlugError> {
        if raw.is_empty() {
            return Err(SlugError::Empty);
        }
        if raw.len() > MAX_SLUG_LEN {
            return Err(SlugError::TooLong);
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(SlugError::InvalidChar(c));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The store wraps slugs as `{ "_type": "slug", "current": "..." }`;
/// slug enumeration queries return bare strings. Both are accepted.
impl<'de> Deserialize<'de> for Slug {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Bare(String),
            Object { current: String },
        }

        let raw = match Wire::deserialize(deserializer)? {
            Wire::Bare(s) => s,
            Wire::Object { current } => current,
        };
        Slug::parse(&raw).map_err(serde::de::Error::custom)
    }
}
