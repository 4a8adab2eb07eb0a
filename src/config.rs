//! Layered application settings.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional TOML file (`portfolio.toml` unless `--config` says otherwise)
//! 3. `PORTFOLIO__<SECTION>__<KEY>` environment variables
//! 4. The content studio's conventional variables: `SANITY_PREVIEW_SECRET`,
//!    `SANITY_API_TOKEN`, `NEXT_PUBLIC_SANITY_PROJECT_ID`,
//!    `NEXT_PUBLIC_SANITY_DATASET`, `NEXT_PUBLIC_SANITY_API_VERSION`

use std::collections::HashMap;
use std::path::Path;

use axum_extra::extract::cookie::Key;
use base64::Engine;
use serde::Deserialize;

use crate::error::AppError;

/// Longest accepted revalidation window: one year.
const MAX_REVALIDATE_SECS: u64 = 365 * 24 * 60 * 60;

/// Variables read under their conventional names, mapped to settings keys.
const CONVENTIONAL_VARS: &[(&str, &str)] = &[
    ("SANITY_PREVIEW_SECRET", "preview.secret"),
    ("SANITY_API_TOKEN", "sanity.token"),
    ("NEXT_PUBLIC_SANITY_PROJECT_ID", "sanity.project_id"),
    ("NEXT_PUBLIC_SANITY_DATASET", "sanity.dataset"),
    ("NEXT_PUBLIC_SANITY_API_VERSION", "sanity.api_version"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub sanity: SanitySettings,
    #[serde(default)]
    pub preview: PreviewSettings,
    #[serde(default)]
    pub pages: PageSettings,
    /// Serve the embedded demo content instead of querying Sanity.
    #[serde(default)]
    pub demo_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
    /// Shown in page titles and the header.
    pub site_name: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            site_name: "Portfolio".to_string(),
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SanitySettings {
    pub project_id: String,
    pub dataset: String,
    /// Either `1` or a `YYYY-MM-DD` date; a leading `v` is tolerated.
    pub api_version: String,
    /// Read token. Required to see unreleased documents.
    pub token: Option<String>,
    /// Route published reads through the API CDN.
    pub use_cdn: bool,
    pub timeout_secs: u64,
}

impl Default for SanitySettings {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset: "production".to_string(),
            api_version: "2023-05-03".to_string(),
            token: None,
            use_cdn: false,
            timeout_secs: 10,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Shared secret the content studio presents to enter preview.
    pub secret: String,
    /// Base64 key (at least 64 bytes) for signing the preview cookie.
    /// A random key is generated when absent, so sessions end on restart.
    pub cookie_key: Option<String>,
    /// Lifetime of a preview session.
    pub max_age_secs: u64,
    /// Mark the preview cookie `Secure`.
    pub secure_cookie: bool,
    /// Answer preview-entry failures with 401/400/404 instead of 401 for all.
    pub distinct_status_codes: bool,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            cookie_key: None,
            max_age_secs: 3600,
            secure_cookie: false,
            distinct_status_codes: false,
        }
    }
}

/// Redacts the read token.
impl std::fmt::Debug for SanitySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanitySettings")
            .field("project_id", &self.project_id)
            .field("dataset", &self.dataset)
            .field("api_version", &self.api_version)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("use_cdn", &self.use_cdn)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Redacts the secret and signing key.
impl std::fmt::Debug for PreviewSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSettings")
            .field("secret", &"<redacted>")
            .field("cookie_key", &self.cookie_key.as_ref().map(|_| "<redacted>"))
            .field("max_age_secs", &self.max_age_secs)
            .field("secure_cookie", &self.secure_cookie)
            .field("distinct_status_codes", &self.distinct_status_codes)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    /// How long a rendered published page is served before it is rebuilt.
    pub revalidate_secs: u64,
    /// Maximum number of cached pages.
    pub cache_capacity: u64,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            revalidate_secs: 60,
            cache_capacity: 1_000,
        }
    }
}

impl Settings {
    /// Load settings from `path` (if it exists) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        Self::load_from(path, std::env::vars().collect())
    }

    /// Load settings from `path` and an explicit variable map.
    pub fn load_from(path: Option<&Path>, vars: HashMap<String, String>) -> Result<Self, AppError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PORTFOLIO")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

        for (var, key) in CONVENTIONAL_VARS {
            let value = vars.get(*var).filter(|v| !v.is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;

        tracing::debug!(
            bind_addr = %settings.server.bind_addr,
            demo_mode = settings.demo_mode,
            dataset = %settings.sanity.dataset,
            revalidate_secs = settings.pages.revalidate_secs,
            "settings loaded"
        );

        Ok(settings)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.preview.secret.trim().is_empty() {
            return Err(AppError::Config(
                "preview secret is not set (SANITY_PREVIEW_SECRET)".into(),
            ));
        }
        if self.preview.max_age_secs == 0 {
            return Err(AppError::Config("preview.max_age_secs must be positive".into()));
        }
        if !(1..=MAX_REVALIDATE_SECS).contains(&self.pages.revalidate_secs) {
            return Err(AppError::Config(format!(
                "pages.revalidate_secs must be between 1 and {MAX_REVALIDATE_SECS}"
            )));
        }
        if let Some(key) = &self.preview.cookie_key {
            decode_cookie_key(key)?;
        }
        if !self.demo_mode {
            self.sanity.validate()?;
        }
        Ok(())
    }

    /// The key signing preview cookies.
    pub fn cookie_key(&self) -> Result<Key, AppError> {
        match &self.preview.cookie_key {
            Some(encoded) => decode_cookie_key(encoded),
            None => {
                tracing::warn!("preview.cookie_key not set, generating a random signing key");
                Ok(Key::generate())
            }
        }
    }
}

impl SanitySettings {
    fn validate(&self) -> Result<(), AppError> {
        let is_identifier = |s: &str, extra: &[char]| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || extra.contains(&c))
        };

        if self.timeout_secs == 0 {
            return Err(AppError::Config("sanity.timeout_secs must be positive".into()));
        }
        if !is_identifier(&self.project_id, &[]) {
            return Err(AppError::Config(format!(
                "invalid Sanity project id '{}' (NEXT_PUBLIC_SANITY_PROJECT_ID)",
                self.project_id
            )));
        }
        if !is_identifier(&self.dataset, &['-', '_']) {
            return Err(AppError::Config(format!(
                "invalid Sanity dataset '{}'",
                self.dataset
            )));
        }

        let version = self.api_version.trim_start_matches('v');
        let valid_version =
            version == "1" || chrono::NaiveDate::parse_from_str(version, "%Y-%m-%d").is_ok();
        if !valid_version {
            return Err(AppError::Config(format!(
                "invalid Sanity API version '{}': expected '1' or 'YYYY-MM-DD'",
                self.api_version
            )));
        }
        Ok(())
    }

    /// The API version without a leading `v`.
    pub fn api_version(&self) -> &str {
        self.api_version.trim_start_matches('v')
    }
}

fn decode_cookie_key(encoded: &str) -> Result<Key, AppError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::Config(format!("preview.cookie_key is not valid base64: {e}")))?;
    Key::try_from(bytes.as_slice()).map_err(|_| {
        AppError::Config(format!(
            "preview.cookie_key must decode to at least 64 bytes, got {}",
            bytes.len()
        ))
    })
}
