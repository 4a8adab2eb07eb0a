use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use axum_extra::extract::SignedCookieJar;
use chrono::{DateTime, TimeZone, Utc};

use crate::app::AppState;
use crate::config::PreviewSettings;
use crate::content::query::Visibility;

/// Name of the signed cookie that marks a preview session.
pub const PREVIEW_COOKIE: &str = "portfolio_preview";

/// An active preview session.
///
/// The cookie value is the issue time in unix seconds; the signature proves
/// it was issued here, and the issue time lets the server enforce the
/// lifetime even if a client ignores `Max-Age`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSession {
    pub issued_at: DateTime<Utc>,
}

impl PreviewSession {
    pub fn start() -> Self {
        Self::issued_at(Utc::now())
    }

    pub fn issued_at(at: DateTime<Utc>) -> Self {
        // Sub-second precision is not representable in the cookie.
        let seconds = at.timestamp();
        Self {
            issued_at: Utc.timestamp_opt(seconds, 0).single().unwrap_or(at),
        }
    }

    pub fn to_cookie(&self, settings: &PreviewSettings) -> Cookie<'static> {
        Cookie::build((PREVIEW_COOKIE, self.issued_at.timestamp().to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(settings.secure_cookie)
            .max_age(time::Duration::seconds(max_age_secs(settings)))
            .build()
    }

    /// Read a session from a verified jar, rejecting expired or malformed ones.
    pub fn from_jar(
        jar: &SignedCookieJar<Key>,
        settings: &PreviewSettings,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let cookie = jar.get(PREVIEW_COOKIE)?;
        let issued = cookie.value().parse::<i64>().ok()?;
        let issued_at = Utc.timestamp_opt(issued, 0).single()?;

        let age = now.signed_duration_since(issued_at).num_seconds();
        if !(0..max_age_secs(settings)).contains(&age) {
            tracing::debug!(age, "ignoring expired preview session");
            return None;
        }
        Some(Self { issued_at })
    }

    /// A cookie that clears the session when removed from a jar.
    pub fn removal_cookie() -> Cookie<'static> {
        Cookie::build((PREVIEW_COOKIE, "")).path("/").removal().build()
    }
}

fn max_age_secs(settings: &PreviewSettings) -> i64 {
    i64::try_from(settings.max_age_secs).unwrap_or(i64::MAX)
}

/// Request-scoped preview status, derived from the signed session cookie.
///
/// Handlers take this as an extractor and pick their visibility scope from
/// it. A `?preview=true` query string has no influence here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewContext {
    pub previewing: bool,
}

impl PreviewContext {
    pub fn visibility(&self) -> Visibility {
        if self.previewing {
            Visibility::Drafts
        } else {
            Visibility::Published
        }
    }
}

impl FromRequestParts<AppState> for PreviewContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::<Key>::from_request_parts(parts, state).await?;
        let session = PreviewSession::from_jar(&jar, &state.settings.preview, Utc::now());
        Ok(Self {
            previewing: session.is_some(),
        })
    }
}
