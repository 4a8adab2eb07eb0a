use chrono::{DateTime, Utc};
use leptos::prelude::*;

/// Render a view to a complete HTML document.
///
/// Each render runs under its own reactive owner, so components may use
/// context and children without a running app.
pub fn render_document<F, V>(view: F) -> String
where
    F: FnOnce() -> V,
    V: IntoView,
{
    let owner = Owner::new();
    owner.with(|| format!("<!DOCTYPE html>{}", view().to_html()))
}

/// Human-readable publication date, e.g. `January 15, 2024`.
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}
