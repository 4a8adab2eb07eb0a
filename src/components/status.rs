use leptos::prelude::*;

#[component]
pub fn NotFound() -> impl IntoView {
    view! {
        <section class="status not-found">
            <h1>"Page not found"</h1>
            <p>"The page you are looking for does not exist or is not published."</p>
            <a href="/">"Back to home"</a>
        </section>
    }
}

/// Shown for server faults. Carries no detail about the cause.
#[component]
pub fn ServerError() -> impl IntoView {
    view! {
        <section class="status server-error">
            <h1>"Something went wrong"</h1>
            <p>"The page could not be loaded. Please try again later."</p>
        </section>
    }
}
