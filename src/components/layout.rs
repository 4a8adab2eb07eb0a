use leptos::prelude::*;

/// Full HTML document around a page body.
///
/// `title` is the page's own title; the site name is appended. When
/// `previewing` is set the preview banner is shown above the content.
#[component]
pub fn PageShell(
    title: String,
    site_name: String,
    previewing: bool,
    #[prop(optional_no_strip)] description: Option<String>,
    children: Children,
) -> impl IntoView {
    let full_title = format!("{title} | {site_name}");
    let robots = if previewing { "noindex" } else { "index, follow" };

    view! {
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <meta name="robots" content=robots/>
                {description.map(|text| view! { <meta name="description" content=text/> })}
                <title>{full_title}</title>
            </head>
            <body class:previewing=previewing>
                {previewing.then(|| view! { <PreviewBanner/> })}
                <header class="site-header">
                    <a class="site-name" href="/">{site_name}</a>
                    <nav>
                        <a href="/blog">"Blog"</a>
                        <a href="/projects">"Projects"</a>
                    </nav>
                </header>
                <main>{children()}</main>
            </body>
        </html>
    }
}

/// Notice shown on every page while a preview session is active.
#[component]
pub fn PreviewBanner() -> impl IntoView {
    view! {
        <div class="preview-banner" role="status">
            <span>"You are in preview mode."</span>
            " "
            <a href="/api/exit-preview">"Exit preview"</a>
        </div>
    }
}
