use leptos::prelude::*;

use crate::components::body::BodyText;
use crate::models::document::Post;
use crate::rendering::page::format_date;

#[component]
pub fn PostArticle(post: Post) -> impl IntoView {
    let published = post.published_at.as_ref().map(format_date);
    let author = post
        .author
        .map(|author| author.name)
        .unwrap_or_else(|| "Anonymous".to_string());
    let categories: Vec<String> = post.categories.into_iter().map(|c| c.title).collect();

    view! {
        <article class="post">
            <h1>{post.title}</h1>
            <p class="meta">
                {published.map(|date| view! { <time>{date}</time> })}
                <span class="author">{author}</span>
            </p>
            {(!categories.is_empty()).then(|| view! {
                <ul class="categories">
                    {categories
                        .into_iter()
                        .map(|title| view! { <li>{title}</li> })
                        .collect_view()}
                </ul>
            })}
            <BodyText body=post.body/>
        </article>
    }
}

/// Listing entry linking to a post.
#[component]
pub fn PostCard(post: Post) -> impl IntoView {
    let href = format!("/blog/{}", post.slug);
    let published = post.published_at.as_ref().map(format_date);

    view! {
        <li class="post-card">
            <a href=href>{post.title}</a>
            {published.map(|date| view! { <time>{date}</time> })}
            {post.excerpt.map(|excerpt| view! { <p class="excerpt">{excerpt}</p> })}
        </li>
    }
}

#[component]
pub fn PostList(posts: Vec<Post>) -> impl IntoView {
    if posts.is_empty() {
        return view! { <p class="empty">"No posts yet."</p> }.into_any();
    }

    view! {
        <ul class="post-list">
            {posts
                .into_iter()
                .map(|post| view! { <PostCard post=post/> })
                .collect_view()}
        </ul>
    }
    .into_any()
}
