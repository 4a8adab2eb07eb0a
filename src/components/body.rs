use leptos::prelude::*;
use serde_json::Value;

use crate::rendering::portable_text::{text_blocks, TextBlock};

/// A document body rendered as plain text blocks.
#[component]
pub fn BodyText(body: Option<Value>) -> impl IntoView {
    let blocks = text_blocks(body.as_ref());

    view! {
        <div class="body">
            {blocks
                .into_iter()
                .map(|block| match block {
                    TextBlock::Paragraph(text) => view! { <p>{text}</p> }.into_any(),
                    TextBlock::Heading(text) => view! { <h2>{text}</h2> }.into_any(),
                    TextBlock::Code(code) => view! { <pre><code>{code}</code></pre> }.into_any(),
                })
                .collect_view()}
        </div>
    }
}
