use serde_json::Value;

/// A body block reduced to plain text.
///
/// Marks, annotations, embedded images and custom block types other than
/// code are dropped; only the text survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextBlock {
    Paragraph(String),
    Heading(String),
    Code(String),
}

/// Flatten a portable-text body into plain text blocks.
///
/// Anything that is not an array yields no blocks. Empty blocks are skipped.
pub fn text_blocks(body: Option<&Value>) -> Vec<TextBlock> {
    let Some(blocks) = body.and_then(Value::as_array) else {
        return Vec::new();
    };

    blocks
        .iter()
        .filter_map(|block| match block.get("_type").and_then(Value::as_str) {
            Some("block") => {
                let text = span_text(block);
                if text.trim().is_empty() {
                    return None;
                }
                let style = block.get("style").and_then(Value::as_str).unwrap_or("normal");
                Some(if style.starts_with('h') && style.len() == 2 {
                    TextBlock::Heading(text)
                } else {
                    TextBlock::Paragraph(text)
                })
            }
            Some("code") => block
                .get("code")
                .and_then(Value::as_str)
                .map(|code| TextBlock::Code(code.to_string())),
            _ => None,
        })
        .collect()
}

/// Plain text of a block's spans, concatenated.
fn span_text(block: &Value) -> String {
    block
        .get("children")
        .and_then(Value::as_array)
        .map(|children| {
            children
                .iter()
                .filter_map(|child| child.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}
