use crate::types::{BlockType, ExtractedDocument, PageBlock};

/// Render an extracted document as Markdown.
///
/// Headings become `##` headings, list items `- ` bullets and tables fenced
/// text blocks, one line per table row. Page boundaries are not marked.
pub fn render_document(doc: &ExtractedDocument) -> String {
    let rendered: Vec<String> = doc.blocks().map(|(_, block)| render_block(block)).collect();
    rendered
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render a single block without a trailing newline.
pub fn render_block(block: &PageBlock) -> String {
    match block.kind {
        BlockType::Heading => format!("## {}", escape_markdown(block.text.trim())),
        BlockType::Paragraph => escape_markdown(block.text.trim()),
        BlockType::List => block
            .items
            .iter()
            .map(|item| format!("- {}", escape_markdown(item.trim())))
            .collect::<Vec<_>>()
            .join("\n"),
        BlockType::Table => {
            if block.text.trim().is_empty() {
                return String::new();
            }
            format!("```text\n{}\n```", block.text.trim_end())
        }
    }
}

/// Escape Markdown special characters in text.
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
