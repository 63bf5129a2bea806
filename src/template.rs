//! Default document shown when opening a file that does not exist yet.

/// Starter content for new files: a quick tour of what the preview can do.
pub const DEFAULT_DOCUMENT: &str = r#"# Welcome to splitmark

Type **GitHub Flavored Markdown** on the left.
The rendered preview, including mermaid diagrams, follows on the right.
Drag the divider to resize the panes; both sides scroll together.

---

## What works

- Live preview as you type
- GFM tables, ~~strikethrough~~, and task lists:
  - [x] Render this document
  - [ ] Write something better
- Syntax-highlighted code blocks
- Mermaid flowchart rendering

## Code

```rust
fn main() {
    println!("hello from the preview pane");
}
```

## Diagram

```mermaid
graph TD
    A[Edit markdown] --> B{Changed?}
    B -->|yes| C[Re-render preview]
    B -->|no| D[Idle]
    C --> E[Materialize diagrams]
    E --> D
```

## Table

| Key        | Action            |
|------------|-------------------|
| Ctrl+S     | Save              |
| Ctrl+E     | Export HTML       |
| Ctrl+Q     | Quit              |
| F1         | Help              |
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_default_document_parses_cleanly() {
        let doc = Document::parse(DEFAULT_DOCUMENT).unwrap();
        assert!(doc.line_count() > 10);
        assert_eq!(doc.diagram_media().count(), 1);
    }
}
