//! Standalone HTML export.
//!
//! A pure consumer of the source document: renders the current markdown
//! to a self-contained HTML file using the same comrak configuration as
//! the preview, so both outputs agree on the dialect. Diagram blocks are
//! left as fenced code in the export.

use std::path::Path;

use anyhow::{Context, Result};

/// Minimal styling so the exported file reads well standalone.
const PAGE_STYLE: &str = "body{max-width:52rem;margin:2rem auto;padding:0 1rem;\
font-family:sans-serif;line-height:1.6}pre{background:#f4f4f4;padding:0.8rem;\
overflow-x:auto}code{font-family:monospace}table{border-collapse:collapse}\
td,th{border:1px solid #999;padding:0.3rem 0.6rem}";

/// Render markdown source to a full HTML document string.
pub fn to_html(source: &str, title: &str) -> String {
    let body = comrak::markdown_to_html(source, &crate::document::comrak_options());
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{PAGE_STYLE}</style>\n</head>\n\
         <body>\n{body}</body>\n</html>\n",
        title = escape_html(title),
    )
}

/// Write the exported HTML next to the given path.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_html(source: &str, output: &Path) -> Result<()> {
    let title = output
        .file_stem()
        .map_or_else(|| "document".to_string(), |s| s.to_string_lossy().to_string());
    let html = to_html(source, &title);
    std::fs::write(output, html)
        .with_context(|| format!("Failed to write export {}", output.display()))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_html_wraps_body() {
        let html = to_html("# Hi\n\ntext", "doc");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(html.contains("<title>doc</title>"));
    }

    #[test]
    fn test_hardbreaks_match_preview_dialect() {
        let html = to_html("first\nsecond", "doc");
        assert!(html.contains("<br"), "single newlines are significant");
    }

    #[test]
    fn test_title_is_escaped() {
        let html = to_html("x", "<bad> & title");
        assert!(html.contains("<title>&lt;bad&gt; &amp; title</title>"));
    }

    #[test]
    fn test_write_html_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        write_html("# T", &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<h1>T</h1>"));
    }
}
