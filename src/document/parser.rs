//! Markdown parsing with comrak.
//!
//! Produces styled terminal lines from a markdown source. Fenced blocks
//! tagged `mermaid` are not rendered here; they are emitted as deferred
//! media placeholders with a synthetic `mermaid://N` src so the diagram
//! post-processing pass can find and replace them after mount.

use std::collections::HashMap;

use anyhow::Result;
use comrak::nodes::{AstNode, NodeValue, TableAlignment};
use comrak::{Arena, Options, parse_document};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::types::{
    DIAGRAM_SRC_PREFIX, Document, InlineSpan, InlineStyle, LineType, MediaRef, ParsedDocument,
};

/// Reserved code-fence language marking a deferred diagram block.
pub const DIAGRAM_LANGUAGE: &str = "mermaid";

impl Document {
    /// Parse markdown source into a Document at the default layout width.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be assembled into a document.
    pub fn parse(source: &str) -> Result<Self> {
        parse_with_layout(source, 80, &HashMap::new())
    }

    /// Parse markdown source with a layout width.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be assembled into a document.
    pub fn parse_with_layout(source: &str, width: u16) -> Result<Self> {
        parse_with_layout(source, width, &HashMap::new())
    }
}

/// Parse markdown source with layout width and known media heights.
///
/// `media_heights` maps media srcs to reserved heights in terminal rows,
/// so a reflow after diagram materialization can hold space for the
/// rasterized cells.
///
/// # Errors
///
/// Returns an error if the source cannot be assembled into a document.
pub fn parse_with_layout(
    source: &str,
    width: u16,
    media_heights: &HashMap<String, usize>,
) -> Result<Document> {
    let arena = Arena::new();
    let options = comrak_options();
    let root = parse_document(&arena, source, &options);

    let mut ctx = RenderCtx {
        out: ParsedDocument::default(),
        media_heights,
        wrap_width: width.max(1) as usize,
        diagram_count: 0,
    };
    process_node(root, &mut ctx, 0, None);

    Ok(Document::from_parsed(source.to_string(), ctx.out))
}

/// Shared comrak configuration: GFM extensions plus significant line
/// breaks. Also used by the HTML exporter so both outputs agree on the
/// dialect.
pub fn comrak_options() -> Options {
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;

    // Single newlines are line breaks, like the live-preview dialect.
    options.render.hardbreaks = true;

    options
}

struct RenderCtx<'h> {
    out: ParsedDocument,
    media_heights: &'h HashMap<String, usize>,
    wrap_width: usize,
    diagram_count: usize,
}

impl RenderCtx<'_> {
    fn push(&mut self, line: RenderedLineParts) {
        match line {
            RenderedLineParts::Plain(content, line_type) => self
                .out
                .lines
                .push(crate::document::RenderedLine::new(content, line_type)),
            RenderedLineParts::Spans(line_type, spans) => {
                let content = spans_to_string(&spans);
                self.out
                    .lines
                    .push(crate::document::RenderedLine::with_spans(
                        content, line_type, spans,
                    ));
            }
        }
    }

    fn push_empty(&mut self) {
        self.push(RenderedLineParts::Plain(String::new(), LineType::Empty));
    }

    /// Reserve lines for a media placeholder and register its ref.
    fn push_media(&mut self, alt: String, src: String) {
        let height = self.media_heights.get(&src).copied().unwrap_or(1).max(1);
        let start = self.out.lines.len();
        self.push(RenderedLineParts::Plain(
            format!("[{}]", if alt.is_empty() { &src } else { &alt }),
            LineType::Media,
        ));
        for _ in 1..height {
            self.push(RenderedLineParts::Plain(String::new(), LineType::Media));
        }
        let end = self.out.lines.len();
        self.out.media.push(MediaRef {
            alt,
            src,
            line_range: start..end,
        });
    }
}

enum RenderedLineParts {
    Plain(String, LineType),
    Spans(LineType, Vec<InlineSpan>),
}

fn process_node<'a>(
    node: &'a AstNode<'a>,
    ctx: &mut RenderCtx<'_>,
    depth: usize,
    list_marker: Option<String>,
) {
    match &node.data.borrow().value {
        NodeValue::Document => {
            for child in node.children() {
                process_node(child, ctx, depth, list_marker.clone());
            }
        }

        NodeValue::Heading(heading) => {
            let text = extract_text(node);

            // Keep headings visually separated with two rows above.
            ensure_trailing_empty_lines(ctx, 2);
            let prefix = "#".repeat(heading.level as usize);
            ctx.push(RenderedLineParts::Plain(
                format!("{prefix} {text}"),
                LineType::Heading(heading.level),
            ));
            ctx.push_empty();
        }

        NodeValue::Paragraph => {
            // A paragraph that contains images becomes media placeholders.
            let child_images = collect_paragraph_images(node);
            if child_images.is_empty() {
                render_paragraph_text(node, ctx);
            } else {
                for (alt, src) in child_images {
                    ctx.push_media(alt, src);
                }
                ctx.push_empty();
            }
        }

        NodeValue::CodeBlock(code_block) => {
            let info = code_block.info.clone();
            let literal = code_block.literal.clone();
            let language = info.split_whitespace().next().filter(|s| !s.is_empty());

            match language {
                // Deferred diagram block: tag with the reserved src and move
                // on. No highlighting, no textual transformation here.
                Some(DIAGRAM_LANGUAGE) => {
                    let key = format!("{}{}", DIAGRAM_SRC_PREFIX, ctx.diagram_count);
                    ctx.diagram_count += 1;
                    ctx.out
                        .diagram_sources
                        .insert(key.clone(), literal.trim_end().to_string());
                    ctx.push_media(format!("Diagram: {DIAGRAM_LANGUAGE}"), key);
                    ctx.push_empty();
                }
                // CSV blocks render as tables.
                Some("csv") => match csv_rows(&literal) {
                    Some(rows) => {
                        for line in render_grid(&rows, &[], true, ctx.wrap_width) {
                            ctx.push(RenderedLineParts::Plain(line, LineType::Table));
                        }
                        ctx.push_empty();
                    }
                    None => render_code_block(ctx, language, &literal),
                },
                _ => render_code_block(ctx, language, &literal),
            }
        }

        NodeValue::List(list) => {
            let list_depth = depth + 1;
            let start = list.start;
            let delimiter = match list.delimiter {
                comrak::nodes::ListDelimType::Paren => ')',
                comrak::nodes::ListDelimType::Period => '.',
            };
            let list_len = node.children().count();
            let max_number = start + list_len.saturating_sub(1);
            let number_width = max_number.to_string().len();

            for (index, child) in node.children().enumerate() {
                let base_marker = match list.list_type {
                    comrak::nodes::ListType::Bullet => "•".to_string(),
                    comrak::nodes::ListType::Ordered => {
                        let number = start + index;
                        format!("{:>width$}{}", number, delimiter, width = number_width)
                    }
                };
                process_node(child, ctx, list_depth, Some(format!("{base_marker} ")));
            }
        }

        NodeValue::Item(_) | NodeValue::TaskItem(_) => {
            render_list_item(node, ctx, depth, list_marker.as_deref());
        }

        NodeValue::BlockQuote => {
            render_blockquote(node, ctx, 1);
            ctx.push_empty();
        }

        NodeValue::ThematicBreak => {
            let rule_width = ctx.wrap_width.min(60).max(3);
            ctx.push(RenderedLineParts::Plain(
                "─".repeat(rule_width),
                LineType::HorizontalRule,
            ));
            ctx.push_empty();
        }

        NodeValue::Table(_) => {
            let (alignments, rows, has_header) = collect_table_rows(node);
            for line in render_grid(&rows, &alignments, has_header, ctx.wrap_width) {
                ctx.push(RenderedLineParts::Plain(line, LineType::Table));
            }
            ctx.push_empty();
        }

        NodeValue::FootnoteDefinition(def) => {
            let label = format!("[^{}]: ", def.name);
            let continuation = " ".repeat(label.len());
            let segments = collect_inline_lines(node);
            let mut first = true;
            for spans in segments {
                let prefix = if first { label.as_str() } else { &continuation };
                first = false;
                for line_spans in wrap_spans(&spans, ctx.wrap_width, prefix, &continuation) {
                    ctx.push(RenderedLineParts::Spans(LineType::Paragraph, line_spans));
                }
            }
            ctx.push_empty();
        }

        NodeValue::Image(image) => {
            let alt = extract_text(node);
            ctx.push_media(alt, image.url.clone());
        }

        _ => {
            // Process children for unhandled nodes
            for child in node.children() {
                process_node(child, ctx, depth, list_marker.clone());
            }
        }
    }
}

/// Render a paragraph's inline content, honoring significant line breaks.
fn render_paragraph_text<'a>(node: &'a AstNode<'a>, ctx: &mut RenderCtx<'_>) {
    let segments = collect_inline_lines(node);
    for spans in segments {
        let wrapped = wrap_spans(&spans, ctx.wrap_width, "", "");
        for line_spans in wrapped {
            ctx.push(RenderedLineParts::Spans(LineType::Paragraph, line_spans));
        }
    }
    ctx.push_empty();
}

/// Render a fenced code block as a framed box with inline highlighting.
///
/// Highlighting runs per block; a failed or unknown colorization falls
/// back to the unhighlighted text for that block only.
fn render_code_block(ctx: &mut RenderCtx<'_>, language: Option<&str>, literal: &str) {
    const CODE_RIGHT_PADDING: usize = 3;

    let content_width = literal
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0)
        .min(ctx.wrap_width.saturating_sub(4).max(1));
    let title = language.unwrap_or("code");
    let label = format!(" {title} ");
    let frame_inner_width = content_width + 2 + CODE_RIGHT_PADDING;
    let top_label_width = frame_inner_width.min(label.chars().count());
    let visible_label: String = label.chars().take(top_label_width).collect();
    let top = format!(
        "┌{}{}┐",
        visible_label,
        "─".repeat(frame_inner_width.saturating_sub(visible_label.chars().count()))
    );
    ctx.push(RenderedLineParts::Plain(top, LineType::CodeBlock));

    let highlighted = crate::highlight::highlight_block(language, literal);
    for spans in highlighted {
        let trimmed_spans = truncate_spans(&spans, content_width);
        let trimmed_len = spans_to_string(&trimmed_spans).chars().count();
        let padding = " ".repeat(content_width.saturating_sub(trimmed_len) + CODE_RIGHT_PADDING);

        let mut line_spans = Vec::new();
        line_spans.push(InlineSpan::new("│ ".to_string(), InlineStyle::default()));
        line_spans.extend(trimmed_spans);
        line_spans.push(InlineSpan::new(
            format!("{padding} │"),
            InlineStyle::default(),
        ));
        ctx.push(RenderedLineParts::Spans(LineType::CodeBlock, line_spans));
    }

    ctx.push(RenderedLineParts::Plain(
        format!("└{}┘", "─".repeat(frame_inner_width)),
        LineType::CodeBlock,
    ));
    ctx.push_empty();
}

fn render_list_item<'a>(
    node: &'a AstNode<'a>,
    ctx: &mut RenderCtx<'_>,
    depth: usize,
    list_marker: Option<&str>,
) {
    let indent = "  ".repeat(depth.saturating_sub(1));
    let base_marker = list_marker.unwrap_or("- ").to_string();
    let marker = find_task_marker(node).map_or(base_marker, |m| format!("{m} "));
    let prefix_first = format!("{indent}{marker}");
    let prefix_next = format!("{}{}", indent, " ".repeat(marker.chars().count()));
    let mut rendered_any = false;

    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Paragraph => {
                let segments = collect_inline_lines(child);
                for spans in segments {
                    let prefix = if rendered_any {
                        &prefix_next
                    } else {
                        &prefix_first
                    };
                    for line_spans in wrap_spans(&spans, ctx.wrap_width, prefix, &prefix_next) {
                        ctx.push(RenderedLineParts::Spans(
                            LineType::ListItem(depth),
                            line_spans,
                        ));
                    }
                    rendered_any = true;
                }
            }
            NodeValue::List(_) => {
                process_node(child, ctx, depth, None);
            }
            _ => {
                process_node(child, ctx, depth, None);
            }
        }
    }

    if !rendered_any {
        let segments = collect_inline_lines(node);
        for spans in segments {
            for line_spans in wrap_spans(&spans, ctx.wrap_width, &prefix_first, &prefix_next) {
                ctx.push(RenderedLineParts::Spans(
                    LineType::ListItem(depth),
                    line_spans,
                ));
            }
        }
    }
}

fn ensure_trailing_empty_lines(ctx: &mut RenderCtx<'_>, count: usize) {
    let existing = ctx
        .out
        .lines
        .iter()
        .rev()
        .take_while(|line| matches!(line.line_type(), LineType::Empty))
        .count();
    for _ in existing..count {
        ctx.push_empty();
    }
}

fn render_blockquote<'a>(node: &'a AstNode<'a>, ctx: &mut RenderCtx<'_>, quote_depth: usize) {
    let prefix = quote_prefix(quote_depth);

    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Paragraph => {
                let segments = collect_inline_lines(child);
                for spans in segments {
                    for line_spans in wrap_spans(&spans, ctx.wrap_width, &prefix, &prefix) {
                        ctx.push(RenderedLineParts::Spans(LineType::BlockQuote, line_spans));
                    }
                }
            }
            NodeValue::BlockQuote => {
                render_blockquote(child, ctx, quote_depth + 1);
            }
            _ => {
                let text = extract_text(child);
                for raw_line in text.lines() {
                    let spans = vec![InlineSpan::new(
                        raw_line.to_string(),
                        InlineStyle::default(),
                    )];
                    for line_spans in wrap_spans(&spans, ctx.wrap_width, &prefix, &prefix) {
                        ctx.push(RenderedLineParts::Spans(LineType::BlockQuote, line_spans));
                    }
                }
            }
        }
    }
}

fn quote_prefix(depth: usize) -> String {
    let mut prefix = String::from("  ");
    for _ in 0..depth {
        prefix.push('│');
        prefix.push(' ');
    }
    prefix
}

/// Parse a CSV code block body into rows, or `None` when it isn't valid
/// CSV (the block then falls back to plain code rendering).
fn csv_rows(literal: &str) -> Option<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(literal.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.ok()?;
        rows.push(record.iter().map(|s| s.trim().to_string()).collect());
    }
    if rows.is_empty() { None } else { Some(rows) }
}

/// Render rows of cells as a box-drawn grid, shared by markdown tables and
/// CSV blocks.
fn render_grid(
    rows: &[Vec<String>],
    alignments: &[TableAlignment],
    has_header: bool,
    wrap_width: usize,
) -> Vec<String> {
    if rows.is_empty() {
        return Vec::new();
    }
    let num_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if num_cols == 0 {
        return Vec::new();
    }

    let mut rows = rows.to_vec();
    for row in &mut rows {
        while row.len() < num_cols {
            row.push(String::new());
        }
    }

    let mut col_widths = vec![1_usize; num_cols];
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            col_widths[idx] = col_widths[idx].max(display_width(cell));
        }
    }

    // Keep the grid inside available width.
    // Row width is: 1 + sum(col_width + 3) for all columns.
    let max_table_width = wrap_width.max(4);
    while 1 + col_widths.iter().sum::<usize>() + (3 * num_cols) > max_table_width {
        if let Some((widest_idx, _)) = col_widths.iter().enumerate().max_by_key(|(_, w)| *w) {
            if col_widths[widest_idx] > 1 {
                col_widths[widest_idx] -= 1;
            } else {
                break;
            }
        }
    }

    let top = render_grid_border(&col_widths, '┌', '┬', '┐');
    let mid = render_grid_border(&col_widths, '├', '┼', '┤');
    let bottom = render_grid_border(&col_widths, '└', '┴', '┘');

    let mut lines = Vec::new();
    lines.push(top);
    for (idx, row) in rows.iter().enumerate() {
        lines.push(render_grid_row(row, &col_widths, alignments));
        if has_header && idx == 0 {
            lines.push(mid.clone());
        }
    }
    lines.push(bottom);
    lines
}

fn collect_table_rows<'a>(
    table_node: &'a AstNode<'a>,
) -> (Vec<TableAlignment>, Vec<Vec<String>>, bool) {
    let alignments = match &table_node.data.borrow().value {
        NodeValue::Table(table) => table.alignments.clone(),
        _ => Vec::new(),
    };

    let mut rows = Vec::new();
    let mut has_header = false;
    for row_node in table_node.children() {
        let is_header_row = matches!(row_node.data.borrow().value, NodeValue::TableRow(true));
        if is_header_row {
            has_header = true;
        }
        if !matches!(row_node.data.borrow().value, NodeValue::TableRow(_)) {
            continue;
        }

        let mut row_cells = Vec::new();
        for cell_node in row_node.children() {
            if !matches!(cell_node.data.borrow().value, NodeValue::TableCell) {
                continue;
            }
            let cell = extract_text(cell_node)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            row_cells.push(cell);
        }
        rows.push(row_cells);
    }

    (alignments, rows, has_header)
}

fn render_grid_border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let mut out = String::new();
    out.push(left);
    for (idx, width) in widths.iter().enumerate() {
        out.push_str(&"─".repeat(width + 2));
        if idx + 1 < widths.len() {
            out.push(middle);
        }
    }
    out.push(right);
    out
}

fn render_grid_row(cells: &[String], widths: &[usize], alignments: &[TableAlignment]) -> String {
    let mut out = String::new();
    out.push('│');
    for idx in 0..widths.len() {
        let content = cells.get(idx).map_or("", String::as_str);
        let content = truncate_text(content, widths[idx]);
        let padding = widths[idx].saturating_sub(display_width(&content));

        out.push(' ');
        match alignments.get(idx).copied().unwrap_or(TableAlignment::None) {
            TableAlignment::Right => {
                out.push_str(&" ".repeat(padding));
                out.push_str(&content);
            }
            TableAlignment::Center => {
                let left = padding / 2;
                let right = padding - left;
                out.push_str(&" ".repeat(left));
                out.push_str(&content);
                out.push_str(&" ".repeat(right));
            }
            TableAlignment::Left | TableAlignment::None => {
                out.push_str(&content);
                out.push_str(&" ".repeat(padding));
            }
        }
        out.push(' ');
        out.push('│');
    }
    out
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    let mut width = 0usize;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_chars {
            break;
        }
        out.push(ch);
        width += ch_width;
    }
    out
}

fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

fn extract_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut text = String::new();
    extract_text_recursive(node, &mut text);
    text
}

fn extract_text_recursive<'a>(node: &'a AstNode<'a>, text: &mut String) {
    match &node.data.borrow().value {
        NodeValue::Text(t) => {
            text.push_str(t);
        }
        NodeValue::Code(c) => {
            text.push('`');
            text.push_str(&c.literal);
            text.push('`');
        }
        NodeValue::FootnoteReference(reference) => {
            text.push_str(&format!("[^{}]", reference.name));
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => {
            text.push('\n');
        }
        _ => {
            for child in node.children() {
                extract_text_recursive(child, text);
            }
        }
    }
}

/// Collect inline spans split into visual lines at soft and hard breaks.
///
/// Both break kinds start a new line: the preview treats single newlines
/// in the source as significant.
fn collect_inline_lines<'a>(node: &'a AstNode<'a>) -> Vec<Vec<InlineSpan>> {
    let mut lines = vec![Vec::new()];
    collect_inline_lines_recursive(node, InlineStyle::default(), &mut lines);
    lines
}

fn collect_inline_lines_recursive<'a>(
    node: &'a AstNode<'a>,
    style: InlineStyle,
    lines: &mut Vec<Vec<InlineSpan>>,
) {
    let push_span = |lines: &mut Vec<Vec<InlineSpan>>, span: InlineSpan| {
        if let Some(last) = lines.last_mut() {
            last.push(span);
        }
    };

    match &node.data.borrow().value {
        NodeValue::List(_) | NodeValue::Item(_) => {}
        NodeValue::Text(t) => {
            push_span(lines, InlineSpan::new(t.clone(), style));
        }
        NodeValue::Code(code) => {
            let mut code_style = style;
            code_style.code = true;
            code_style.emphasis = false;
            code_style.strong = false;
            code_style.strikethrough = false;
            push_span(lines, InlineSpan::new(code.literal.clone(), code_style));
        }
        NodeValue::Emph => {
            let mut next = style;
            next.emphasis = true;
            for child in node.children() {
                collect_inline_lines_recursive(child, next, lines);
            }
        }
        NodeValue::Strong => {
            let mut next = style;
            next.strong = true;
            for child in node.children() {
                collect_inline_lines_recursive(child, next, lines);
            }
        }
        NodeValue::Strikethrough => {
            let mut next = style;
            next.strikethrough = true;
            for child in node.children() {
                collect_inline_lines_recursive(child, next, lines);
            }
        }
        NodeValue::Link(_) => {
            let mut next = style;
            next.link = true;
            for child in node.children() {
                collect_inline_lines_recursive(child, next, lines);
            }
        }
        NodeValue::FootnoteReference(reference) => {
            push_span(
                lines,
                InlineSpan::new(format!("[^{}]", reference.name), style),
            );
        }
        NodeValue::SoftBreak | NodeValue::LineBreak => {
            lines.push(Vec::new());
        }
        _ => {
            for child in node.children() {
                collect_inline_lines_recursive(child, style, lines);
            }
        }
    }
}

fn find_task_marker<'a>(node: &'a AstNode<'a>) -> Option<&'static str> {
    if let NodeValue::TaskItem(symbol) = &node.data.borrow().value {
        return Some(if symbol.is_some() { "✓" } else { "□" });
    }
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::TaskItem(symbol) => {
                return Some(if symbol.is_some() { "✓" } else { "□" });
            }
            _ => {
                if let Some(found) = find_task_marker(child) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn wrap_spans(
    spans: &[InlineSpan],
    width: usize,
    prefix_first: &str,
    prefix_next: &str,
) -> Vec<Vec<InlineSpan>> {
    let mut tokens: Vec<InlineSpan> = Vec::new();
    for span in spans {
        tokens.extend(split_inline_tokens(span));
    }

    let mut lines: Vec<Vec<InlineSpan>> = Vec::new();
    let mut current: Vec<InlineSpan> = Vec::new();
    let mut current_len = 0usize;
    let mut has_word = false;

    let start_new_line = |prefix: &str,
                          current: &mut Vec<InlineSpan>,
                          current_len: &mut usize,
                          has_word: &mut bool| {
        current.clear();
        if prefix.is_empty() {
            *current_len = 0;
        } else {
            current.push(InlineSpan::new(prefix.to_string(), InlineStyle::default()));
            *current_len = prefix.len();
        }
        *has_word = false;
    };

    start_new_line(prefix_first, &mut current, &mut current_len, &mut has_word);

    for token in tokens {
        let token_len = token.text().chars().count();
        let token_is_ws = token.text().chars().all(char::is_whitespace);

        if current_len + token_len > width && has_word {
            lines.push(current.clone());
            start_new_line(prefix_next, &mut current, &mut current_len, &mut has_word);
        }

        if token_is_ws && !has_word {
            // Drop leading whitespace at wrapped line starts.
            continue;
        }

        current_len += token_len;
        current.push(token);
        if !token_is_ws {
            has_word = true;
        }
    }

    if current.is_empty() && !prefix_first.is_empty() {
        current.push(InlineSpan::new(
            prefix_first.to_string(),
            InlineStyle::default(),
        ));
    }

    lines.push(current);
    lines
}

fn split_inline_tokens(span: &InlineSpan) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut ws_state: Option<bool> = None;

    for ch in span.text().chars() {
        let is_ws = ch.is_whitespace();
        match ws_state {
            Some(state) if state == is_ws => {
                buf.push(ch);
            }
            Some(_) => {
                out.push(InlineSpan::new(std::mem::take(&mut buf), span.style()));
                buf.push(ch);
                ws_state = Some(is_ws);
            }
            None => {
                buf.push(ch);
                ws_state = Some(is_ws);
            }
        }
    }

    if !buf.is_empty() {
        out.push(InlineSpan::new(buf, span.style()));
    }

    out
}

fn spans_to_string(spans: &[InlineSpan]) -> String {
    let mut content = String::new();
    for span in spans {
        content.push_str(span.text());
    }
    content
}

fn truncate_spans(spans: &[InlineSpan], max_len: usize) -> Vec<InlineSpan> {
    let mut out = Vec::new();
    let mut remaining = max_len;
    for span in spans {
        if remaining == 0 {
            break;
        }
        let taken: String = span.text().chars().take(remaining).collect();
        let count = taken.chars().count();
        if count > 0 {
            out.push(InlineSpan::new(taken, span.style()));
            remaining -= count;
        }
    }
    out
}

/// Collect images from a paragraph node, returning (alt, src) pairs.
fn collect_paragraph_images<'a>(node: &'a AstNode<'a>) -> Vec<(String, String)> {
    let mut images = Vec::new();
    collect_paragraph_images_recursive(node, &mut images);
    images
}

fn collect_paragraph_images_recursive<'a>(
    node: &'a AstNode<'a>,
    images: &mut Vec<(String, String)>,
) {
    match &node.data.borrow().value {
        NodeValue::Image(image) => {
            let alt = extract_text(node);
            images.push((alt, image.url.clone()));
        }
        _ => {
            for child in node.children() {
                collect_paragraph_images_recursive(child, images);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_document() {
        let doc = Document::parse("").unwrap();
        assert_eq!(doc.line_count(), 0);
        assert!(!doc.is_error_placeholder());
    }

    #[test]
    fn test_parse_simple_paragraph() {
        let doc = Document::parse("Hello world").unwrap();
        assert!(doc.line_count() >= 1);
        let lines = doc.visible_lines(0, 10);
        assert!(lines.iter().any(|l| l.content().contains("Hello")));
    }

    #[test]
    fn test_parse_heading() {
        let doc = Document::parse("# Title").unwrap();
        let lines = doc.visible_lines(0, 10);
        let heading = lines
            .iter()
            .find(|l| matches!(l.line_type(), LineType::Heading(1)))
            .expect("heading line missing");
        assert!(heading.content().contains("Title"));
    }

    #[test]
    fn test_parse_code_block_is_framed() {
        let doc = Document::parse("```rust\nfn main() {}\n```").unwrap();
        let lines = doc.visible_lines(0, 10);
        assert!(lines.iter().any(|l| *l.line_type() == LineType::CodeBlock));
        assert!(
            lines
                .iter()
                .any(|l| l.content().starts_with('┌') && l.content().contains("rust"))
        );
    }

    #[test]
    fn test_diagram_block_is_deferred_not_highlighted() {
        let doc = Document::parse("# Title\n\n```mermaid\ngraph TD; A-->B\n```").unwrap();

        // Tag-and-scan: exactly one deferred diagram with the reserved src.
        assert_eq!(doc.diagram_media().count(), 1);
        let diagram = doc.diagram_media().next().unwrap();
        assert!(diagram.src.starts_with(DIAGRAM_SRC_PREFIX));
        assert_eq!(
            doc.diagram_sources().get(&diagram.src).map(String::as_str),
            Some("graph TD; A-->B")
        );

        // The diagram source must not appear as a framed code block.
        let lines = doc.visible_lines(0, 50);
        assert!(!lines.iter().any(|l| *l.line_type() == LineType::CodeBlock));
        assert!(lines.iter().any(|l| *l.line_type() == LineType::Media));
    }

    #[test]
    fn test_multiple_diagrams_get_distinct_keys() {
        let md = "```mermaid\ngraph TD; A-->B\n```\n\n```mermaid\ngraph LR; C-->D\n```";
        let doc = Document::parse(md).unwrap();
        assert_eq!(doc.diagram_media().count(), 2);
        assert_eq!(doc.diagram_sources().len(), 2);
        let keys: Vec<_> = doc.diagram_media().map(|m| m.src.clone()).collect();
        assert_ne!(keys[0], keys[1]);
    }

    #[test]
    fn test_media_heights_reserve_lines() {
        let mut heights = HashMap::new();
        heights.insert(format!("{DIAGRAM_SRC_PREFIX}0"), 8usize);
        let doc =
            parse_with_layout("```mermaid\ngraph TD; A-->B\n```", 80, &heights).unwrap();
        let diagram = doc.diagram_media().next().unwrap();
        assert_eq!(diagram.line_range.len(), 8);
    }

    #[test]
    fn test_csv_block_renders_as_table() {
        let doc = Document::parse("```csv\na,b\n1,2\n```").unwrap();
        let lines = doc.visible_lines(0, 10);
        assert!(lines.iter().any(|l| *l.line_type() == LineType::Table));
        assert!(lines.iter().any(|l| l.content().contains('│')));
    }

    #[test]
    fn test_parse_list() {
        let doc = Document::parse("- Item 1\n- Item 2").unwrap();
        let lines = doc.visible_lines(0, 10);
        assert!(lines.iter().any(|l| l.content().contains("Item 1")));
        assert!(lines.iter().any(|l| l.content().contains("•")));
    }

    #[test]
    fn test_parse_task_list() {
        let doc = Document::parse("- [x] Done\n- [ ] Open").unwrap();
        let lines = doc.visible_lines(0, 10);
        assert!(lines.iter().any(|l| l.content().contains('✓')));
        assert!(lines.iter().any(|l| l.content().contains('□')));
    }

    #[test]
    fn test_parse_image_becomes_media() {
        let doc = Document::parse("![Alt text](image.png)").unwrap();
        assert_eq!(doc.media().len(), 1);
        assert_eq!(doc.media()[0].alt, "Alt text");
        assert_eq!(doc.media()[0].src, "image.png");
        assert!(!doc.media()[0].is_diagram());
    }

    #[test]
    fn test_parse_blockquote() {
        let doc = Document::parse("> This is a quote").unwrap();
        let lines = doc.visible_lines(0, 10);
        assert!(lines.iter().any(|l| *l.line_type() == LineType::BlockQuote));
        assert!(lines.iter().any(|l| l.content().starts_with("  │ ")));
    }

    #[test]
    fn test_single_newline_breaks_line() {
        let doc = Document::parse("first\nsecond").unwrap();
        let lines = doc.visible_lines(0, 10);
        let first = lines.iter().position(|l| l.content() == "first");
        let second = lines.iter().position(|l| l.content() == "second");
        assert!(first.is_some() && second.is_some(), "breaks are significant");
        assert_ne!(first, second);
    }

    #[test]
    fn test_parse_table() {
        let doc = Document::parse("| a | b |\n|---|---|\n| 1 | 2 |").unwrap();
        let lines = doc.visible_lines(0, 10);
        let table_lines: Vec<_> = lines
            .iter()
            .filter(|l| *l.line_type() == LineType::Table)
            .collect();
        assert!(table_lines.len() >= 4, "top, header, separator, row, bottom");
    }

    #[test]
    fn test_wrap_long_paragraph() {
        let md = "word ".repeat(40);
        let doc = Document::parse_with_layout(&md, 30).unwrap();
        let lines = doc.visible_lines(0, 50);
        for line in lines {
            assert!(line.content().chars().count() <= 30);
        }
    }

    #[test]
    fn test_identical_source_parses_identically() {
        let md = "# T\n\ntext **bold**\n\n```rust\nlet x = 1;\n```";
        let a = Document::parse(md).unwrap();
        let b = Document::parse(md).unwrap();
        assert_eq!(a, b);
    }
}
