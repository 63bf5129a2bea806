//! Core document types.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::ops::Range;

/// Result of parsing markdown, ready to be assembled into a `Document`.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Rendered lines for display
    pub lines: Vec<RenderedLine>,
    /// Media placeholders (file images and deferred diagrams)
    pub media: Vec<MediaRef>,
    /// Deferred diagram sources keyed by synthetic src (e.g. `mermaid://0`)
    pub diagram_sources: HashMap<String, String>,
}

/// A parsed and rendered markdown document: one immutable render result.
///
/// Regenerated wholesale from the content store on every change; two
/// documents rendered from the same source at the same layout compare
/// equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Original source text
    source: String,
    /// Rendered lines for display
    lines: Vec<RenderedLine>,
    /// Media placeholders (file images and deferred diagrams)
    media: Vec<MediaRef>,
    /// Deferred diagram sources keyed by synthetic src (e.g. `mermaid://0`)
    diagram_sources: HashMap<String, String>,
}

impl Document {
    /// Create an empty document.
    pub fn empty() -> Self {
        Self {
            source: String::new(),
            lines: Vec::new(),
            media: Vec::new(),
            diagram_sources: HashMap::new(),
        }
    }

    /// Create a new document from parsed results.
    pub(crate) fn from_parsed(source: String, result: ParsedDocument) -> Self {
        Self {
            source,
            lines: result.lines,
            media: result.media,
            diagram_sources: result.diagram_sources,
        }
    }

    /// Create a single-line notice document (e.g. the initializing
    /// placeholder shown before the first render pass completes).
    pub fn notice(message: &str) -> Self {
        Self {
            source: String::new(),
            lines: vec![RenderedLine::new(message.to_string(), LineType::Notice)],
            media: Vec::new(),
            diagram_sources: HashMap::new(),
        }
    }

    /// Create an error-placeholder document.
    ///
    /// Replaces the preview output entirely when a render pass fails; the
    /// previous output is discarded rather than kept alongside the error.
    pub fn error_placeholder(message: &str) -> Self {
        let mut lines = vec![RenderedLine::new(
            "Markdown could not be rendered".to_string(),
            LineType::Error,
        )];
        for detail in message.lines() {
            lines.push(RenderedLine::new(detail.to_string(), LineType::Error));
        }
        Self {
            source: String::new(),
            lines,
            media: Vec::new(),
            diagram_sources: HashMap::new(),
        }
    }

    /// Whether this document is an error placeholder.
    pub fn is_error_placeholder(&self) -> bool {
        self.lines
            .first()
            .is_some_and(|line| *line.line_type() == LineType::Error)
    }

    /// Get the total number of rendered lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Get all media placeholders (file images and deferred diagrams).
    pub fn media(&self) -> &[MediaRef] {
        &self.media
    }

    /// Get deferred diagram sources keyed by synthetic src.
    pub const fn diagram_sources(&self) -> &HashMap<String, String> {
        &self.diagram_sources
    }

    /// Media placeholders that are deferred diagrams.
    pub fn diagram_media(&self) -> impl Iterator<Item = &MediaRef> {
        self.media.iter().filter(|m| m.is_diagram())
    }

    /// Get visible lines for rendering.
    ///
    /// Returns lines from `offset` to `offset + count`.
    pub fn visible_lines(&self, offset: usize, count: usize) -> Vec<&RenderedLine> {
        self.lines.iter().skip(offset).take(count).collect()
    }

    /// Get a specific rendered line by index.
    pub fn line_at(&self, index: usize) -> Option<&RenderedLine> {
        self.lines.get(index)
    }

    /// Get the source text this document was rendered from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Hash of the source this render was derived from.
    ///
    /// Used by the diagram materialization pass to skip redundant engine
    /// invocations when the triggering output is identical.
    pub fn source_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.source.hash(&mut hasher);
        hasher.finish()
    }
}

/// A single rendered line with styling information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    /// The text content of the line
    content: String,
    /// The type of line (for styling)
    line_type: LineType,
    /// Optional inline-styled spans for rendering
    spans: Vec<InlineSpan>,
}

impl RenderedLine {
    /// Create a new rendered line.
    pub const fn new(content: String, line_type: LineType) -> Self {
        Self {
            content,
            line_type,
            spans: Vec::new(),
        }
    }

    /// Create a new rendered line with inline spans.
    pub const fn with_spans(content: String, line_type: LineType, spans: Vec<InlineSpan>) -> Self {
        Self {
            content,
            line_type,
            spans,
        }
    }

    /// Get the text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the line type.
    pub const fn line_type(&self) -> &LineType {
        &self.line_type
    }

    /// Get inline spans, if present.
    pub fn spans(&self) -> Option<&[InlineSpan]> {
        if self.spans.is_empty() {
            None
        } else {
            Some(&self.spans)
        }
    }

    /// Get as string slice.
    pub fn as_str(&self) -> &str {
        &self.content
    }
}

/// Inline style flags for a text span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub emphasis: bool,
    pub strong: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub link: bool,
    pub fg: Option<InlineColor>,
    pub bg: Option<InlineColor>,
}

/// RGB color for inline styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A styled inline span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    text: String,
    style: InlineStyle,
}

impl InlineSpan {
    pub const fn new(text: String, style: InlineStyle) -> Self {
        Self { text, style }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn style(&self) -> InlineStyle {
        self.style
    }
}

/// Type of a rendered line, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    /// Normal paragraph text
    Paragraph,
    /// Heading with level (1-6)
    Heading(u8),
    /// Code block line
    CodeBlock,
    /// Block quote line
    BlockQuote,
    /// List item with nesting level
    ListItem(usize),
    /// Table row
    Table,
    /// Horizontal rule
    HorizontalRule,
    /// Media placeholder (image or deferred diagram)
    Media,
    /// Informational notice (e.g. initializing placeholder)
    Notice,
    /// Error placeholder line
    Error,
    /// Empty line
    Empty,
}

/// Synthetic src prefix marking a deferred diagram block.
///
/// The parser tags diagram code blocks with this reserved discriminator so
/// the post-processing pass can find them without knowing anything about
/// how the parser produced them.
pub const DIAGRAM_SRC_PREFIX: &str = "mermaid://";

/// Reference to a media placeholder in the rendered document.
///
/// Covers both file images (`src` is a path or URL) and deferred diagrams
/// (`src` starts with [`DIAGRAM_SRC_PREFIX`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    /// Alt text (or the diagram language tag)
    pub alt: String,
    /// Media source
    pub src: String,
    /// Line range reserved in the rendered document
    pub line_range: Range<usize>,
}

impl MediaRef {
    /// Whether this placeholder is a deferred diagram.
    pub fn is_diagram(&self) -> bool {
        self.src.starts_with(DIAGRAM_SRC_PREFIX)
    }
}
