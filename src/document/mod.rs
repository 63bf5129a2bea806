//! Markdown document parsing and rendering.
//!
//! This module handles:
//! - Parsing markdown with comrak
//! - Deferring diagram blocks to the post-processing pass
//! - Rendering to styled lines for display

mod parser;
mod types;

pub use parser::{DIAGRAM_LANGUAGE, comrak_options, parse_with_layout};
pub use types::{
    DIAGRAM_SRC_PREFIX, Document, InlineColor, InlineSpan, InlineStyle, LineType, MediaRef,
    RenderedLine,
};
