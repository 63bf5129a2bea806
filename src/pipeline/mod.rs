//! The render pipeline boundary.
//!
//! `render` turns the content store's current text into a [`Document`]
//! and never fails past this boundary: a parse failure (or a panicking
//! stage) is converted into an error-placeholder document that replaces
//! the previous output wholesale.
//!
//! Stage order is fixed: the one-time initialization gate runs before the
//! first parse, the parse emits styled lines with diagram blocks deferred,
//! and inline highlighting happens per code block during the parse walk.
//! Diagram materialization is not part of this pipeline — it runs against
//! the mounted preview (see `app::Model::materialize_diagrams`).

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::OnceLock;

use crate::document::Document;

/// Message shown in the preview until the first render pass completes.
const INITIALIZING_MESSAGE: &str = "Initializing markdown renderer…";

/// One-time pipeline configuration: highlighter registration and theme
/// load. Subsequent calls are no-ops; the first call blocks until the
/// registration has fully completed, so no render can observe a partially
/// configured parser.
pub fn ensure_ready() {
    static READY: OnceLock<()> = OnceLock::new();
    READY.get_or_init(|| {
        let _scope = crate::perf::scope("pipeline.init");
        crate::highlight::ensure_loaded();
    });
}

/// The placeholder document installed before the first render resolves.
pub fn initializing_placeholder() -> Document {
    Document::notice(INITIALIZING_MESSAGE)
}

/// Render source text into a document at the given layout width.
///
/// `media_heights` carries reserved row heights for already-materialized
/// media so reflows keep space for them.
///
/// Never panics and never returns a partial result: the output is either
/// a complete document or a well-formed error placeholder.
pub fn render(source: &str, width: u16, media_heights: &HashMap<String, usize>) -> Document {
    ensure_ready();
    let _scope = crate::perf::scope("pipeline.render");

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        crate::document::parse_with_layout(source, width, media_heights)
    }));

    match outcome {
        Ok(Ok(document)) => document,
        Ok(Err(err)) => {
            tracing::warn!(%err, "markdown parse failed");
            Document::error_placeholder(&err.to_string())
        }
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "renderer panicked".to_string());
            tracing::error!(%detail, "render stage panicked");
            Document::error_placeholder(&detail)
        }
    }
}
