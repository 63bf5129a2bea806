//! Diagram engine: renders mermaid flowchart sources to raster images.
//!
//! The engine initializes lazily exactly once per process. When
//! initialization fails (no usable system fonts), the failure is memoized
//! and logged once; every later call sees the degraded mode and diagram
//! sources stay visible as plain code — the render itself never fails
//! because of it.
//!
//! Rendering is a batch operation: the materialization pass hands over
//! every deferred diagram of one mount in a single call, and a failure of
//! one diagram never affects its siblings.

pub mod config;
pub mod flow;
pub mod layout;
mod raster;
mod svg;
pub mod text_metrics;
pub mod theme;

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Mutex, OnceLock};

use image::DynamicImage;
use thiserror::Error;

use text_metrics::TextMeasurer;
use theme::Theme;

/// Rendered raster cache entries kept before the cache is cleared.
///
/// Each entry holds a full decoded RGBA image; keeping the cache bounded
/// prevents unbounded memory growth over long editing sessions.
const RASTER_CACHE_MAX: usize = 32;

/// Errors from parsing, laying out, or rasterizing a diagram.
#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("empty diagram source")]
    Empty,
    #[error("unsupported diagram type `{0}`")]
    Unsupported(String),
    #[error("invalid flowchart statement: {0}")]
    Parse(String),
    #[error("diagram has no nodes")]
    NoNodes,
    #[error("no usable system font for diagram text")]
    FontUnavailable,
    #[error("failed to rasterize diagram: {0}")]
    Raster(String),
}

/// One deferred diagram handed to [`render_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramJob {
    /// The synthetic `mermaid://N` src tagging the mounted placeholder.
    pub key: String,
    /// Raw diagram source from the fenced block.
    pub source: String,
}

/// Per-diagram outcome of a batch render.
#[derive(Debug)]
pub struct DiagramOutcome {
    pub key: String,
    pub result: Result<DynamicImage, DiagramError>,
}

/// The initialized diagram engine.
pub struct Engine {
    measurer: TextMeasurer,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("font", &self.measurer.family())
            .finish()
    }
}

/// Get the process-wide engine, initializing it on first use.
///
/// Returns `None` in degraded mode. Initialization runs at most once; the
/// failure is not retried on subsequent renders.
pub fn engine() -> Option<&'static Engine> {
    static ENGINE: OnceLock<Option<Engine>> = OnceLock::new();
    ENGINE
        .get_or_init(|| {
            let _scope = crate::perf::scope("diagram.engine.init");
            match Engine::initialize() {
                Ok(engine) => Some(engine),
                Err(err) => {
                    tracing::warn!(%err, "diagram engine unavailable; diagrams stay as code");
                    None
                }
            }
        })
        .as_ref()
}

impl Engine {
    fn initialize() -> Result<Self, DiagramError> {
        let measurer = TextMeasurer::from_system_fonts()?;
        Ok(Self { measurer })
    }

    /// Render one diagram source to SVG.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is not a parseable flowchart.
    pub fn render_svg(&self, source: &str) -> Result<String, DiagramError> {
        let (directive, body) = config::extract_directive(source);
        let directive = directive.unwrap_or_default();

        let base = directive
            .theme
            .as_deref()
            .map_or_else(default_theme, Theme::named);
        let theme = base.with_overrides(&directive.theme_variables);

        let graph = flow::parse_flowchart(&body)?;
        let layout = layout::compute_layout(&graph, &self.measurer, &theme);
        Ok(svg::render_svg(
            &graph,
            &layout,
            &theme,
            self.measurer.family(),
        ))
    }

    /// Render one diagram source to a raster image at the target width.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or rasterization fails.
    pub fn render_image(
        &self,
        source: &str,
        target_width_px: u32,
    ) -> Result<DynamicImage, DiagramError> {
        let svg = self.render_svg(source)?;
        raster::rasterize_svg(&svg, target_width_px)
    }
}

/// Render a whole batch of deferred diagrams for one mount pass.
///
/// Unchanged diagrams hit the raster cache (keyed by source hash and
/// width) so edits elsewhere in the document never re-rasterize them.
/// A failing diagram yields an `Err` outcome for its key only.
pub fn render_batch(engine: &Engine, jobs: &[DiagramJob], target_width_px: u32) -> Vec<DiagramOutcome> {
    let _scope = crate::perf::scope("diagram.render_batch");
    jobs.iter()
        .map(|job| {
            let cache_key = (hash_source(&job.source), target_width_px);
            if let Some(cached) = cache_get(cache_key) {
                return DiagramOutcome {
                    key: job.key.clone(),
                    result: Ok(cached),
                };
            }
            let result = engine.render_image(&job.source, target_width_px);
            if let Ok(image) = &result {
                cache_put(cache_key, image.clone());
            } else if let Err(err) = &result {
                crate::perf::log_event(
                    "diagram.render.error",
                    format!("key={} err={err}", job.key),
                );
            }
            DiagramOutcome {
                key: job.key.clone(),
                result,
            }
        })
        .collect()
}

fn default_theme() -> Theme {
    if crate::highlight::is_light_background() {
        Theme::modern()
    } else {
        Theme::dark()
    }
}

fn hash_source(source: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

fn raster_cache() -> &'static Mutex<HashMap<(u64, u32), DynamicImage>> {
    static CACHE: OnceLock<Mutex<HashMap<(u64, u32), DynamicImage>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn cache_get(key: (u64, u32)) -> Option<DynamicImage> {
    raster_cache().lock().ok()?.get(&key).cloned()
}

fn cache_put(key: (u64, u32), image: DynamicImage) {
    if let Ok(mut cache) = raster_cache().lock() {
        if cache.len() >= RASTER_CACHE_MAX {
            cache.clear();
        }
        cache.insert(key, image);
    }
}
