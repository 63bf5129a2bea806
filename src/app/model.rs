use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use ratatui::layout::Rect;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;

use crate::diagram::DiagramJob;
use crate::document::Document;
use crate::editor::EditorBuffer;
use crate::media::MediaLoader;
use crate::split::SplitLayout;
use crate::store::ContentStore;
use crate::sync::{ScrollRegion, ScrollSync};
use crate::ui::viewport::Viewport;

/// Hash a byte slice for content comparison.
pub(super) fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

/// Diagram display width as a percentage of the preview media width.
///
/// Diagrams carry their own internal layout and read best at a narrower
/// width than photos, which scale to fill the pane.
const DIAGRAM_WIDTH_PERCENT: u32 = 60;

/// Media width as a percentage of the preview pane width.
const MEDIA_WIDTH_PERCENT: u16 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Pending,
    Dragging,
    Finalized,
}

/// A line-based selection in the preview pane (mouse drag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSelection {
    pub anchor: usize,
    pub active: usize,
    pub state: SelectionState,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state apart from the
/// process-wide one-time engine initializations.
pub struct Model {
    /// Content store: the current source text, revision-counted
    pub store: ContentStore,
    /// The edit surface (left pane); single writer of the store
    pub buffer: EditorBuffer,
    /// First visible source line in the editor pane
    pub editor_scroll: usize,
    /// The mounted preview document (right pane)
    pub document: Document,
    /// Preview viewport managing scroll position
    pub viewport: Viewport,
    /// Bidirectional scroll synchronizer
    pub sync: ScrollSync,
    /// Split layout and divider drag state
    pub split: SplitLayout,
    /// Path to the file being edited
    pub file_path: PathBuf,
    /// Base directory for resolving relative image srcs
    pub base_dir: PathBuf,
    /// Terminal frame size
    frame_width: u16,
    frame_height: u16,
    /// (store revision, preview width) last run through the pipeline
    rendered_key: Option<(u64, u16)>,
    /// (document source hash, preview width) last materialized
    last_materialized: Option<(u64, u16)>,
    /// Terminal graphics protocols per media src: (protocol, cols, rows)
    pub media_protocols: HashMap<String, (StatefulProtocol, u16, u16)>,
    /// Reserved media heights in the preview layout (terminal rows)
    media_heights: HashMap<String, usize>,
    /// Image picker for terminal rendering
    pub picker: Option<Picker>,
    /// Whether file watching is enabled
    pub watch_enabled: bool,
    /// Whether diagram materialization is enabled
    pub diagrams_enabled: bool,
    /// Whether help overlay is visible
    pub help_visible: bool,
    /// Current preview line selection (mouse drag)
    pub selection: Option<LineSelection>,
    /// Hash of the file on disk at load/save time (conflict detection)
    pub disk_hash: Option<u64>,
    /// Whether the file on disk changed under a dirty buffer
    pub disk_conflict: bool,
    /// Set after first save attempt under a conflict; second save forces
    pub save_confirmed: bool,
    /// Set after first quit attempt with unsaved changes
    pub quit_confirmed: bool,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Whether the app should quit
    pub should_quit: bool,
    toast: Option<Toast>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("file_path", &self.file_path)
            .field("watch_enabled", &self.watch_enabled)
            .field("split", &self.split.percent())
            .field("editor_scroll", &self.editor_scroll)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create a new model around initial source text.
    pub fn new(file_path: PathBuf, source: String, terminal_size: (u16, u16)) -> Self {
        let base_dir = file_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let buffer = EditorBuffer::from_text(&source);
        let store = ContentStore::new(source);
        let (width, height) = terminal_size;

        let mut model = Self {
            store,
            buffer,
            editor_scroll: 0,
            // The preview holds an explicit placeholder until the first
            // render pass resolves.
            document: crate::pipeline::initializing_placeholder(),
            viewport: Viewport::new(width / 2, height.saturating_sub(1), 1),
            sync: ScrollSync::default(),
            split: SplitLayout::default(),
            file_path,
            base_dir,
            frame_width: width,
            frame_height: height,
            rendered_key: None,
            last_materialized: None,
            media_protocols: HashMap::new(),
            media_heights: HashMap::new(),
            picker: None,
            watch_enabled: false,
            diagrams_enabled: true,
            help_visible: false,
            selection: None,
            disk_hash: None,
            disk_conflict: false,
            save_confirmed: false,
            quit_confirmed: false,
            config_global_path: None,
            config_local_path: None,
            should_quit: false,
            toast: None,
        };
        model.apply_frame_size();
        model
    }

    /// Set the image picker.
    #[must_use]
    pub fn with_picker(mut self, picker: Option<Picker>) -> Self {
        self.picker = picker;
        self
    }

    // --- Geometry ---

    /// The main area above the status bar.
    pub fn main_area(&self) -> Rect {
        Rect::new(
            0,
            0,
            self.frame_width,
            self.frame_height.saturating_sub(1),
        )
    }

    /// Current pane rects from the split layout.
    pub fn pane_areas(&self) -> crate::split::PaneAreas {
        self.split.areas(self.main_area())
    }

    /// Layout width used to wrap the preview document.
    pub fn preview_layout_width(&self) -> u16 {
        self.pane_areas()
            .preview
            .width
            .saturating_sub(crate::ui::PREVIEW_LEFT_PADDING)
            .max(1)
    }

    /// Visible height of the editor pane in lines.
    pub fn editor_view_height(&self) -> u16 {
        self.main_area().height
    }

    pub(super) fn set_frame_size(&mut self, width: u16, height: u16) {
        self.frame_width = width;
        self.frame_height = height;
        self.apply_frame_size();
    }

    pub(super) fn apply_frame_size(&mut self) {
        let areas = self.pane_areas();
        self.viewport
            .resize(areas.preview.width, self.main_area().height);
        self.clamp_editor_scroll();
    }

    // --- Render pipeline coupling ---

    /// Re-render the preview when the store or layout changed.
    ///
    /// Returns true when a new document was mounted.
    pub fn refresh_preview(&mut self) -> bool {
        let key = (self.store.revision(), self.preview_layout_width());
        if self.rendered_key == Some(key) {
            return false;
        }
        let document = crate::pipeline::render(self.store.get(), key.1, &self.media_heights);
        self.install_preview(document);
        self.rendered_key = Some(key);
        true
    }

    /// Mount a freshly rendered document into the preview pane.
    fn install_preview(&mut self, document: Document) {
        self.document = document;
        self.viewport.set_total_lines(self.document.line_count());
        self.clamp_selection();
        // Drop cached protocols for media no longer present.
        let valid: std::collections::HashSet<_> = self
            .document
            .media()
            .iter()
            .map(|m| m.src.clone())
            .collect();
        self.media_protocols.retain(|src, _| valid.contains(src));
        self.media_heights.retain(|src, _| valid.contains(src));
    }

    /// Materialize deferred diagrams (and referenced images) in the
    /// mounted preview.
    ///
    /// Runs only against the currently mounted document and is a no-op
    /// when that mount was already materialized at this width — identical
    /// output never re-invokes the engine. Engine unavailability degrades
    /// to diagram source shown as code.
    pub fn materialize_diagrams(&mut self) {
        let width = self.preview_layout_width();
        let mount_key = (self.document.source_hash(), width);
        if self.last_materialized == Some(mount_key) {
            return;
        }

        let Some((font_width, _)) = self.picker.as_ref().map(Picker::font_size) else {
            // No terminal graphics at all; placeholders stay as text.
            self.last_materialized = Some(mount_key);
            return;
        };
        let target_width_cols = media_width_cols(width);
        let target_width_px = u32::from(target_width_cols) * u32::from(font_width);

        // Tag-and-scan: deferred diagrams are found by their reserved src
        // discriminator, independent of how the parser emitted them.
        let jobs: Vec<DiagramJob> = if self.diagrams_enabled {
            self.document
                .diagram_media()
                .filter_map(|media| {
                    self.document
                        .diagram_sources()
                        .get(&media.src)
                        .map(|source| DiagramJob {
                            key: media.src.clone(),
                            source: source.clone(),
                        })
                })
                .collect()
        } else {
            Vec::new()
        };

        let image_srcs: Vec<String> = self
            .document
            .media()
            .iter()
            .filter(|m| !m.is_diagram())
            .map(|m| m.src.clone())
            .collect();

        if !jobs.is_empty() {
            if let Some(engine) = crate::diagram::engine() {
                let diagram_width_px = target_width_px * DIAGRAM_WIDTH_PERCENT / 100;
                let outcomes =
                    crate::diagram::render_batch(engine, &jobs, diagram_width_px.max(1));
                for outcome in outcomes {
                    match outcome.result {
                        Ok(image) => self.install_media_protocol(&outcome.key, image, width),
                        Err(_) => {
                            // This diagram stays as its visible placeholder;
                            // siblings are unaffected.
                            self.media_protocols.remove(&outcome.key);
                            self.media_heights.remove(&outcome.key);
                        }
                    }
                }
            }
            // Engine init failure was logged once inside the gate; the
            // sources remain visible as code.
        }

        if !image_srcs.is_empty() {
            let loader = MediaLoader::new(self.base_dir.clone());
            for src in image_srcs {
                if self.media_protocols.contains_key(&src) {
                    continue;
                }
                if let Some(image) = loader.load(&src) {
                    self.install_media_protocol(&src, image, width);
                }
            }
        }

        self.last_materialized = Some(mount_key);
        self.reflow_for_media_heights();
    }

    /// Create a terminal protocol for one rendered media image.
    fn install_media_protocol(&mut self, src: &str, image: image::DynamicImage, width: u16) {
        let Some(picker) = &self.picker else { return };
        let target_width_cols = media_width_cols(width);
        let protocol = picker.new_resize_protocol(image);
        let (cols, rows) = protocol_render_size(&protocol, target_width_cols.max(1));
        crate::perf::log_event(
            "media.protocol",
            format!("src={src} cols={cols} rows={rows}"),
        );
        self.media_protocols
            .insert(src.to_string(), (protocol, cols, rows));
    }

    /// Re-render with updated reserved heights when materialization
    /// changed any media geometry.
    fn reflow_for_media_heights(&mut self) {
        let current: HashMap<String, usize> = self
            .media_protocols
            .iter()
            .map(|(src, (_, _, rows))| (src.clone(), *rows as usize))
            .collect();
        if current == self.media_heights {
            return;
        }
        crate::perf::log_event(
            "media.reflow",
            format!("old={} new={}", self.media_heights.len(), current.len()),
        );
        self.media_heights = current;
        let width = self.preview_layout_width();
        let document = crate::pipeline::render(self.store.get(), width, &self.media_heights);
        // Same source, new geometry: mount without touching the rendered
        // key, so the next refresh still sees an up-to-date pipeline state.
        self.install_preview(document);
    }

    // --- Editing ---

    /// Flush the edit buffer into the content store (change notification).
    pub(super) fn flush_buffer_to_store(&mut self) {
        self.store.set(self.buffer.text());
    }

    /// Scroll the editor so the cursor stays visible, then mirror.
    pub(super) fn ensure_cursor_visible(&mut self) {
        let cursor_line = self.buffer.cursor().line;
        let height = self.editor_view_height() as usize;
        if height == 0 {
            self.editor_scroll = cursor_line;
            return;
        }
        let before = self.editor_scroll;
        if cursor_line < self.editor_scroll {
            self.editor_scroll = cursor_line;
        } else if cursor_line >= self.editor_scroll + height {
            self.editor_scroll = cursor_line + 1 - height;
        }
        if self.editor_scroll != before {
            self.sync_from_editor();
        }
    }

    pub(super) fn clamp_editor_scroll(&mut self) {
        self.editor_scroll = self.editor_scroll.min(self.editor_scroll_max());
    }

    pub fn editor_scroll_max(&self) -> usize {
        self.buffer
            .line_count()
            .saturating_sub(self.editor_view_height() as usize)
    }

    // --- Scroll synchronization ---

    /// Scroll snapshot of the editor pane.
    pub fn editor_region(&self) -> ScrollRegion {
        ScrollRegion::new(
            self.editor_scroll,
            self.editor_view_height() as usize,
            self.buffer.line_count(),
        )
    }

    /// Mirror an editor scroll into the preview pane.
    pub(super) fn sync_from_editor(&mut self) {
        let source = self.editor_region();
        let target = self.viewport.region();
        if let Some(offset) = self.sync.mirror(source, target) {
            self.viewport.set_offset(offset);
        }
    }

    /// Mirror a preview scroll into the editor pane.
    pub(super) fn sync_from_preview(&mut self) {
        let source = self.viewport.region();
        let target = self.editor_region();
        if let Some(offset) = self.sync.mirror(source, target) {
            self.editor_scroll = offset.min(self.editor_scroll_max());
        }
    }

    // --- Selection ---

    pub fn selection_range(&self) -> Option<std::ops::RangeInclusive<usize>> {
        let selection = self.selection?;
        let line_count = self.document.line_count();
        if line_count == 0 {
            return None;
        }
        let max = line_count.saturating_sub(1);
        let start = selection.anchor.min(selection.active).min(max);
        let end = selection.anchor.max(selection.active).min(max);
        Some(start..=end)
    }

    /// Plain text of the current selection, code-frame borders stripped.
    pub fn selected_text(&self) -> Option<(String, usize)> {
        let range = self.selection_range()?;
        let mut lines = Vec::new();
        for idx in range {
            if let Some(line) = self.document.line_at(idx) {
                if let Some(text) = clean_selected_line(line) {
                    lines.push(text);
                }
            }
        }
        if lines.is_empty() {
            return None;
        }
        let count = lines.len();
        Some((lines.join("\n"), count))
    }

    pub fn selection_dragging(&self) -> bool {
        self.selection
            .as_ref()
            .is_some_and(|sel| sel.state == SelectionState::Dragging)
    }

    pub const fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn clamp_selection(&mut self) {
        let Some(selection) = self.selection else {
            return;
        };
        let line_count = self.document.line_count();
        if line_count == 0 {
            self.selection = None;
            return;
        }
        let max = line_count.saturating_sub(1);
        self.selection = Some(LineSelection {
            anchor: selection.anchor.min(max),
            active: selection.active.min(max),
            state: selection.state,
        });
    }

    // --- File state ---

    /// Hash the file on disk, `None` when it can't be read.
    pub fn file_disk_hash(&self) -> Option<u64> {
        let bytes = std::fs::read(&self.file_path).ok()?;
        Some(hash_bytes(&bytes))
    }

    /// Reload the file from disk into the store and buffer.
    ///
    /// Refuses (flags a conflict) when the buffer holds unsaved edits.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub(super) fn reload_from_disk(&mut self) -> Result<()> {
        let bytes = std::fs::read(&self.file_path)?;
        let new_hash = hash_bytes(&bytes);
        if self.disk_hash == Some(new_hash) {
            return Ok(());
        }
        if self.buffer.is_dirty() {
            self.disk_conflict = true;
            self.show_toast(
                ToastLevel::Warning,
                "File changed on disk — save to overwrite, or reload with F5",
            );
            return Ok(());
        }
        let text = String::from_utf8_lossy(&bytes).to_string();
        self.buffer.replace_all(&text);
        self.store.set(text);
        self.disk_hash = Some(new_hash);
        self.disk_conflict = false;
        self.clamp_editor_scroll();
        Ok(())
    }

    // --- Toasts ---

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

/// Media target width in columns for a given preview width.
fn media_width_cols(preview_width: u16) -> u16 {
    #[allow(clippy::cast_possible_truncation)]
    let cols = (u32::from(preview_width) * u32::from(MEDIA_WIDTH_PERCENT) / 100) as u16;
    cols.max(1)
}

fn protocol_render_size(protocol: &StatefulProtocol, target_width_cols: u16) -> (u16, u16) {
    use ratatui_image::Resize;
    let resize = if matches!(
        protocol.protocol_type(),
        ratatui_image::protocol::StatefulProtocolType::Halfblocks(_)
    ) {
        Resize::Scale(Some(image::imageops::FilterType::CatmullRom))
    } else {
        Resize::Scale(None)
    };
    let area = Rect::new(0, 0, target_width_cols, u16::MAX);
    let rect = protocol.size_for(resize, area);
    (rect.width.max(1), rect.height.max(1))
}

/// Strip code-frame borders from a selected preview line.
fn clean_selected_line(line: &crate::document::RenderedLine) -> Option<String> {
    use crate::document::LineType;

    let content = line.content();
    if *line.line_type() == LineType::CodeBlock {
        if content.starts_with('┌') || content.starts_with('└') {
            return None;
        }
        if let Some(stripped) = content.strip_prefix("│ ") {
            let stripped = stripped.strip_suffix(" │").unwrap_or(stripped);
            return Some(stripped.trim_end_matches(' ').to_string());
        }
    }
    Some(content.to_string())
}

// Implement Default for Model to allow std::mem::take
impl Default for Model {
    fn default() -> Self {
        Self::new(PathBuf::new(), String::new(), (80, 24))
    }
}
