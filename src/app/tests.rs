use std::path::PathBuf;

use crate::app::{Message, Model, update};
use crate::editor::Direction;

/// A document long enough that both panes overflow a 30-row terminal.
fn long_model() -> Model {
    let source = "line of text\n".repeat(200);
    let mut model = Model::new(PathBuf::from("test.md"), source, (100, 30));
    model.refresh_preview();
    model
}

fn short_model() -> Model {
    let mut model = Model::new(PathBuf::from("test.md"), "just one line".to_string(), (100, 30));
    model.refresh_preview();
    model
}

// --- Content store coupling ---

#[test]
fn test_insert_char_notifies_store() {
    let mut model = short_model();
    let before = model.store.revision();
    model = update(model, Message::InsertChar('x'));
    assert_eq!(model.store.revision(), before + 1);
    assert!(model.store.get().contains('x'));
}

#[test]
fn test_cursor_movement_does_not_notify_store() {
    let mut model = long_model();
    let before = model.store.revision();
    model = update(model, Message::MoveCursor(Direction::Down));
    model = update(model, Message::MoveEnd);
    assert_eq!(model.store.revision(), before);
}

#[test]
fn test_refresh_preview_only_mounts_on_change() {
    let mut model = short_model();
    assert!(!model.refresh_preview(), "no change since construction");
    model = update(model, Message::InsertChar('x'));
    assert!(model.refresh_preview(), "edit must remount");
    assert!(!model.refresh_preview(), "second refresh is a no-op");
}

#[test]
fn test_edit_supersedes_previous_output() {
    let mut model = short_model();
    model = update(model, Message::InsertChar('z'));
    model.refresh_preview();
    assert!(model.document.source().contains('z'));
}

// --- Scroll synchronization ---

#[test]
fn test_editor_scroll_mirrors_to_preview() {
    let mut model = long_model();
    let editor_range = model.editor_region().range();
    assert!(editor_range > 0, "fixture must overflow");

    model = update(model, Message::EditorScrollDown(editor_range / 2));

    let editor_fraction = model.editor_region().fraction().unwrap();
    let preview_fraction = model.viewport.region().fraction().unwrap();
    assert!(
        (editor_fraction - preview_fraction).abs() < 0.02,
        "panes must agree on the scroll fraction: {editor_fraction} vs {preview_fraction}"
    );
}

#[test]
fn test_preview_scroll_mirrors_to_editor() {
    let mut model = long_model();
    model = update(model, Message::PreviewScrollDown(40));

    let editor_fraction = model.editor_region().fraction().unwrap();
    let preview_fraction = model.viewport.region().fraction().unwrap();
    assert!((editor_fraction - preview_fraction).abs() < 0.02);
}

#[test]
fn test_mirrored_write_does_not_bounce_back_within_frame() {
    let mut model = long_model();
    model = update(model, Message::EditorScrollDown(50));
    let editor_after_first = model.editor_scroll;

    // The mirrored preview write would fire the reciprocal handler in the
    // same frame; the guard must drop it.
    model = update(model, Message::PreviewScrollDown(10));
    assert_eq!(
        model.editor_scroll, editor_after_first,
        "guarded frame must not write back into the editor"
    );
}

#[test]
fn test_guard_releases_at_frame_boundary() {
    let mut model = long_model();
    model = update(model, Message::EditorScrollDown(50));
    assert!(model.sync.is_guarded());

    model.sync.release();
    let editor_before = model.editor_scroll;
    model = update(model, Message::PreviewScrollDown(10));
    assert_ne!(
        model.editor_scroll, editor_before,
        "after release the next frame mirrors again"
    );
}

#[test]
fn test_no_overflow_pane_never_donates_scroll() {
    let mut model = short_model();
    let preview_before = model.viewport.offset();
    model = update(model, Message::EditorScrollDown(5));
    assert_eq!(model.viewport.offset(), preview_before);
    assert!(!model.sync.is_guarded(), "skipped update must not guard");
}

#[test]
fn test_sync_toggle_disables_mirroring() {
    let mut model = long_model();
    model = update(model, Message::ToggleSync);
    let preview_before = model.viewport.offset();
    model = update(model, Message::EditorScrollDown(50));
    assert_eq!(model.viewport.offset(), preview_before);
}

#[test]
fn test_no_divergence_after_many_alternating_scrolls() {
    let mut model = long_model();
    for i in 0..50 {
        model = update(model, Message::EditorScrollDown(3 + i % 5));
        model.sync.release();
        model = update(model, Message::PreviewScrollUp(2));
        model.sync.release();
    }
    let editor_fraction = model.editor_region().fraction().unwrap_or(0.0);
    let preview_fraction = model.viewport.region().fraction().unwrap_or(0.0);
    assert!((editor_fraction - preview_fraction).abs() < 0.05);
}

// --- Divider ---

#[test]
fn test_divider_drag_protocol() {
    let mut model = long_model();
    model = update(model, Message::DividerGrab);
    assert!(model.split.is_dragging());

    model = update(model, Message::DividerDrag(20));
    assert!((model.split.percent() - 20.0).abs() < 1.0);

    model = update(model, Message::DividerRelease);
    assert!(!model.split.is_dragging());
}

#[test]
fn test_divider_drag_ignored_without_grab() {
    let mut model = long_model();
    let before = model.split.percent();
    model = update(model, Message::DividerDrag(5));
    assert!((model.split.percent() - before).abs() < f64::EPSILON);
}

#[test]
fn test_divider_clamps_at_extremes() {
    let mut model = long_model();
    model = update(model, Message::DividerGrab);
    model = update(model, Message::DividerDrag(0));
    assert!((model.split.percent() - 10.0).abs() < f64::EPSILON);
    model = update(model, Message::DividerDrag(u16::MAX));
    assert!((model.split.percent() - 90.0).abs() < f64::EPSILON);
}

#[test]
fn test_selection_suppressed_while_dragging_divider() {
    let mut model = long_model();
    model = update(model, Message::DividerGrab);
    model = update(model, Message::StartSelection(3));
    assert!(model.selection.is_none(), "no text selection during drag");
}

#[test]
fn test_divider_grab_clears_existing_selection() {
    let mut model = long_model();
    model = update(model, Message::StartSelection(2));
    assert!(model.selection.is_some());
    model = update(model, Message::DividerGrab);
    assert!(model.selection.is_none());
}

// --- Selection ---

#[test]
fn test_selection_lifecycle() {
    let mut model = long_model();
    model = update(model, Message::StartSelection(2));
    model = update(model, Message::UpdateSelection(6));
    assert!(model.selection_dragging());
    assert_eq!(model.selection_range(), Some(2..=6));
    model = update(model, Message::EndSelection(6));
    assert!(!model.selection_dragging());
}

#[test]
fn test_selected_text_strips_code_frames() {
    let source = "```rust\nlet x = 1;\n```\n";
    let mut model = Model::new(PathBuf::from("t.md"), source.to_string(), (120, 30));
    model.refresh_preview();
    let count = model.document.line_count();
    model = update(model, Message::StartSelection(0));
    model = update(model, Message::UpdateSelection(count.saturating_sub(1)));
    let (text, _) = model.selected_text().expect("selection text");
    assert!(text.contains("let x = 1;"));
    assert!(!text.contains('┌'));
    assert!(!text.contains('│'));
}

// --- Editing behaviors ---

#[test]
fn test_editor_click_moves_cursor() {
    let mut model = long_model();
    model = update(model, Message::EditorClick(5, 3));
    assert_eq!(model.buffer.cursor().line, 5);
    assert_eq!(model.buffer.cursor().col, 3);
}

#[test]
fn test_cursor_below_view_scrolls_editor() {
    let mut model = long_model();
    let height = model.editor_view_height() as usize;
    model = update(model, Message::EditorClick(height + 10, 0));
    assert!(model.editor_scroll > 0, "cursor must be kept visible");
}

#[test]
fn test_page_down_moves_editor_one_page() {
    let mut model = long_model();
    let height = model.editor_view_height() as usize;
    model = update(model, Message::EditorPageDown);
    assert_eq!(model.editor_scroll, height);
}

// --- Resize ---

#[test]
fn test_resize_updates_viewport_geometry() {
    let mut model = long_model();
    model = update(model, Message::Resize(140, 50));
    assert_eq!(model.main_area().width, 140);
    assert_eq!(model.viewport.height(), 49);
}

// --- Quit flow ---

#[test]
fn test_quit_clean_buffer_exits() {
    let mut model = short_model();
    model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_quit_dirty_buffer_needs_confirmation() {
    let mut model = short_model();
    model = update(model, Message::InsertChar('x'));
    model = update(model, Message::Quit);
    assert!(!model.should_quit);
    assert!(model.quit_confirmed);
    model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_other_message_cancels_quit_confirmation() {
    let mut model = short_model();
    model = update(model, Message::InsertChar('x'));
    model = update(model, Message::Quit);
    assert!(model.quit_confirmed);
    model = update(model, Message::MoveCursor(Direction::Left));
    assert!(!model.quit_confirmed);
    model = update(model, Message::Quit);
    assert!(!model.should_quit, "confirmation starts over");
}

// --- Help ---

#[test]
fn test_help_toggle_and_hide() {
    let mut model = short_model();
    model = update(model, Message::ToggleHelp);
    assert!(model.help_visible);
    model = update(model, Message::HideHelp);
    assert!(!model.help_visible);
}

// --- Diagram materialization ---

#[test]
fn test_materialize_without_picker_is_harmless() {
    let source = "```mermaid\ngraph TD; A-->B\n```";
    let mut model = Model::new(PathBuf::from("t.md"), source.to_string(), (100, 30));
    model.refresh_preview();
    model.materialize_diagrams();
    model.materialize_diagrams();
    assert!(model.media_protocols.is_empty());
    // The deferred placeholder stays visible as text.
    assert_eq!(model.document.diagram_media().count(), 1);
}

#[test]
fn test_materialize_renders_valid_diagrams_and_isolates_failures() {
    let source = "```mermaid\ngraph TD; A-->B\n```\n\n```mermaid\nsequenceDiagram\nA->>B: x\n```\n\n```mermaid\ngraph LR; C-->D\n```";
    let mut model = Model::new(PathBuf::from("t.md"), source.to_string(), (100, 30));
    model.picker = Some(ratatui_image::picker::Picker::halfblocks());
    model.refresh_preview();
    model.materialize_diagrams();

    if crate::diagram::engine().is_none() {
        // Degraded mode (no system fonts): everything stays as code.
        assert!(model.media_protocols.is_empty());
        return;
    }

    // Two valid flowcharts render; the unsupported diagram stays as code.
    assert_eq!(model.media_protocols.len(), 2);
    assert!(model.media_protocols.contains_key("mermaid://0"));
    assert!(!model.media_protocols.contains_key("mermaid://1"));
    assert!(model.media_protocols.contains_key("mermaid://2"));
}

#[test]
fn test_unrelated_edit_keeps_diagram_protocols() {
    let source = "# Title\n\n```mermaid\ngraph TD; A-->B\n```\n\ntrailer";
    let mut model = Model::new(PathBuf::from("t.md"), source.to_string(), (100, 30));
    model.picker = Some(ratatui_image::picker::Picker::halfblocks());
    model.refresh_preview();
    model.materialize_diagrams();
    if crate::diagram::engine().is_none() {
        return;
    }
    assert_eq!(model.media_protocols.len(), 1);

    // Edit outside the diagram; the protocol for the unchanged diagram
    // survives the remount.
    model = update(model, Message::InsertChar('x'));
    model.refresh_preview();
    model.materialize_diagrams();
    assert_eq!(model.media_protocols.len(), 1);
}
