use crate::app::Model;
use crate::app::model::{LineSelection, SelectionState, ToastLevel};
use crate::editor::Direction;

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editing (left pane)
    /// Insert a character at the cursor
    InsertChar(char),
    /// Split the line at the cursor (Enter)
    InsertNewline,
    /// Insert indentation (Tab)
    InsertTab,
    /// Delete character before cursor (Backspace)
    Backspace,
    /// Delete character at cursor (Delete)
    DeleteForward,
    /// Move cursor in a direction
    MoveCursor(Direction),
    /// Move cursor to beginning of line (Home)
    MoveHome,
    /// Move cursor to end of line (End)
    MoveEnd,
    /// Move cursor one word left (Ctrl+Left)
    MoveWordLeft,
    /// Move cursor one word right (Ctrl+Right)
    MoveWordRight,
    /// Move cursor to start of buffer (Ctrl+Home)
    MoveToStart,
    /// Move cursor to end of buffer (Ctrl+End)
    MoveToEnd,
    /// Move cursor to an absolute position (mouse click)
    EditorClick(usize, usize),
    /// Scroll the editor pane up by n lines
    EditorScrollUp(usize),
    /// Scroll the editor pane down by n lines
    EditorScrollDown(usize),
    /// Scroll the editor pane up one page
    EditorPageUp,
    /// Scroll the editor pane down one page
    EditorPageDown,

    // Preview (right pane)
    /// Scroll the preview up by n lines
    PreviewScrollUp(usize),
    /// Scroll the preview down by n lines
    PreviewScrollDown(usize),
    /// Start a preview line selection (mouse down)
    StartSelection(usize),
    /// Update a preview line selection (mouse drag)
    UpdateSelection(usize),
    /// Finish a preview line selection (mouse up)
    EndSelection(usize),
    /// Clear current selection
    ClearSelection,

    // Divider
    /// Mouse-down on the divider
    DividerGrab,
    /// Mouse-drag to a pointer column while dragging
    DividerDrag(u16),
    /// Mouse-up anywhere ends the drag
    DividerRelease,

    // File
    /// Save the buffer to disk (side effect)
    Save,
    /// File changed externally
    FileChanged,
    /// Force reload from disk, discarding buffer changes
    ForceReload,
    /// Toggle file watching
    ToggleWatch,
    /// Export the source to a standalone HTML file (side effect)
    ExportHtml,

    // UI
    /// Toggle scroll synchronization
    ToggleSync,
    /// Toggle help overlay
    ToggleHelp,
    /// Hide help overlay
    HideHelp,
    /// Terminal resized
    Resize(u16, u16),

    // Application
    /// Quit the application
    Quit,
}

/// Pure function that updates the model based on a message.
///
/// This is the core of TEA - all state transitions happen here.
/// File IO and clipboard side effects live in `effects`.
pub fn update(mut model: Model, msg: Message) -> Model {
    // A pending quit confirmation survives only an immediate repeat.
    if !matches!(msg, Message::Quit | Message::Save) {
        model.quit_confirmed = false;
    }

    match msg {
        // Editing
        Message::InsertChar(ch) => {
            model.buffer.insert_char(ch);
            after_edit(&mut model);
        }
        Message::InsertNewline => {
            model.buffer.insert_newline();
            after_edit(&mut model);
        }
        Message::InsertTab => {
            model.buffer.insert_tab();
            after_edit(&mut model);
        }
        Message::Backspace => {
            if model.buffer.backspace() {
                after_edit(&mut model);
            }
        }
        Message::DeleteForward => {
            if model.buffer.delete_forward() {
                after_edit(&mut model);
            }
        }
        Message::MoveCursor(dir) => {
            model.buffer.move_cursor(dir);
            model.ensure_cursor_visible();
        }
        Message::MoveHome => {
            model.buffer.move_home();
            model.ensure_cursor_visible();
        }
        Message::MoveEnd => {
            model.buffer.move_end();
            model.ensure_cursor_visible();
        }
        Message::MoveWordLeft => {
            model.buffer.move_word_left();
            model.ensure_cursor_visible();
        }
        Message::MoveWordRight => {
            model.buffer.move_word_right();
            model.ensure_cursor_visible();
        }
        Message::MoveToStart => {
            model.buffer.move_to_start();
            model.ensure_cursor_visible();
        }
        Message::MoveToEnd => {
            model.buffer.move_to_end();
            model.ensure_cursor_visible();
        }
        Message::EditorClick(line, col) => {
            model.buffer.move_to(line, col);
            model.ensure_cursor_visible();
        }
        Message::EditorScrollUp(n) => {
            let before = model.editor_scroll;
            model.editor_scroll = model.editor_scroll.saturating_sub(n);
            if model.editor_scroll != before {
                model.sync_from_editor();
            }
        }
        Message::EditorScrollDown(n) => {
            let before = model.editor_scroll;
            model.editor_scroll = (model.editor_scroll + n).min(model.editor_scroll_max());
            if model.editor_scroll != before {
                model.sync_from_editor();
            }
        }
        Message::EditorPageUp => {
            let page = model.editor_view_height() as usize;
            return update(model, Message::EditorScrollUp(page));
        }
        Message::EditorPageDown => {
            let page = model.editor_view_height() as usize;
            return update(model, Message::EditorScrollDown(page));
        }

        // Preview
        Message::PreviewScrollUp(n) => {
            let before = model.viewport.offset();
            model.viewport.scroll_up(n);
            if model.viewport.offset() != before {
                model.sync_from_preview();
            }
        }
        Message::PreviewScrollDown(n) => {
            let before = model.viewport.offset();
            model.viewport.scroll_down(n);
            if model.viewport.offset() != before {
                model.sync_from_preview();
            }
        }
        Message::StartSelection(line) => {
            // Text selection is suppressed during a divider drag.
            if !model.split.is_dragging() {
                model.selection = Some(LineSelection {
                    anchor: line,
                    active: line,
                    state: SelectionState::Pending,
                });
            }
        }
        Message::UpdateSelection(line) => {
            if model.split.is_dragging() {
                model.clear_selection();
            } else if let Some(selection) = model.selection {
                model.selection = Some(LineSelection {
                    anchor: selection.anchor,
                    active: line,
                    state: SelectionState::Dragging,
                });
            }
        }
        Message::EndSelection(line) => {
            if let Some(selection) = model.selection {
                model.selection = Some(LineSelection {
                    anchor: selection.anchor,
                    active: line,
                    state: SelectionState::Finalized,
                });
            }
        }
        Message::ClearSelection => {
            model.clear_selection();
        }

        // Divider
        Message::DividerGrab => {
            model.split.begin_drag();
            model.clear_selection();
        }
        Message::DividerDrag(column) => {
            let area = model.main_area();
            model.split.drag_to(column, area);
            model.apply_frame_size();
        }
        Message::DividerRelease => {
            model.split.end_drag();
            model.apply_frame_size();
        }

        // File / side-effect messages: state handled in effects
        Message::Save | Message::FileChanged | Message::ForceReload | Message::ExportHtml => {}
        Message::ToggleWatch => {
            model.watch_enabled = !model.watch_enabled;
        }

        // UI
        Message::ToggleSync => {
            let enabled = !model.sync.is_enabled();
            model.sync.set_enabled(enabled);
            model.show_toast(
                ToastLevel::Info,
                if enabled {
                    "Scroll sync on"
                } else {
                    "Scroll sync off"
                },
            );
        }
        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
        }
        Message::HideHelp => {
            model.help_visible = false;
        }
        Message::Resize(width, height) => {
            model.set_frame_size(width, height);
        }

        // Application
        Message::Quit => {
            if model.buffer.is_dirty() && !model.quit_confirmed {
                model.show_toast(
                    ToastLevel::Warning,
                    "Unsaved changes! Press Ctrl+Q again to quit, or Ctrl+S to save",
                );
                model.quit_confirmed = true;
            } else {
                model.should_quit = true;
            }
        }
    }
    model
}

/// Shared tail of every buffer mutation: notify the store and keep the
/// cursor on screen.
fn after_edit(model: &mut Model) {
    model.flush_buffer_to_store();
    model.ensure_cursor_visible();
}
