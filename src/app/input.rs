use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::app::{App, Message, Model};
use crate::editor::Direction;

use super::event_loop::ResizeDebouncer;

/// Wheel scroll step in lines.
const WHEEL_STEP: usize = 3;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(key, model),
            Event::Mouse(mouse) => Self::handle_mouse(mouse, model),
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    fn handle_key(key: &KeyEvent, model: &Model) -> Option<Message> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        if model.help_visible {
            return match key.code {
                KeyCode::F(1) => Some(Message::ToggleHelp),
                _ => Some(Message::HideHelp),
            };
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('s') => Some(Message::Save),
                KeyCode::Char('q') => Some(Message::Quit),
                KeyCode::Char('e') => Some(Message::ExportHtml),
                KeyCode::Left => Some(Message::MoveWordLeft),
                KeyCode::Right => Some(Message::MoveWordRight),
                KeyCode::Home => Some(Message::MoveToStart),
                KeyCode::End => Some(Message::MoveToEnd),
                _ => None,
            };
        }

        match key.code {
            KeyCode::F(1) => Some(Message::ToggleHelp),
            KeyCode::F(3) => Some(Message::ToggleSync),
            KeyCode::F(4) => Some(Message::ToggleWatch),
            KeyCode::F(5) => Some(Message::ForceReload),
            KeyCode::Enter => Some(Message::InsertNewline),
            KeyCode::Tab => Some(Message::InsertTab),
            KeyCode::Backspace => Some(Message::Backspace),
            KeyCode::Delete => Some(Message::DeleteForward),
            KeyCode::Left => Some(Message::MoveCursor(Direction::Left)),
            KeyCode::Right => Some(Message::MoveCursor(Direction::Right)),
            KeyCode::Up => Some(Message::MoveCursor(Direction::Up)),
            KeyCode::Down => Some(Message::MoveCursor(Direction::Down)),
            KeyCode::Home => Some(Message::MoveHome),
            KeyCode::End => Some(Message::MoveEnd),
            KeyCode::PageUp => Some(Message::EditorPageUp),
            KeyCode::PageDown => Some(Message::EditorPageDown),
            KeyCode::Esc => Some(Message::ClearSelection),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::ALT) => {
                Some(Message::InsertChar(ch))
            }
            _ => None,
        }
    }

    fn handle_mouse(mouse: &MouseEvent, model: &Model) -> Option<Message> {
        if model.help_visible {
            if matches!(mouse.kind, MouseEventKind::Up(MouseButton::Left)) {
                return Some(Message::HideHelp);
            }
            return None;
        }

        let areas = model.pane_areas();
        let main = model.main_area();
        let in_editor = point_in_rect(mouse.column, mouse.row, areas.editor);
        let in_preview = point_in_rect(mouse.column, mouse.row, areas.preview);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if model.split.hit_divider(mouse.column, main) {
                    return Some(Message::DividerGrab);
                }
                if in_editor {
                    let line = model.editor_scroll + usize::from(mouse.row - areas.editor.y);
                    let col = usize::from(mouse.column.saturating_sub(areas.editor.x));
                    return Some(Message::EditorClick(line, col));
                }
                if in_preview {
                    return preview_line_at(model, areas.preview, mouse.row)
                        .map(Message::StartSelection);
                }
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if model.split.is_dragging() {
                    return Some(Message::DividerDrag(mouse.column));
                }
                if model.selection.is_some() {
                    return preview_line_at(model, areas.preview, mouse.row)
                        .map(Message::UpdateSelection);
                }
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                // Pointer-up anywhere ends a divider drag.
                if model.split.is_dragging() {
                    return Some(Message::DividerRelease);
                }
                if model.selection.is_some() {
                    return match preview_line_at(model, areas.preview, mouse.row) {
                        Some(line) => Some(Message::EndSelection(line)),
                        None => Some(Message::ClearSelection),
                    };
                }
                None
            }
            MouseEventKind::ScrollUp => {
                if in_preview {
                    Some(Message::PreviewScrollUp(WHEEL_STEP))
                } else if in_editor {
                    Some(Message::EditorScrollUp(WHEEL_STEP))
                } else {
                    None
                }
            }
            MouseEventKind::ScrollDown => {
                if in_preview {
                    Some(Message::PreviewScrollDown(WHEEL_STEP))
                } else if in_editor {
                    Some(Message::EditorScrollDown(WHEEL_STEP))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

fn point_in_rect(col: u16, row: u16, rect: Rect) -> bool {
    col >= rect.x && col < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

/// Map a mouse row inside the preview pane to a rendered line index.
fn preview_line_at(model: &Model, preview: Rect, row: u16) -> Option<usize> {
    if row < preview.y || row >= preview.y + preview.height {
        return None;
    }
    let line = model.viewport.offset() + usize::from(row - preview.y);
    if line < model.document.line_count() {
        Some(line)
    } else {
        None
    }
}
