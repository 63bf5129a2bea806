use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::Model;

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let filename = model
        .file_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "untitled".to_string());
    let dirty_marker = if model.buffer.is_dirty() { "*" } else { "" };

    let cursor = model.buffer.cursor();
    let cursor_info = format!("Ln {}, Col {}", cursor.line + 1, cursor.col + 1);

    let sync_indicator = if model.sync.is_enabled() {
        " [sync]"
    } else {
        ""
    };
    let watch_indicator = if model.watch_enabled {
        " [watching]"
    } else {
        ""
    };
    let conflict_indicator = if model.disk_conflict {
        " [disk changed]"
    } else {
        ""
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let split_percent = model.split.percent().round() as u16;
    let status = format!(
        " {}{}  {}  [{}%|{}%]{}{}{}  F1:help",
        filename,
        dirty_marker,
        cursor_info,
        split_percent,
        model.viewport.scroll_percent(),
        sync_indicator,
        watch_indicator,
        conflict_indicator,
    );

    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        crate::app::ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        crate::app::ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        crate::app::ToastLevel::Error => {
            ("[error]", Style::default().bg(Color::Red).fg(Color::White))
        }
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
