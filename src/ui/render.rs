use ratatui::layout::Position;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::Model;
use crate::document::LineType;

use super::{PREVIEW_LEFT_PADDING, media, overlays, status};

/// Render the complete UI: editor pane, divider, preview pane, status bar
/// and overlays.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();
    let main = model.main_area();
    let areas = model.pane_areas();

    render_editor(model, frame, areas.editor);
    render_divider(model, frame, areas.divider);
    render_preview(model, frame, areas.preview);

    // Status bar on the bottom row; an active toast replaces it.
    let status_area = Rect::new(0, main.height, area.width, area.height.saturating_sub(main.height));
    if model.active_toast().is_some() {
        status::render_toast_bar(model, frame, status_area);
    } else {
        status::render_status_bar(model, frame, status_area);
    }

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let cursor = model.buffer.cursor();
    let mut lines: Vec<Line> = Vec::new();
    for row in 0..area.height {
        let line_idx = model.editor_scroll + usize::from(row);
        let Some(text) = model.buffer.line_at(line_idx) else {
            lines.push(Line::raw("~").style(Style::default().fg(Color::Indexed(240))));
            continue;
        };
        let visible: String = text.chars().take(area.width as usize).collect();
        lines.push(Line::raw(visible));
    }

    frame.render_widget(Paragraph::new(lines), area);

    // Hardware cursor at the buffer cursor when it is on screen.
    if cursor.line >= model.editor_scroll {
        let row = cursor.line - model.editor_scroll;
        if row < area.height as usize {
            let col_chars = model
                .buffer
                .line_at(cursor.line)
                .map_or(0, |line| line[..cursor.col.min(line.len())].chars().count());
            #[allow(clippy::cast_possible_truncation)]
            let col = (col_chars as u16).min(area.width.saturating_sub(1));
            frame.set_cursor_position(Position::new(area.x + col, area.y + row as u16));
        }
    }
}

fn render_divider(model: &Model, frame: &mut Frame, area: Rect) {
    if area.width == 0 {
        return;
    }
    let style = if model.split.is_dragging() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Indexed(240))
    };
    let bar: Vec<Line> = (0..area.height).map(|_| Line::styled("│", style)).collect();
    frame.render_widget(Paragraph::new(bar), area);
}

fn render_preview(model: &mut Model, frame: &mut Frame, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let selection = model.selection_range();
    let offset = model.viewport.offset();
    let visible = model
        .document
        .visible_lines(offset, area.height as usize);

    let mut lines: Vec<Line> = Vec::new();
    for (row, rendered) in visible.iter().enumerate() {
        let line_idx = offset + row;
        let base = super::style::style_for_line_type(rendered.line_type());
        let mut line = rendered.spans().map_or_else(
            || Line::styled(rendered.content().to_string(), base),
            |spans| {
                Line::from(
                    spans
                        .iter()
                        .map(|span| {
                            Span::styled(
                                span.text().to_string(),
                                super::style::style_for_inline(base, span.style()),
                            )
                        })
                        .collect::<Vec<_>>(),
                )
            },
        );
        // Media rows draw over the text later; skip placeholder text when
        // a protocol exists for them.
        if *rendered.line_type() == LineType::Media
            && media_line_has_protocol(model, line_idx)
        {
            line = Line::raw("");
        }
        if selection
            .as_ref()
            .is_some_and(|range| range.contains(&line_idx))
        {
            line = line.style(Style::default().add_modifier(Modifier::REVERSED));
        }
        lines.push(line);
    }

    let content_area = Rect::new(
        area.x + PREVIEW_LEFT_PADDING.min(area.width),
        area.y,
        area.width.saturating_sub(PREVIEW_LEFT_PADDING),
        area.height,
    );
    frame.render_widget(Paragraph::new(lines), content_area);

    media::render_media(model, frame, content_area);
}

fn media_line_has_protocol(model: &Model, line_idx: usize) -> bool {
    model.document.media().iter().any(|media| {
        media.line_range.contains(&line_idx) && model.media_protocols.contains_key(&media.src)
    })
}
