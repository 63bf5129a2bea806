use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::Model;

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup = centered_popup_rect(56, 20, area);

    let mut lines = vec![
        help_line("Ctrl+S", "Save"),
        help_line("Ctrl+E", "Export HTML"),
        help_line("Ctrl+Q", "Quit"),
        help_line("F1", "Toggle this help"),
        help_line("F3", "Toggle scroll sync"),
        help_line("F4", "Toggle file watching"),
        help_line("F5", "Reload from disk (discards edits)"),
        help_line("PgUp/PgDn", "Scroll editor pane"),
        help_line("Mouse wheel", "Scroll hovered pane"),
        help_line("Drag divider", "Resize panes"),
        help_line("Drag in preview", "Select lines (copies on release)"),
        Line::raw(""),
    ];
    if let Some(path) = &model.config_global_path {
        lines.push(Line::styled(
            format!(" config: {}", path.display()),
            Style::default().fg(Color::Indexed(245)),
        ));
    }
    if let Some(path) = &model.config_local_path {
        lines.push(Line::styled(
            format!(" local:  {}", path.display()),
            Style::default().fg(Color::Indexed(245)),
        ));
    }

    let block = Block::default()
        .title(" splitmark ")
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn help_line(key: &str, action: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!(" {key:<16}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(action.to_string()),
    ])
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}
