//! Theming and color definitions.
//!
//! This module defines the visual styling for rendered markdown elements.
//! Uses ANSI colors that adapt to the terminal's color palette.

use ratatui::style::{Color, Modifier, Style};

use crate::document::{InlineStyle, LineType};

/// Get the style for a given line type.
///
/// Uses semantic ANSI colors that respect the terminal's theme.
pub fn style_for_line_type(line_type: &LineType) -> Style {
    let light_bg = crate::highlight::is_light_background();
    match line_type {
        // Headings - bold with distinct colors per level
        LineType::Heading(1) => Style::default()
            .fg(if light_bg {
                Color::Indexed(24)
            } else {
                Color::Cyan
            })
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        LineType::Heading(2) => Style::default()
            .fg(if light_bg {
                Color::Indexed(22)
            } else {
                Color::Green
            })
            .add_modifier(Modifier::BOLD),
        LineType::Heading(3) => Style::default()
            .fg(if light_bg {
                Color::Indexed(58)
            } else {
                Color::Yellow
            })
            .add_modifier(Modifier::BOLD),
        LineType::Heading(4) => Style::default()
            .fg(if light_bg {
                Color::Indexed(24)
            } else {
                Color::Blue
            })
            .add_modifier(Modifier::BOLD),
        LineType::Heading(5) => Style::default()
            .fg(if light_bg {
                Color::Indexed(54)
            } else {
                Color::Magenta
            })
            .add_modifier(Modifier::BOLD),
        LineType::Heading(_) => Style::default()
            .fg(if light_bg {
                Color::Indexed(24)
            } else {
                Color::Cyan
            })
            .add_modifier(Modifier::BOLD),

        // Code blocks - use a dimmer color for the frame
        LineType::CodeBlock => Style::default()
            .fg(if light_bg {
                Color::Indexed(238)
            } else {
                Color::Indexed(245)
            })
            .add_modifier(Modifier::DIM),

        // Block quotes - italic blue
        LineType::BlockQuote => Style::default()
            .fg(if light_bg {
                Color::Indexed(24)
            } else {
                Color::Blue
            })
            .add_modifier(Modifier::ITALIC),

        // Horizontal rule - dim
        LineType::HorizontalRule => Style::default()
            .fg(if light_bg {
                Color::Indexed(241)
            } else {
                Color::Indexed(240)
            })
            .add_modifier(Modifier::DIM),

        // Media placeholders - magenta italic until materialized
        LineType::Media => Style::default()
            .fg(if light_bg {
                Color::Indexed(90)
            } else {
                Color::Magenta
            })
            .add_modifier(Modifier::ITALIC),

        // Notices (initializing placeholder) - dim italic
        LineType::Notice => Style::default()
            .fg(Color::Indexed(245))
            .add_modifier(Modifier::ITALIC),

        // Error placeholder - red, impossible to mistake for content
        LineType::Error => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),

        // List items, tables, paragraphs, empty lines - normal style
        LineType::ListItem(_) | LineType::Table | LineType::Paragraph | LineType::Empty => {
            Style::default()
        }
    }
}

/// Get the style for an inline span, merged with a base line style.
pub fn style_for_inline(base: Style, inline: InlineStyle) -> Style {
    let mut style = base;

    if let Some(fg) = inline.fg {
        style = style
            .fg(fg_color_for_terminal(fg))
            .remove_modifier(Modifier::DIM);
    }
    if let Some(bg) = inline.bg {
        style = style.bg(Color::Rgb(bg.r, bg.g, bg.b));
    }

    if inline.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if inline.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    if inline.strikethrough {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    if inline.link {
        style = style.add_modifier(Modifier::UNDERLINED);
        if inline.fg.is_none() {
            let light_bg = crate::highlight::is_light_background();
            style = style.fg(if light_bg {
                Color::Blue
            } else {
                Color::LightBlue
            });
        }
    }
    if inline.code && inline.fg.is_none() {
        let light_bg = crate::highlight::is_light_background();
        style = style
            .fg(if light_bg {
                Color::Indexed(88)
            } else {
                Color::Red
            })
            .add_modifier(Modifier::BOLD);
    }

    style
}

fn fg_color_for_terminal(fg: crate::document::InlineColor) -> Color {
    if crate::media::supports_truecolor_terminal() {
        Color::Rgb(fg.r, fg.g, fg.b)
    } else {
        Color::Indexed(crate::media::rgb_to_xterm_256(fg.r, fg.g, fg.b))
    }
}
