//! Syntax highlighting for code blocks.
//!
//! Uses syntect for highlighting with Sublime Text syntax definitions.
//! The syntax set and theme load lazily exactly once per process; the
//! render pipeline forces that load through [`ensure_loaded`] before the
//! first parse so no render runs against a partially configured
//! highlighter.

use std::sync::{Mutex, OnceLock};

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

use crate::document::{InlineColor, InlineSpan, InlineStyle};

/// Force the one-time syntax set and theme registration.
///
/// Idempotent and process-wide; `OnceLock` blocks concurrent callers until
/// the first initialization completes.
pub fn ensure_loaded() {
    let _ = syntax_set();
    let _ = theme();
}

/// Highlight one fenced code block into styled span lines.
///
/// Lookup is best-effort: an unknown or missing language tag renders the
/// block as plain code. A colorization failure inside syntect falls back
/// to the unhighlighted text for this block only, so one bad block never
/// aborts the render.
pub fn highlight_block(language: Option<&str>, code: &str) -> Vec<Vec<InlineSpan>> {
    let syntax_set = syntax_set();
    let mode = background_mode();
    let syntax = language
        .and_then(|lang| syntax_set.find_syntax_by_token(lang))
        .or_else(|| language.and_then(|lang| syntax_set.find_syntax_by_name(lang)));

    let Some(syntax) = syntax else {
        return plain_block(code);
    };

    let mut highlighter = HighlightLines::new(syntax, theme());
    let mut lines = Vec::new();
    for line in code.lines() {
        let ranges = match highlighter.highlight_line(line, syntax_set) {
            Ok(ranges) => ranges,
            Err(err) => {
                tracing::debug!(
                    language = language.unwrap_or("<none>"),
                    %err,
                    "highlight failed, falling back to plain text for block"
                );
                return plain_block(code);
            }
        };
        let mut spans = Vec::new();
        for (style, text) in ranges {
            let mut inline_style = InlineStyle::default();
            inline_style.code = true;
            let fg = InlineColor {
                r: style.foreground.r,
                g: style.foreground.g,
                b: style.foreground.b,
            };
            inline_style.fg = Some(adjust_fg_for_background(fg, mode));
            spans.push(InlineSpan::new(text.to_string(), inline_style));
        }
        lines.push(spans);
    }

    lines
}

fn plain_block(code: &str) -> Vec<Vec<InlineSpan>> {
    code.lines()
        .map(|line| {
            let mut style = InlineStyle::default();
            style.code = true;
            vec![InlineSpan::new(line.to_string(), style)]
        })
        .collect()
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme.load_defaults");
        let theme_set = ThemeSet::load_defaults();
        let mode = background_mode();
        let preferred = match mode {
            BackgroundMode::Dark => [
                "Monokai Extended",
                "Monokai Extended Bright",
                "Dracula",
                "Solarized (dark)",
                "base16-ocean.dark",
            ]
            .as_slice(),
            BackgroundMode::Light => [
                "InspiredGitHub",
                "Solarized (light)",
                "base16-ocean.light",
            ]
            .as_slice(),
        };

        for name in preferred {
            if let Some(theme) = theme_set.themes.get(*name) {
                return theme.clone();
            }
        }

        theme_set
            .themes
            .values()
            .next()
            .cloned()
            .unwrap_or_default()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundMode {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightBackground {
    Light,
    Dark,
}

static BACKGROUND_OVERRIDE: OnceLock<Mutex<Option<HighlightBackground>>> = OnceLock::new();

pub fn set_background_mode(mode: Option<HighlightBackground>) {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    let mut guard = lock.lock().expect("highlight background lock");
    *guard = mode;
}

pub fn is_light_background() -> bool {
    background_mode() == BackgroundMode::Light
}

fn background_mode() -> BackgroundMode {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    if let Ok(guard) = lock.lock() {
        if let Some(mode) = *guard {
            return match mode {
                HighlightBackground::Light => BackgroundMode::Light,
                HighlightBackground::Dark => BackgroundMode::Dark,
            };
        }
    }
    background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let Some(value) = colorfgbg else {
        return BackgroundMode::Dark;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    let Ok(bg) = bg_str.parse::<u8>() else {
        return BackgroundMode::Dark;
    };

    if bg >= 7 {
        BackgroundMode::Light
    } else {
        BackgroundMode::Dark
    }
}

fn adjust_fg_for_background(color: InlineColor, mode: BackgroundMode) -> InlineColor {
    match mode {
        BackgroundMode::Dark => color,
        BackgroundMode::Light => {
            let luma = (0.2126 * color.r as f32)
                + (0.7152 * color.g as f32)
                + (0.0722 * color.b as f32);
            if luma < 155.0 {
                return color;
            }

            InlineColor {
                r: ((color.r as f32) * 0.42).round() as u8,
                g: ((color.g as f32) * 0.42).round() as u8,
                b: ((color.b as f32) * 0.42).round() as u8,
            }
        }
    }
}
