//! Diagram color themes.

use super::config::ThemeVariables;

/// Colors and type metrics used by the SVG renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: String,
    pub node_fill: String,
    pub node_stroke: String,
    pub node_text: String,
    pub line_color: String,
    pub edge_label: String,
    pub font_size: f32,
}

impl Theme {
    /// Default light theme.
    pub fn modern() -> Self {
        Self {
            background: "#ffffff".to_string(),
            node_fill: "#ede7f6".to_string(),
            node_stroke: "#7e57c2".to_string(),
            node_text: "#1a1a2e".to_string(),
            line_color: "#555566".to_string(),
            edge_label: "#333344".to_string(),
            font_size: 15.0,
        }
    }

    /// Dark variant, matched to dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            background: "#1e1e2e".to_string(),
            node_fill: "#313244".to_string(),
            node_stroke: "#b4befe".to_string(),
            node_text: "#cdd6f4".to_string(),
            line_color: "#9399b2".to_string(),
            edge_label: "#bac2de".to_string(),
            font_size: 15.0,
        }
    }

    /// Select a named theme; unknown names fall back to [`Theme::modern`].
    pub fn named(name: &str) -> Self {
        match name {
            "dark" => Self::dark(),
            _ => Self::modern(),
        }
    }

    /// Apply `%%{init}%%` theme variable overrides.
    #[must_use]
    pub fn with_overrides(mut self, vars: &ThemeVariables) -> Self {
        if let Some(color) = &vars.primary_color {
            self.node_fill.clone_from(color);
        }
        if let Some(color) = &vars.primary_text_color {
            self.node_text.clone_from(color);
        }
        if let Some(color) = &vars.primary_border_color {
            self.node_stroke.clone_from(color);
        }
        if let Some(color) = &vars.line_color {
            self.line_color.clone_from(color);
        }
        if let Some(size) = vars.font_size {
            self.font_size = size.clamp(6.0, 64.0);
        }
        self
    }
}
