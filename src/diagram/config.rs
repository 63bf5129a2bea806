//! `%%{init: ...}%%` directive parsing.
//!
//! Mermaid sources may open with an init directive carrying theme
//! configuration in relaxed JSON. The directive is stripped before the
//! flowchart parser runs; an unreadable directive is ignored rather than
//! failing the diagram.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

/// Parsed contents of an init directive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitDirective {
    pub theme: Option<String>,
    pub theme_variables: ThemeVariables,
}

/// Theme variable overrides, mermaid-style camelCase keys.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeVariables {
    pub primary_color: Option<String>,
    pub primary_text_color: Option<String>,
    pub primary_border_color: Option<String>,
    pub line_color: Option<String>,
    pub font_size: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct DirectiveEnvelope {
    init: InitDirective,
}

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)%%\{(.*?)\}%%").expect("directive regex"))
}

/// Split an init directive off the diagram source.
///
/// Returns the parsed directive (when present and readable) and the
/// source with the directive removed.
pub fn extract_directive(source: &str) -> (Option<InitDirective>, String) {
    let regex = directive_regex();
    let Some(captures) = regex.captures(source) else {
        return (None, source.to_string());
    };

    let body = captures.get(1).map_or("", |m| m.as_str());
    let stripped = regex.replace(source, "").to_string();

    // The body is `init: {...}`; wrap it back into an object so json5
    // (which tolerates unquoted keys) can read it.
    let directive = json5::from_str::<DirectiveEnvelope>(&format!("{{{body}}}"))
        .map(|envelope| envelope.init)
        .map_err(|err| {
            tracing::debug!(%err, "ignoring unreadable init directive");
            err
        })
        .ok();

    (directive, stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_directive_passes_through() {
        let (directive, rest) = extract_directive("graph TD; A-->B");
        assert!(directive.is_none());
        assert_eq!(rest, "graph TD; A-->B");
    }

    #[test]
    fn test_theme_directive_is_parsed_and_stripped() {
        let source = "%%{init: {\"theme\": \"dark\"}}%%\ngraph TD; A-->B";
        let (directive, rest) = extract_directive(source);
        assert_eq!(directive.unwrap().theme.as_deref(), Some("dark"));
        assert!(!rest.contains("init"));
        assert!(rest.contains("graph TD"));
    }

    #[test]
    fn test_json5_unquoted_keys_accepted() {
        let source = "%%{init: {theme: 'dark', themeVariables: {primaryColor: '#ff0000'}}}%%\ngraph TD; A-->B";
        let (directive, _) = extract_directive(source);
        let directive = directive.unwrap();
        assert_eq!(directive.theme.as_deref(), Some("dark"));
        assert_eq!(
            directive.theme_variables.primary_color.as_deref(),
            Some("#ff0000")
        );
    }

    #[test]
    fn test_unreadable_directive_is_ignored() {
        let source = "%%{init: not json at all}%%\ngraph TD; A-->B";
        let (directive, rest) = extract_directive(source);
        assert!(directive.is_none());
        assert!(rest.contains("graph TD"));
    }
}
