//! SVG emission for laid-out flowcharts.

use std::fmt::Write as _;

use super::flow::{FlowGraph, NodeShape};
use super::layout::DiagramLayout;
use super::theme::Theme;

/// Corner radius for rounded nodes.
const ROUND_RX: f32 = 10.0;
/// Arrowhead marker size in px.
const ARROW_SIZE: f32 = 8.0;

/// Render a laid-out graph to an SVG document string.
pub fn render_svg(
    graph: &FlowGraph,
    layout: &DiagramLayout,
    theme: &Theme,
    font_family: &str,
) -> String {
    let mut svg = String::with_capacity(2048);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w:.1} {h:.1}" width="{w:.1}" height="{h:.1}" font-family="{font}" font-size="{size}">"#,
        w = layout.width,
        h = layout.height,
        font = escape_xml(font_family),
        size = theme.font_size,
    );

    let _ = write!(
        svg,
        r#"<defs><marker id="arrow" viewBox="0 0 {a} {a}" refX="{a}" refY="{half}" markerWidth="{a}" markerHeight="{a}" orient="auto-start-reverse"><path d="M0,0 L{a},{half} L0,{a} z" fill="{color}"/></marker></defs>"#,
        a = ARROW_SIZE,
        half = ARROW_SIZE / 2.0,
        color = theme.line_color,
    );

    let _ = write!(
        svg,
        r#"<rect x="0" y="0" width="{w:.1}" height="{h:.1}" fill="{bg}"/>"#,
        w = layout.width,
        h = layout.height,
        bg = theme.background,
    );

    for edge in &layout.edges {
        let dash = if edge.dotted {
            r#" stroke-dasharray="5,4""#
        } else {
            ""
        };
        let marker = if edge.arrow {
            r#" marker-end="url(#arrow)""#
        } else {
            ""
        };
        let _ = write!(
            svg,
            r#"<path d="M{x1:.1},{y1:.1} L{x2:.1},{y2:.1}" stroke="{color}" stroke-width="1.5" fill="none"{dash}{marker}/>"#,
            x1 = edge.from.0,
            y1 = edge.from.1,
            x2 = edge.to.0,
            y2 = edge.to.1,
            color = theme.line_color,
        );

        if let Some(label) = &edge.label {
            // Knock the line out behind the label with a background chip.
            let chip_w = label.chars().count() as f32 * theme.font_size * 0.62 + 8.0;
            let chip_h = theme.font_size + 6.0;
            let _ = write!(
                svg,
                r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{bg}"/>"#,
                x = edge.label_at.0 - chip_w / 2.0,
                y = edge.label_at.1 - chip_h / 2.0,
                w = chip_w,
                h = chip_h,
                bg = theme.background,
            );
            let _ = write!(
                svg,
                r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" dominant-baseline="central" fill="{color}">{label}</text>"#,
                x = edge.label_at.0,
                y = edge.label_at.1,
                color = theme.edge_label,
                label = escape_xml(label),
            );
        }
    }

    for placed in &layout.nodes {
        let node = &graph.nodes[placed.node];
        let (cx, cy) = placed.center();
        match node.shape {
            NodeShape::Rect => {
                let _ = write!(
                    svg,
                    r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{fill}" stroke="{stroke}" stroke-width="1.5"/>"#,
                    x = placed.x,
                    y = placed.y,
                    w = placed.width,
                    h = placed.height,
                    fill = theme.node_fill,
                    stroke = theme.node_stroke,
                );
            }
            NodeShape::Rounded => {
                let _ = write!(
                    svg,
                    r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" rx="{rx}" fill="{fill}" stroke="{stroke}" stroke-width="1.5"/>"#,
                    x = placed.x,
                    y = placed.y,
                    w = placed.width,
                    h = placed.height,
                    rx = ROUND_RX,
                    fill = theme.node_fill,
                    stroke = theme.node_stroke,
                );
            }
            NodeShape::Diamond => {
                let _ = write!(
                    svg,
                    r#"<polygon points="{cx:.1},{top:.1} {right:.1},{cy:.1} {cx:.1},{bottom:.1} {left:.1},{cy:.1}" fill="{fill}" stroke="{stroke}" stroke-width="1.5"/>"#,
                    top = placed.y,
                    right = placed.x + placed.width,
                    bottom = placed.y + placed.height,
                    left = placed.x,
                    fill = theme.node_fill,
                    stroke = theme.node_stroke,
                );
            }
            NodeShape::Circle => {
                let _ = write!(
                    svg,
                    r#"<ellipse cx="{cx:.1}" cy="{cy:.1}" rx="{rx:.1}" ry="{ry:.1}" fill="{fill}" stroke="{stroke}" stroke-width="1.5"/>"#,
                    rx = placed.width / 2.0,
                    ry = placed.height / 2.0,
                    fill = theme.node_fill,
                    stroke = theme.node_stroke,
                );
            }
        }

        let _ = write!(
            svg,
            r#"<text x="{cx:.1}" y="{cy:.1}" text-anchor="middle" dominant-baseline="central" fill="{color}">{label}</text>"#,
            color = theme.node_text,
            label = escape_xml(&node.label),
        );
    }

    svg.push_str("</svg>");
    svg
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::flow::parse_flowchart;
    use crate::diagram::layout::compute_layout;
    use crate::diagram::text_metrics::TextMeasurer;

    fn render(source: &str) -> Option<String> {
        let measurer = TextMeasurer::from_system_fonts().ok()?;
        let graph = parse_flowchart(source).unwrap();
        let theme = Theme::modern();
        let layout = compute_layout(&graph, &measurer, &theme);
        Some(render_svg(&graph, &layout, &theme, measurer.family()))
    }

    #[test]
    fn test_svg_is_well_formed_shell() {
        let Some(svg) = render("graph TD; A-->B") else {
            return;
        };
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.matches("<rect").count() >= 2); // background + nodes
    }

    #[test]
    fn test_labels_are_escaped() {
        let Some(svg) = render("graph TD; A[a < b & c] --> B") else {
            return;
        };
        assert!(svg.contains("a &lt; b &amp; c"));
        assert!(!svg.contains("a < b & c<"));
    }

    #[test]
    fn test_arrow_marker_only_on_arrows() {
        let Some(svg) = render("graph TD; A --- B") else {
            return;
        };
        assert!(!svg.contains("marker-end"));

        let Some(svg) = render("graph TD; A --> B") else {
            return;
        };
        assert!(svg.contains("marker-end"));
    }

    #[test]
    fn test_dotted_edge_has_dasharray() {
        let Some(svg) = render("graph TD; A -.-> B") else {
            return;
        };
        assert!(svg.contains("stroke-dasharray"));
    }

    #[test]
    fn test_escape_xml_covers_all_specials() {
        assert_eq!(escape_xml(r#"<&>"'"#), "&lt;&amp;&gt;&quot;&apos;");
    }
}
