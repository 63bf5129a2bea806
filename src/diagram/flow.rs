//! Flowchart parsing.
//!
//! Supports the `graph`/`flowchart` subset of mermaid: directed edges with
//! optional labels, node shape brackets, and `%%` comments. Anything that
//! declares another diagram type fails with [`DiagramError::Unsupported`]
//! so the block stays visible as code.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::DiagramError;

/// Flow direction of the whole graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    TopDown,
    LeftRight,
}

/// Node shape, from the bracket style used at declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    /// `A[label]`
    Rect,
    /// `A(label)`
    Rounded,
    /// `A{label}`
    Diamond,
    /// `A((label))`
    Circle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNode {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    /// Index into [`FlowGraph::nodes`].
    pub from: usize,
    /// Index into [`FlowGraph::nodes`].
    pub to: usize,
    pub label: Option<String>,
    pub dotted: bool,
    pub arrow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowGraph {
    pub direction: FlowDirection,
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

/// Statement keywords we tolerate but do not render.
const IGNORED_KEYWORDS: &[&str] = &[
    "subgraph",
    "end",
    "style",
    "classDef",
    "class",
    "linkStyle",
    "click",
];

fn arrow_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s*(-\.->|-\.-|==>|-->|---)\s*").expect("arrow regex")
    })
}

fn node_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z][A-Za-z0-9_]*)(?:(\(\(|\[|\(|\{)(.*?)(\)\)|\]|\)|\}))?$")
            .expect("node regex")
    })
}

/// Parse flowchart source into a graph.
///
/// # Errors
///
/// Returns [`DiagramError::Unsupported`] for non-flowchart diagram types
/// and [`DiagramError::Parse`] for statements that cannot be read.
pub fn parse_flowchart(source: &str) -> Result<FlowGraph, DiagramError> {
    let mut statements: Vec<&str> = Vec::new();
    for line in source.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("%%") {
            continue;
        }
        statements.extend(line.split(';').map(str::trim).filter(|s| !s.is_empty()));
    }

    let Some(header) = statements.first() else {
        return Err(DiagramError::Empty);
    };

    let mut header_tokens = header.split_whitespace();
    let keyword = header_tokens.next().unwrap_or_default();
    if keyword != "graph" && keyword != "flowchart" {
        return Err(DiagramError::Unsupported(keyword.to_string()));
    }
    let direction = match header_tokens.next() {
        None | Some("TD" | "TB") => FlowDirection::TopDown,
        Some("LR" | "RL") => FlowDirection::LeftRight,
        Some(other) => return Err(DiagramError::Parse(format!("unknown direction `{other}`"))),
    };

    let mut graph = GraphBuilder::default();
    for statement in &statements[1..] {
        let first_word = statement.split_whitespace().next().unwrap_or_default();
        if IGNORED_KEYWORDS.contains(&first_word) {
            continue;
        }
        graph.add_statement(statement)?;
    }

    if graph.nodes.is_empty() {
        return Err(DiagramError::NoNodes);
    }

    Ok(FlowGraph {
        direction,
        nodes: graph.nodes,
        edges: graph.edges,
    })
}

#[derive(Default)]
struct GraphBuilder {
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
    index: HashMap<String, usize>,
}

impl GraphBuilder {
    /// Parse one statement: either a lone node declaration or a chain of
    /// links (`A -->|label| B --> C`).
    fn add_statement(&mut self, statement: &str) -> Result<(), DiagramError> {
        let arrows: Vec<_> = arrow_regex().find_iter(statement).collect();
        if arrows.is_empty() {
            self.intern_node(statement.trim())?;
            return Ok(());
        }

        // Segments between arrow tokens; each may carry a leading |label|
        // that belongs to the arrow preceding it.
        let mut prev_idx: Option<usize> = None;
        let mut prev_arrow: Option<&str> = None;
        let mut cursor = 0usize;

        for arrow in &arrows {
            let segment = &statement[cursor..arrow.start()];
            self.link_segment(segment, &mut prev_idx, prev_arrow)?;
            prev_arrow = Some(arrow.as_str().trim());
            cursor = arrow.end();
        }
        self.link_segment(&statement[cursor..], &mut prev_idx, prev_arrow)?;

        Ok(())
    }

    /// Intern one chain segment and connect it to the previous node using
    /// the arrow token that sat between them.
    fn link_segment(
        &mut self,
        segment: &str,
        prev_idx: &mut Option<usize>,
        prev_arrow: Option<&str>,
    ) -> Result<(), DiagramError> {
        let (label, node_text) = split_edge_label(segment);
        if prev_idx.is_none() && label.is_some() {
            return Err(DiagramError::Parse(format!(
                "edge label before first node in `{segment}`"
            )));
        }
        let node_idx = self.intern_node(node_text.trim())?;
        if let (Some(from), Some(token)) = (*prev_idx, prev_arrow) {
            self.edges.push(FlowEdge {
                from,
                to: node_idx,
                label,
                dotted: token.starts_with("-."),
                arrow: token.ends_with('>'),
            });
        }
        *prev_idx = Some(node_idx);
        Ok(())
    }

    fn intern_node(&mut self, text: &str) -> Result<usize, DiagramError> {
        let captures = node_regex()
            .captures(text)
            .ok_or_else(|| DiagramError::Parse(format!("invalid node `{text}`")))?;
        let id = captures[1].to_string();

        let (shape, label) = match (captures.get(2), captures.get(3), captures.get(4)) {
            (Some(open), Some(label), Some(close)) => {
                let shape = match (open.as_str(), close.as_str()) {
                    ("((", "))") => NodeShape::Circle,
                    ("[", "]") => NodeShape::Rect,
                    ("(", ")") => NodeShape::Rounded,
                    ("{", "}") => NodeShape::Diamond,
                    _ => {
                        return Err(DiagramError::Parse(format!(
                            "mismatched brackets in `{text}`"
                        )));
                    }
                };
                (Some(shape), Some(label.as_str().trim().to_string()))
            }
            _ => (None, None),
        };

        if let Some(&idx) = self.index.get(&id) {
            // A later declaration with brackets refines the node.
            if let Some(shape) = shape {
                self.nodes[idx].shape = shape;
            }
            if let Some(label) = label {
                self.nodes[idx].label = label;
            }
            return Ok(idx);
        }

        let idx = self.nodes.len();
        self.nodes.push(FlowNode {
            label: label.unwrap_or_else(|| id.clone()),
            shape: shape.unwrap_or(NodeShape::Rect),
            id: id.clone(),
        });
        self.index.insert(id, idx);
        Ok(idx)
    }
}

/// Split a leading `|label|` off an edge segment.
fn split_edge_label(segment: &str) -> (Option<String>, &str) {
    let trimmed = segment.trim_start();
    if let Some(rest) = trimmed.strip_prefix('|') {
        if let Some(end) = rest.find('|') {
            let label = rest[..end].trim().to_string();
            return (Some(label), &rest[end + 1..]);
        }
    }
    (None, segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_graph() {
        let graph = parse_flowchart("graph TD; A-->B").unwrap();
        assert_eq!(graph.direction, FlowDirection::TopDown);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.edges[0].arrow);
    }

    #[test]
    fn test_parse_flowchart_keyword_and_lr() {
        let graph = parse_flowchart("flowchart LR\n    A[Start] --> B[End]").unwrap();
        assert_eq!(graph.direction, FlowDirection::LeftRight);
        assert_eq!(graph.nodes[0].label, "Start");
        assert_eq!(graph.nodes[1].label, "End");
    }

    #[test]
    fn test_parse_shapes() {
        let graph =
            parse_flowchart("graph TD\nA[box] --> B(round)\nB --> C{choice}\nC --> D((ball))")
                .unwrap();
        assert_eq!(graph.nodes[0].shape, NodeShape::Rect);
        assert_eq!(graph.nodes[1].shape, NodeShape::Rounded);
        assert_eq!(graph.nodes[2].shape, NodeShape::Diamond);
        assert_eq!(graph.nodes[3].shape, NodeShape::Circle);
    }

    #[test]
    fn test_parse_edge_labels() {
        let graph = parse_flowchart("graph TD\nA -->|yes| B\nA -->|no| C").unwrap();
        assert_eq!(graph.edges[0].label.as_deref(), Some("yes"));
        assert_eq!(graph.edges[1].label.as_deref(), Some("no"));
    }

    #[test]
    fn test_parse_chain_statement() {
        let graph = parse_flowchart("graph LR; A --> B --> C --> D").unwrap();
        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.edges.len(), 3);
        assert_eq!(graph.edges[2].from, 2);
        assert_eq!(graph.edges[2].to, 3);
    }

    #[test]
    fn test_parse_dotted_and_plain_links() {
        let graph = parse_flowchart("graph TD\nA -.-> B\nB --- C").unwrap();
        assert!(graph.edges[0].dotted);
        assert!(graph.edges[0].arrow);
        assert!(!graph.edges[1].dotted);
        assert!(!graph.edges[1].arrow);
    }

    #[test]
    fn test_duplicate_node_refines_label() {
        let graph = parse_flowchart("graph TD\nA --> B\nA[Start here]").unwrap();
        assert_eq!(graph.nodes[0].label, "Start here");
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn test_comments_and_ignored_statements() {
        let source = "graph TD\n%% a comment\nstyle A fill:#f9f\nA --> B";
        let graph = parse_flowchart(source).unwrap();
        assert_eq!(graph.nodes.len(), 2);
    }

    #[test]
    fn test_sequence_diagram_is_unsupported() {
        let err = parse_flowchart("sequenceDiagram\nAlice->>Bob: Hello").unwrap_err();
        assert!(matches!(err, DiagramError::Unsupported(kind) if kind == "sequenceDiagram"));
    }

    #[test]
    fn test_empty_source_errors() {
        assert!(matches!(
            parse_flowchart("  \n%% only a comment\n"),
            Err(DiagramError::Empty)
        ));
    }

    #[test]
    fn test_malformed_node_errors() {
        let err = parse_flowchart("graph TD\nA[unclosed --> B").unwrap_err();
        assert!(matches!(err, DiagramError::Parse(_)));
    }

    #[test]
    fn test_header_only_graph_has_no_nodes() {
        assert!(matches!(parse_flowchart("graph TD"), Err(DiagramError::NoNodes)));
    }
}
