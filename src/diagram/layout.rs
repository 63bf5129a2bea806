//! Flowchart layout: rank assignment and coordinate placement.

use super::flow::{FlowDirection, FlowGraph, NodeShape};
use super::text_metrics::TextMeasurer;
use super::theme::Theme;

const NODE_PAD_X: f32 = 16.0;
const NODE_PAD_Y: f32 = 10.0;
const RANK_GAP: f32 = 56.0;
const NODE_GAP: f32 = 36.0;
const MARGIN: f32 = 24.0;
/// Rank relaxation iterations are bounded so cyclic graphs terminate.
const MAX_RANK_PASSES: usize = 64;

/// A node with resolved pixel geometry (top-left anchored).
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub node: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PlacedNode {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// An edge with resolved endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedEdge {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub label: Option<String>,
    pub label_at: (f32, f32),
    pub dotted: bool,
    pub arrow: bool,
}

/// A fully laid-out diagram ready for SVG emission.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramLayout {
    pub nodes: Vec<PlacedNode>,
    pub edges: Vec<PlacedEdge>,
    pub width: f32,
    pub height: f32,
}

/// Place all nodes rank by rank and route edges between them.
pub fn compute_layout(graph: &FlowGraph, measurer: &TextMeasurer, theme: &Theme) -> DiagramLayout {
    let ranks = assign_ranks(graph);
    let rank_count = ranks.iter().copied().max().map_or(1, |max| max + 1);

    // Group node indices by rank, preserving declaration order.
    let mut by_rank: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
    for (node, &rank) in ranks.iter().enumerate() {
        by_rank[rank].push(node);
    }

    // Node geometry from label metrics.
    let sizes: Vec<(f32, f32)> = graph
        .nodes
        .iter()
        .map(|node| {
            let text_width = measurer.measure(&node.label, theme.font_size);
            let base_w = text_width + 2.0 * NODE_PAD_X;
            let base_h = theme.font_size + 2.0 * NODE_PAD_Y;
            match node.shape {
                NodeShape::Rect | NodeShape::Rounded => (base_w, base_h),
                // Diamonds and circles need extra room so the label stays
                // inside the shape outline.
                NodeShape::Diamond => (base_w * 1.6, base_h * 1.7),
                NodeShape::Circle => {
                    let diameter = base_w.max(base_h * 1.4);
                    (diameter, diameter)
                }
            }
        })
        .collect();

    // Lay ranks along the main axis, centering each rank on the cross axis.
    let rank_extent = |rank: &[usize]| -> f32 {
        rank.iter()
            .map(|&n| match graph.direction {
                FlowDirection::TopDown => sizes[n].1,
                FlowDirection::LeftRight => sizes[n].0,
            })
            .fold(0.0, f32::max)
    };
    let rank_breadth = |rank: &[usize]| -> f32 {
        let total: f32 = rank
            .iter()
            .map(|&n| match graph.direction {
                FlowDirection::TopDown => sizes[n].0,
                FlowDirection::LeftRight => sizes[n].1,
            })
            .sum();
        total + NODE_GAP * rank.len().saturating_sub(1) as f32
    };

    let max_breadth = by_rank.iter().map(|r| rank_breadth(r)).fold(0.0, f32::max);

    let mut nodes: Vec<PlacedNode> = (0..graph.nodes.len())
        .map(|node| PlacedNode {
            node,
            x: 0.0,
            y: 0.0,
            width: sizes[node].0,
            height: sizes[node].1,
        })
        .collect();

    let mut main_cursor = MARGIN;
    for rank in &by_rank {
        let breadth = rank_breadth(rank);
        let mut cross_cursor = MARGIN + (max_breadth - breadth) / 2.0;
        let extent = rank_extent(rank);
        for &node in rank {
            match graph.direction {
                FlowDirection::TopDown => {
                    nodes[node].x = cross_cursor;
                    // Center shorter nodes within the rank's extent.
                    nodes[node].y = main_cursor + (extent - sizes[node].1) / 2.0;
                    cross_cursor += sizes[node].0 + NODE_GAP;
                }
                FlowDirection::LeftRight => {
                    nodes[node].x = main_cursor + (extent - sizes[node].0) / 2.0;
                    nodes[node].y = cross_cursor;
                    cross_cursor += sizes[node].1 + NODE_GAP;
                }
            }
        }
        main_cursor += extent + RANK_GAP;
    }
    let main_extent = main_cursor - RANK_GAP + MARGIN;
    let cross_extent = MARGIN * 2.0 + max_breadth;

    let (width, height) = match graph.direction {
        FlowDirection::TopDown => (cross_extent, main_extent),
        FlowDirection::LeftRight => (main_extent, cross_extent),
    };

    // Route each edge between facing anchor points.
    let edges = graph
        .edges
        .iter()
        .map(|edge| {
            let from = &nodes[edge.from];
            let to = &nodes[edge.to];
            let (from_pt, to_pt) = anchor_points(from, to, graph.direction);
            let label_at = (
                (from_pt.0 + to_pt.0) / 2.0,
                (from_pt.1 + to_pt.1) / 2.0,
            );
            PlacedEdge {
                from: from_pt,
                to: to_pt,
                label: edge.label.clone(),
                label_at,
                dotted: edge.dotted,
                arrow: edge.arrow,
            }
        })
        .collect();

    DiagramLayout {
        nodes,
        edges,
        width,
        height,
    }
}

/// Longest-path rank assignment, bounded for cyclic inputs.
fn assign_ranks(graph: &FlowGraph) -> Vec<usize> {
    let mut ranks = vec![0usize; graph.nodes.len()];
    for _ in 0..MAX_RANK_PASSES {
        let mut changed = false;
        for edge in &graph.edges {
            if edge.from == edge.to {
                continue;
            }
            let candidate = ranks[edge.from] + 1;
            if candidate > ranks[edge.to] && candidate < graph.nodes.len() + 1 {
                ranks[edge.to] = candidate;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    ranks
}

/// Pick the facing sides of two nodes for an edge, based on direction and
/// relative placement.
fn anchor_points(
    from: &PlacedNode,
    to: &PlacedNode,
    direction: FlowDirection,
) -> ((f32, f32), (f32, f32)) {
    let (fx, fy) = from.center();
    let (tx, ty) = to.center();
    match direction {
        FlowDirection::TopDown => {
            if ty > fy {
                (
                    (fx, from.y + from.height),
                    (tx, to.y),
                )
            } else if ty < fy {
                ((fx, from.y), (tx, to.y + to.height))
            } else {
                // Same rank: connect the facing vertical sides.
                if tx >= fx {
                    ((from.x + from.width, fy), (to.x, ty))
                } else {
                    ((from.x, fy), (to.x + to.width, ty))
                }
            }
        }
        FlowDirection::LeftRight => {
            if tx > fx {
                ((from.x + from.width, fy), (to.x, ty))
            } else if tx < fx {
                ((from.x, fy), (to.x + to.width, ty))
            } else if ty >= fy {
                ((fx, from.y + from.height), (tx, to.y))
            } else {
                ((fx, from.y), (tx, to.y + to.height))
            }
        }
    }
}
