//! Visual model derived from a schema: sized table nodes, relation edges,
//! group frames and free-floating notes.

use serde::{Deserialize, Serialize};

use crate::measure::GraphMetrics;
use crate::schema::{ColumnSettings, ColumnType, RelationType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True when the interiors overlap; touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Grows the rectangle by `dx` on the left and right and by `top` and
    /// `bottom` vertically.
    fn expand(&self, dx: f64, top: f64, bottom: f64) -> Rect {
        Rect::new(
            self.x - dx,
            self.y - top,
            self.width + dx * 2.0,
            self.height + top + bottom,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_type: Option<String>,
    #[serde(default)]
    pub settings: ColumnSettings,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub offset_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableNode {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub position: Point,
    pub size: Size,
    pub columns: Vec<ColumnNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub collapsed: bool,
}

impl TableNode {
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.size.width,
            self.size.height,
        )
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.size.width / 2.0,
            self.position.y + self.size.height / 2.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeEndpoint {
    pub node_id: String,
    pub column_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub from: EdgeEndpoint,
    pub to: EdgeEndpoint,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    /// Routing waypoints; empty until a layout engine fills them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Point>,
}

/// A named cluster of table nodes with its on-canvas frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphGroup {
    pub id: String,
    pub name: String,
    pub node_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Rect>,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickyNote {
    pub id: String,
    pub text: String,
    pub position: Point,
    pub size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<TableNode>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub groups: Vec<GraphGroup>,
    #[serde(default)]
    pub notes: Vec<StickyNote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Rect>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&TableNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Outer padding used when `compute_graph_bounds` is given none.
pub const DEFAULT_BOUNDS_PADDING: f64 = 50.0;

/// Recomputes group frames and whole-graph bounds from current node
/// positions. Node positions are left untouched.
pub fn compute_graph_bounds(graph: Graph, padding: Option<f64>) -> Graph {
    compute_graph_bounds_with(graph, &GraphMetrics::default(), padding)
}

pub fn compute_graph_bounds_with(
    mut graph: Graph,
    metrics: &GraphMetrics,
    padding: Option<f64>,
) -> Graph {
    let padding = padding.unwrap_or(DEFAULT_BOUNDS_PADDING);

    for group in &mut graph.groups {
        group.bounds = graph
            .nodes
            .iter()
            .filter(|n| group.node_ids.contains(&n.id))
            .map(TableNode::rect)
            .reduce(|a, b| a.union(&b))
            .map(|r| {
                r.expand(
                    metrics.group_padding,
                    metrics.group_padding + metrics.group_header_height,
                    metrics.group_padding,
                )
            });
    }

    let content = graph
        .nodes
        .iter()
        .map(TableNode::rect)
        .chain(graph.groups.iter().filter_map(|g| g.bounds))
        .reduce(|a, b| a.union(&b));

    graph.bounds = Some(match content {
        Some(r) => r.expand(padding, padding, padding),
        None => Rect::default(),
    });
    graph
}

/// Moves nodes and edge points so the drawing, group frames included,
/// starts at `padding`, then recomputes bounds. Afterwards the bounds sit at
/// the origin.
pub fn fit_graph_bounds(graph: Graph, metrics: &GraphMetrics, padding: f64) -> Graph {
    let mut graph = compute_graph_bounds_with(graph, metrics, Some(padding));
    let Some(bounds) = graph.bounds else {
        return graph;
    };
    let (dx, dy) = (-bounds.x, -bounds.y);
    if dx == 0.0 && dy == 0.0 {
        return graph;
    }

    for node in &mut graph.nodes {
        node.position.x += dx;
        node.position.y += dy;
    }
    for point in graph.edges.iter_mut().flat_map(|e| e.points.iter_mut()) {
        point.x += dx;
        point.y += dy;
    }
    compute_graph_bounds_with(graph, metrics, Some(padding))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f64, y: f64, w: f64, h: f64) -> TableNode {
        TableNode {
            id: id.into(),
            name: id.into(),
            schema: None,
            alias: None,
            note: None,
            position: Point::new(x, y),
            size: Size {
                width: w,
                height: h,
            },
            columns: vec![],
            group: None,
            collapsed: false,
        }
    }

    fn group(id: &str, members: &[&str]) -> GraphGroup {
        GraphGroup {
            id: id.into(),
            name: id.into(),
            node_ids: members.iter().map(|m| m.to_string()).collect(),
            bounds: None,
            collapsed: false,
            color: None,
        }
    }

    #[test]
    fn test_rect_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::new(0.0, 20.0, 10.0, 10.0)));
    }

    #[test]
    fn test_empty_graph_bounds_are_zero() {
        let graph = compute_graph_bounds(Graph::default(), None);
        assert_eq!(graph.bounds, Some(Rect::default()));
    }

    #[test]
    fn test_bounds_cover_nodes_with_padding() {
        let graph = Graph {
            nodes: vec![
                node("a", 0.0, 0.0, 100.0, 50.0),
                node("b", 200.0, 100.0, 100.0, 50.0),
            ],
            ..Graph::default()
        };
        let graph = compute_graph_bounds(graph, Some(10.0));
        assert_eq!(graph.bounds, Some(Rect::new(-10.0, -10.0, 320.0, 170.0)));
    }

    #[test]
    fn test_group_bounds_include_header() {
        let graph = Graph {
            nodes: vec![node("a", 100.0, 100.0, 100.0, 50.0)],
            groups: vec![group("g", &["a"]), group("empty", &["missing"])],
            ..Graph::default()
        };
        let graph = compute_graph_bounds(graph, Some(0.0));
        assert_eq!(
            graph.groups[0].bounds,
            Some(Rect::new(80.0, 48.0, 140.0, 122.0))
        );
        assert_eq!(graph.groups[1].bounds, None);
        // The group frame dominates the node rectangle.
        assert_eq!(graph.bounds, graph.groups[0].bounds);
    }

    #[test]
    fn test_bounds_are_idempotent() {
        let graph = Graph {
            nodes: vec![node("a", 5.0, 7.0, 100.0, 50.0), node("b", 300.0, 0.0, 80.0, 90.0)],
            groups: vec![group("g", &["a", "b"])],
            ..Graph::default()
        };
        let once = compute_graph_bounds(graph, None);
        let twice = compute_graph_bounds(once.clone(), None);
        assert_eq!(once.bounds, twice.bounds);
        assert_eq!(once.groups, twice.groups);
    }

    #[test]
    fn test_fit_pulls_group_frames_inside_padding() {
        let graph = Graph {
            nodes: vec![node("a", 50.0, 50.0, 100.0, 50.0), node("b", 300.0, 50.0, 80.0, 40.0)],
            groups: vec![group("g", &["a"])],
            ..Graph::default()
        };
        let metrics = GraphMetrics::default();
        let out = fit_graph_bounds(graph, &metrics, 50.0);
        // 20 of side padding, 20 + 32 above for the header.
        assert_eq!(out.nodes[0].position, Point::new(70.0, 102.0));
        assert_eq!(out.nodes[1].position, Point::new(320.0, 102.0));
        assert_eq!(out.groups[0].bounds, Some(Rect::new(50.0, 50.0, 140.0, 122.0)));
        assert_eq!(out.bounds.map(|b| (b.x, b.y)), Some((0.0, 0.0)));
    }

    #[test]
    fn test_fit_uses_given_group_metrics() {
        let graph = Graph {
            nodes: vec![node("a", 0.0, 0.0, 100.0, 50.0)],
            groups: vec![group("g", &["a"])],
            ..Graph::default()
        };
        let metrics = GraphMetrics {
            group_padding: 10.0,
            group_header_height: 0.0,
            ..GraphMetrics::default()
        };
        let out = fit_graph_bounds(graph, &metrics, 5.0);
        assert_eq!(out.nodes[0].position, Point::new(15.0, 15.0));
        assert_eq!(out.groups[0].bounds, Some(Rect::new(5.0, 5.0, 120.0, 70.0)));
        assert_eq!(out.bounds, Some(Rect::new(0.0, 0.0, 130.0, 80.0)));
    }

    #[test]
    fn test_fit_without_groups_keeps_padded_drawing() {
        let graph = Graph {
            nodes: vec![node("a", 50.0, 50.0, 100.0, 50.0)],
            ..Graph::default()
        };
        let out = fit_graph_bounds(graph.clone(), &GraphMetrics::default(), 50.0);
        assert_eq!(out.nodes, graph.nodes);
    }

    #[test]
    fn test_positions_untouched() {
        let graph = Graph {
            nodes: vec![node("a", 5.0, 7.0, 100.0, 50.0)],
            ..Graph::default()
        };
        let out = compute_graph_bounds(graph.clone(), None);
        assert_eq!(out.nodes, graph.nodes);
    }
}
