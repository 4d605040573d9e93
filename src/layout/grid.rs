//! Row-major grid layout. Edges play no part in placement.

use crate::graph::{Graph, fit_graph_bounds};
use crate::measure::GraphMetrics;

use super::engine::LayoutEngine;
use super::types::LayoutOptions;

#[derive(Debug, Clone, Copy, Default)]
pub struct GridLayout;

impl LayoutEngine for GridLayout {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn layout(&self, mut graph: Graph, options: &LayoutOptions) -> Graph {
        let options = options.sanitized();
        let cols = (graph.nodes.len() as f64).sqrt().ceil().max(1.0) as usize;

        let mut x = options.padding;
        let mut y = options.padding;
        let mut row_height: f64 = 0.0;

        for (i, node) in graph.nodes.iter_mut().enumerate() {
            if i > 0 && i % cols == 0 {
                x = options.padding;
                y += row_height + options.node_spacing_y;
                row_height = 0.0;
            }
            node.position.x = x;
            node.position.y = y;
            x += node.size.width + options.node_spacing_x;
            row_height = row_height.max(node.size.height);
        }

        for edge in &mut graph.edges {
            edge.points.clear();
        }

        fit_graph_bounds(graph, &GraphMetrics::default(), options.padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Point, Rect, Size, TableNode};

    fn node(id: &str, w: f64, h: f64) -> TableNode {
        TableNode {
            id: id.into(),
            name: id.into(),
            schema: None,
            alias: None,
            note: None,
            position: Point::default(),
            size: Size {
                width: w,
                height: h,
            },
            columns: vec![],
            group: None,
            collapsed: false,
        }
    }

    fn graph(sizes: &[(f64, f64)]) -> Graph {
        Graph {
            nodes: sizes
                .iter()
                .enumerate()
                .map(|(i, &(w, h))| node(&format!("t{i}"), w, h))
                .collect(),
            ..Graph::default()
        }
    }

    #[test]
    fn test_five_nodes_three_columns() {
        let g = GridLayout.layout(
            graph(&[(200.0, 100.0), (300.0, 50.0), (200.0, 80.0), (200.0, 60.0), (100.0, 60.0)]),
            &LayoutOptions::default(),
        );
        let pos: Vec<Point> = g.nodes.iter().map(|n| n.position).collect();
        assert_eq!(pos[0], Point::new(50.0, 50.0));
        assert_eq!(pos[1], Point::new(330.0, 50.0));
        assert_eq!(pos[2], Point::new(710.0, 50.0));
        // Next row sits below the tallest node of the first.
        assert_eq!(pos[3], Point::new(50.0, 250.0));
        assert_eq!(pos[4], Point::new(330.0, 250.0));
    }

    #[test]
    fn test_no_overlap_with_zero_spacing() {
        let options = LayoutOptions {
            node_spacing_x: 0.0,
            node_spacing_y: 0.0,
            ..LayoutOptions::default()
        };
        let g = GridLayout.layout(graph(&[(10.0, 30.0), (40.0, 10.0), (20.0, 20.0), (5.0, 5.0)]), &options);
        for (i, a) in g.nodes.iter().enumerate() {
            for b in &g.nodes[i + 1..] {
                assert!(!a.rect().intersects(&b.rect()));
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let input = graph(&[(10.0, 30.0), (40.0, 10.0), (20.0, 20.0)]);
        let a = GridLayout.layout(input.clone(), &LayoutOptions::default());
        let b = GridLayout.layout(input, &LayoutOptions::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_graph() {
        let g = GridLayout.layout(Graph::default(), &LayoutOptions::default());
        assert!(g.nodes.is_empty());
        assert_eq!(g.bounds, Some(Rect::default()));
    }
}
