//! Layered ("dagre") layout: relations point down the rank axis.

use tracing::trace;

use crate::graph::{Graph, fit_graph_bounds};
use crate::measure::GraphMetrics;

use super::engine::LayoutEngine;
use super::ordering::order_layers;
use super::placement::place_nodes;
use super::ranking::rank_nodes;
use super::types::LayoutOptions;

#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalLayout;

impl LayoutEngine for HierarchicalLayout {
    fn name(&self) -> &'static str {
        "dagre"
    }

    fn layout(&self, mut graph: Graph, options: &LayoutOptions) -> Graph {
        let options = options.sanitized();

        if graph.nodes.is_empty() {
            for edge in &mut graph.edges {
                edge.points.clear();
            }
            return fit_graph_bounds(graph, &GraphMetrics::default(), options.padding);
        }

        let mut ranking = rank_nodes(&graph);
        order_layers(&mut ranking, graph.nodes.len());
        for (rank, layer) in ranking.layers.iter().enumerate() {
            trace!(rank, nodes = layer.len(), "rank");
        }

        place_nodes(&mut graph, &ranking, &options);
        fit_graph_bounds(graph, &GraphMetrics::default(), options.padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_graph;
    use crate::graph::Rect;
    use crate::layout::types::Direction;
    use crate::parser::parse_dsl;

    const BLOG: &str = "
Table users { id int [pk] }
Table posts {
  id int [pk]
  author_id int
}
Table comments {
  id int [pk]
  post_id int
  author_id int
}
Table tags { id int [pk] }
Ref: posts.author_id > users.id
Ref: comments.post_id > posts.id
Ref: comments.author_id > users.id
";

    fn laid_out(direction: Direction) -> Graph {
        let graph = build_graph(&parse_dsl(BLOG).unwrap());
        let options = LayoutOptions {
            direction,
            ..LayoutOptions::default()
        };
        HierarchicalLayout.layout(graph, &options)
    }

    fn assert_no_overlap(graph: &Graph) {
        for (i, a) in graph.nodes.iter().enumerate() {
            for b in &graph.nodes[i + 1..] {
                assert!(!a.rect().intersects(&b.rect()), "{} overlaps {}", a.id, b.id);
            }
        }
    }

    #[test]
    fn test_relations_flow_down() {
        let g = laid_out(Direction::TB);
        let y = |id: &str| g.node(id).unwrap().position.y;
        assert!(y("comments") < y("posts"));
        assert!(y("posts") < y("users"));
        assert_no_overlap(&g);
    }

    #[test]
    fn test_all_directions_avoid_overlap() {
        for direction in [Direction::TB, Direction::BT, Direction::LR, Direction::RL] {
            let g = laid_out(direction);
            assert_no_overlap(&g);
            assert!(g.nodes.iter().all(|n| n.position.x.is_finite() && n.position.y.is_finite()));
        }
    }

    #[test]
    fn test_sizes_unchanged() {
        let before = build_graph(&parse_dsl(BLOG).unwrap());
        let after = HierarchicalLayout.layout(before.clone(), &LayoutOptions::default());
        for (a, b) in before.nodes.iter().zip(&after.nodes) {
            assert_eq!(a.size, b.size);
        }
    }

    #[test]
    fn test_drawing_starts_at_padding() {
        let g = laid_out(Direction::LR);
        let min_x = g.nodes.iter().map(|n| n.position.x).fold(f64::INFINITY, f64::min);
        let min_y = g.nodes.iter().map(|n| n.position.y).fold(f64::INFINITY, f64::min);
        assert_eq!((min_x, min_y), (50.0, 50.0));
        let bounds = g.bounds.unwrap();
        assert_eq!((bounds.x, bounds.y), (0.0, 0.0));
    }

    #[test]
    fn test_edges_get_points() {
        let g = laid_out(Direction::TB);
        for edge in &g.edges {
            assert!(edge.points.len() >= 2, "{} has no route", edge.id);
        }
        // comments -> users skips the posts rank
        let long = g.edges.iter().find(|e| e.id == "comments.author_id->users.id").unwrap();
        assert_eq!(long.points.len(), 4);
    }

    #[test]
    fn test_group_frame_stays_inside_padding() {
        let source = format!("{BLOG}\nTableGroup all {{\n users\n posts\n comments\n tags\n}}\n");
        let g = HierarchicalLayout.layout(build_graph(&parse_dsl(&source).unwrap()), &LayoutOptions::default());
        let frame = g.groups[0].bounds.unwrap();
        assert_eq!((frame.x, frame.y), (50.0, 50.0));
        let bounds = g.bounds.unwrap();
        assert_eq!((bounds.x, bounds.y), (0.0, 0.0));
        assert_no_overlap(&g);
    }

    #[test]
    fn test_empty_graph() {
        let g = HierarchicalLayout.layout(Graph::default(), &LayoutOptions::default());
        assert!(g.nodes.is_empty());
        assert_eq!(g.bounds, Some(Rect::default()));
    }

    #[test]
    fn test_cyclic_graph() {
        let input = "Table a { id int b_id int }\nTable b { id int a_id int }\nRef: a.b_id > b.id\nRef: b.a_id > a.id";
        let g = HierarchicalLayout.layout(build_graph(&parse_dsl(input).unwrap()), &LayoutOptions::default());
        assert_no_overlap(&g);
        assert_ne!(g.nodes[0].position.y, g.nodes[1].position.y);
    }
}
