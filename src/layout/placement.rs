//! Coordinate assignment for ranked, ordered layers.
//!
//! Work happens in a rank frame: `a` runs along a rank, `b` across ranks.
//! TB is the identity frame; the other directions swap and/or mirror it.

use crate::graph::{Graph, Point};

use super::ranking::Ranking;
use super::types::{Direction, LayoutOptions};

/// Extent of a node along the rank (`a`) and across ranks (`b`).
fn extents(width: f64, height: f64, direction: Direction) -> (f64, f64) {
    if direction.is_horizontal() {
        (height, width)
    } else {
        (width, height)
    }
}

struct Frame {
    direction: Direction,
    /// Total size of the drawing across ranks.
    depth: f64,
}

impl Frame {
    fn to_canvas(&self, a: f64, b: f64) -> Point {
        let b = if self.direction.is_reversed() {
            self.depth - b
        } else {
            b
        };
        if self.direction.is_horizontal() {
            Point::new(b, a)
        } else {
            Point::new(a, b)
        }
    }
}

/// Positions every node of `graph` from the ordered `ranking` and fills
/// edge waypoints. `options` must already be sanitized.
pub fn place_nodes(graph: &mut Graph, ranking: &Ranking, options: &LayoutOptions) {
    let direction = options.direction;
    let sizes: Vec<(f64, f64)> = graph
        .nodes
        .iter()
        .map(|n| extents(n.size.width, n.size.height, direction))
        .collect();

    let row_lengths: Vec<f64> = ranking
        .layers
        .iter()
        .map(|layer| {
            let total: f64 = layer.iter().map(|&i| sizes[i].0).sum();
            total + options.node_spacing_x * layer.len().saturating_sub(1) as f64
        })
        .collect();
    let widest = row_lengths.iter().copied().fold(0.0, f64::max);

    let thickness: Vec<f64> = ranking
        .layers
        .iter()
        .map(|layer| layer.iter().map(|&i| sizes[i].1).fold(0.0, f64::max))
        .collect();

    // Start of each rank band across ranks.
    let mut band_start = Vec::with_capacity(thickness.len());
    let mut b = 0.0;
    for t in &thickness {
        band_start.push(b);
        b += t + options.node_spacing_y;
    }
    let depth = (b - options.node_spacing_y).max(0.0);
    let frame = Frame { direction, depth };

    let mut centers = vec![Point::default(); graph.nodes.len()];
    for (r, layer) in ranking.layers.iter().enumerate() {
        let mut a = (widest - row_lengths[r]) / 2.0;
        let b = band_start[r] + thickness[r] / 2.0;
        for &i in layer {
            centers[i] = frame.to_canvas(a + sizes[i].0 / 2.0, b);
            a += sizes[i].0 + options.node_spacing_x;
        }
    }

    for (node, center) in graph.nodes.iter_mut().zip(&centers) {
        node.position = Point::new(
            center.x - node.size.width / 2.0,
            center.y - node.size.height / 2.0,
        );
    }

    let (min_x, min_y) = graph.nodes.iter().fold((f64::INFINITY, f64::INFINITY), |acc, n| {
        (acc.0.min(n.position.x), acc.1.min(n.position.y))
    });
    let (dx, dy) = if min_x.is_finite() && min_y.is_finite() {
        (options.padding - min_x, options.padding - min_y)
    } else {
        (options.padding, options.padding)
    };

    for node in &mut graph.nodes {
        node.position.x += dx;
        node.position.y += dy;
    }

    let index = super::ranking::index_nodes(graph);
    let boundaries: Vec<f64> = (1..thickness.len())
        .map(|r| (band_start[r - 1] + thickness[r - 1] + band_start[r]) / 2.0)
        .collect();

    let mut routed = Vec::with_capacity(graph.edges.len());
    for edge in &graph.edges {
        let from = index.get(edge.from.node_id.as_str()).copied();
        let to = index.get(edge.to.node_id.as_str()).copied();
        let points = match (from, to) {
            (Some(u), Some(v)) if u != v => {
                let start = graph.nodes[u].center();
                let end = graph.nodes[v].center();
                let offset = Point::new(dx, dy);
                route(ranking.ranks[u], ranking.ranks[v], start, end, &boundaries, &frame, offset)
            }
            _ => Vec::new(),
        };
        routed.push(points);
    }
    for (edge, points) in graph.edges.iter_mut().zip(routed) {
        edge.points = points;
    }
}

/// Source center, one point per rank boundary crossed, target center.
/// Boundary points lie on the straight line between the two centers.
fn route(
    from_rank: usize,
    to_rank: usize,
    start: Point,
    end: Point,
    boundaries: &[f64],
    frame: &Frame,
    offset: Point,
) -> Vec<Point> {
    let crossed: Vec<f64> = if from_rank < to_rank {
        boundaries[from_rank..to_rank].to_vec()
    } else {
        boundaries[to_rank..from_rank].iter().rev().copied().collect()
    };

    let mut points = Vec::with_capacity(crossed.len() + 2);
    points.push(start);
    for b in crossed {
        // Boundary position on the canvas, in the rank axis only.
        let p = frame.to_canvas(0.0, b);
        let along_rank = if frame.direction.is_horizontal() {
            p.x + offset.x
        } else {
            p.y + offset.y
        };
        points.push(interpolate(start, end, along_rank, frame.direction));
    }
    points.push(end);
    points
}

fn interpolate(start: Point, end: Point, rank_coord: f64, direction: Direction) -> Point {
    let (s, e) = if direction.is_horizontal() {
        (start.x, end.x)
    } else {
        (start.y, end.y)
    };
    let t = if (e - s).abs() > f64::EPSILON {
        (rank_coord - s) / (e - s)
    } else {
        0.5
    };
    if direction.is_horizontal() {
        Point::new(rank_coord, start.y + (end.y - start.y) * t)
    } else {
        Point::new(start.x + (end.x - start.x) * t, rank_coord)
    }
}
