//! Rank assignment: cycle breaking and longest-path layering.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{DfsEvent, depth_first_search};

use crate::graph::Graph;

/// Layering of a graph's nodes, by position in `Graph::nodes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    /// Rank of each node.
    pub ranks: Vec<usize>,
    /// Node indices per rank, in input order.
    pub layers: Vec<Vec<usize>>,
    /// Acyclic edges `(upper, lower)` used for layering; `rank[upper] < rank[lower]`.
    pub edges: Vec<(usize, usize)>,
}

/// Maps node ids to indices. The first node wins when ids repeat.
pub fn index_nodes(graph: &Graph) -> HashMap<&str, usize> {
    let mut index = HashMap::new();
    for (i, node) in graph.nodes.iter().enumerate() {
        index.entry(node.id.as_str()).or_insert(i);
    }
    index
}

/// Edges between two distinct existing nodes, as index pairs.
fn resolved_edges(graph: &Graph, index: &HashMap<&str, usize>) -> Vec<(usize, usize)> {
    graph
        .edges
        .iter()
        .filter_map(|e| {
            let from = *index.get(e.from.node_id.as_str())?;
            let to = *index.get(e.to.node_id.as_str())?;
            (from != to).then_some((from, to))
        })
        .collect()
}

pub fn rank_nodes(graph: &Graph) -> Ranking {
    let n = graph.nodes.len();
    let index = index_nodes(graph);
    let pairs = resolved_edges(graph, &index);

    let mut g: DiGraph<(), ()> = DiGraph::with_capacity(n, pairs.len());
    let ids: Vec<NodeIndex> = (0..n).map(|_| g.add_node(())).collect();
    for &(from, to) in &pairs {
        g.add_edge(ids[from], ids[to], ());
    }

    let mut back_edges: HashSet<(usize, usize)> = HashSet::new();
    depth_first_search(&g, ids.iter().copied(), |event| {
        if let DfsEvent::BackEdge(u, v) = event {
            back_edges.insert((u.index(), v.index()));
        }
    });

    let edges: Vec<(usize, usize)> = pairs
        .iter()
        .map(|&(u, v)| if back_edges.contains(&(u, v)) { (v, u) } else { (u, v) })
        .collect();

    let mut dag: DiGraph<(), ()> = DiGraph::with_capacity(n, edges.len());
    let dag_ids: Vec<NodeIndex> = (0..n).map(|_| dag.add_node(())).collect();
    for &(u, v) in &edges {
        dag.add_edge(dag_ids[u], dag_ids[v], ());
    }

    let mut ranks = vec![0usize; n];
    // Reversing every DFS back edge leaves no cycle, so this always succeeds.
    if let Ok(order) = toposort(&dag, None) {
        for u in order {
            let next = ranks[u.index()] + 1;
            for v in dag.neighbors(u) {
                ranks[v.index()] = ranks[v.index()].max(next);
            }
        }
    }

    let depth = ranks.iter().copied().max().map_or(0, |r| r + 1);
    let mut layers = vec![Vec::new(); depth];
    for (i, &r) in ranks.iter().enumerate() {
        layers[r].push(i);
    }

    Ranking {
        ranks,
        layers,
        edges,
    }
}
