//! In-rank ordering by barycenter sweeps to reduce edge crossings.

use super::ranking::Ranking;

const SWEEPS: usize = 4;

/// Reorders `ranking.layers` in place. Alternates downward sweeps (keyed on
/// upper neighbours) and upward sweeps (keyed on lower neighbours).
pub fn order_layers(ranking: &mut Ranking, node_count: usize) {
    if ranking.layers.len() < 2 {
        return;
    }

    let mut upper: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut lower: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for &(u, v) in &ranking.edges {
        lower[u].push(v);
        upper[v].push(u);
    }

    let mut position = vec![0usize; node_count];
    refresh_positions(&ranking.layers, &mut position);

    for sweep in 0..SWEEPS {
        let depth = ranking.layers.len();
        if sweep % 2 == 0 {
            for r in 1..depth {
                reorder(&mut ranking.layers[r], &upper, &mut position);
            }
        } else {
            for r in (0..depth - 1).rev() {
                reorder(&mut ranking.layers[r], &lower, &mut position);
            }
        }
    }
}

fn refresh_positions(layers: &[Vec<usize>], position: &mut [usize]) {
    for layer in layers {
        for (i, &node) in layer.iter().enumerate() {
            position[node] = i;
        }
    }
}

/// Stable sort of one layer by the mean position of its neighbours.
/// Nodes without neighbours keep their current position as key.
fn reorder(layer: &mut [usize], neighbours: &[Vec<usize>], position: &mut [usize]) {
    let mut keyed: Vec<(f64, usize)> = layer
        .iter()
        .map(|&node| {
            let adj = &neighbours[node];
            let key = if adj.is_empty() {
                position[node] as f64
            } else {
                adj.iter().map(|&n| position[n] as f64).sum::<f64>() / adj.len() as f64
            };
            (key, node)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (i, (_, node)) in keyed.into_iter().enumerate() {
        layer[i] = node;
        position[node] = i;
    }
}
