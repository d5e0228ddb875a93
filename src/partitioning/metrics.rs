//! Partition quality metrics.
//!
//! Intended for diagnostics and tests; the generator logs them at debug
//! level after the graph partition.

use crate::algs::dual_graph::CsrGraph;

/// Number of edges whose endpoints lie in different parts (O(E)).
pub fn edge_cut(graph: &CsrGraph, parts: &[usize]) -> usize {
    graph.edges().filter(|&(u, v)| parts[u] != parts[v]).count()
}

/// Vertex count per part.
pub fn part_sizes(parts: &[usize], n_parts: usize) -> Vec<usize> {
    let mut sizes = vec![0; n_parts];
    for &p in parts {
        if let Some(s) = sizes.get_mut(p) {
            *s += 1;
        }
    }
    sizes
}

/// Largest part size over the mean part size; 1.0 is perfect balance.
pub fn imbalance(parts: &[usize], n_parts: usize) -> f64 {
    if parts.is_empty() || n_parts == 0 {
        return 1.0;
    }
    let max = part_sizes(parts, n_parts).into_iter().max().unwrap_or(0);
    max as f64 * n_parts as f64 / parts.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_cut() {
        let g = CsrGraph {
            xadj: vec![0, 2, 4, 6],
            adjncy: vec![1, 2, 0, 2, 0, 1],
            vwgt: vec![1; 3],
        };
        assert_eq!(edge_cut(&g, &[0, 0, 1]), 2);
        assert_eq!(edge_cut(&g, &[0, 0, 0]), 0);
    }

    #[test]
    fn balance() {
        assert_eq!(part_sizes(&[0, 1, 1, 1], 2), vec![1, 3]);
        assert_eq!(imbalance(&[0, 1, 1, 1], 2), 1.5);
        assert_eq!(imbalance(&[0, 1], 2), 1.0);
    }
}
