//! Recursive BFS bisection of a whole graph, behind the opt-in
//! `gathered` package.
//!
//! Each bisection orders the vertices breadth-first from a
//! pseudo-peripheral vertex and cuts the ordering where the accumulated
//! weight reaches the left side's share. Disconnected graphs are handled
//! by restarting the sweep in the next unvisited component.

use std::collections::VecDeque;

use crate::algs::dual_graph::CsrGraph;
use crate::mesh_error::MeshGenError;
use crate::partitioning::GraphPartitioner;

/// Recursive BFS bisection into any number of parts.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecursiveBisection;

impl GraphPartitioner for RecursiveBisection {
    fn name(&self) -> &str {
        "gathered"
    }

    fn partition(&self, graph: &CsrGraph, n_parts: usize) -> Result<Vec<usize>, MeshGenError> {
        Ok(recursive_bisection(graph, n_parts))
    }
}

/// Assign every vertex of `graph` to a part in `0..n_parts`.
pub fn recursive_bisection(graph: &CsrGraph, n_parts: usize) -> Vec<usize> {
    let mut parts = vec![0; graph.n_vertices()];
    let all: Vec<usize> = (0..graph.n_vertices()).collect();
    bisect(graph, &all, 0, n_parts.max(1), &mut parts);
    parts
}

fn bisect(graph: &CsrGraph, verts: &[usize], first_part: usize, n_parts: usize, out: &mut [usize]) {
    if n_parts == 1 || verts.is_empty() {
        for &v in verts {
            out[v] = first_part;
        }
        return;
    }

    let left_parts = n_parts / 2;
    let order = bfs_order(graph, verts);
    let total: i64 = verts.iter().map(|&v| graph.weight(v)).sum();
    let n = n_parts as i64;
    let l = left_parts as i64;

    let mut acc = 0;
    let mut cut = 0;
    for &v in &order {
        if acc * n >= total * l {
            break;
        }
        acc += graph.weight(v);
        cut += 1;
    }

    bisect(graph, &order[..cut], first_part, left_parts, out);
    bisect(graph, &order[cut..], first_part + left_parts, n_parts - left_parts, out);
}

// Breadth-first order of `verts` restricted to the induced subgraph.
fn bfs_order(graph: &CsrGraph, verts: &[usize]) -> Vec<usize> {
    let n = graph.n_vertices();
    let mut member = vec![false; n];
    for &v in verts {
        member[v] = true;
    }

    let mut seen = vec![false; n];
    let mut order = Vec::with_capacity(verts.len());
    for &seed in verts {
        if seen[seed] {
            continue;
        }
        let start = pseudo_peripheral(graph, seed, &member);
        let mut queue = VecDeque::from([start]);
        seen[start] = true;
        while let Some(u) = queue.pop_front() {
            order.push(u);
            for &w in graph.neighbors(u) {
                if member[w] && !seen[w] {
                    seen[w] = true;
                    queue.push_back(w);
                }
            }
        }
    }
    order
}

// Two BFS sweeps: the last vertex reached from `seed` is far from it.
fn pseudo_peripheral(graph: &CsrGraph, seed: usize, member: &[bool]) -> usize {
    let mut far = seed;
    for _ in 0..2 {
        let mut seen = vec![false; member.len()];
        let mut queue = VecDeque::from([far]);
        seen[far] = true;
        while let Some(u) = queue.pop_front() {
            far = u;
            for &w in graph.neighbors(u) {
                if member[w] && !seen[w] {
                    seen[w] = true;
                    queue.push_back(w);
                }
            }
        }
    }
    far
}
