//! Block ("square") decomposition of a structured grid.
//!
//! The rank count is factored into `px · py · pz` blocks, one per rank,
//! choosing the factorization with the least interface area. Each axis is
//! then sliced with a [`LinearPartition`], so the owner of any element is
//! known to every rank without communication.

use crate::partitioning::linear::LinearPartition;
use crate::structured::{Dims, Ijk};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockPartition {
    blocks: [usize; 3],
    axes: [LinearPartition; 3],
}

impl BlockPartition {
    /// Decompose `dims` (with `dim` active axes) into `n_procs` blocks.
    pub fn new(dims: Dims, dim: usize, n_procs: usize) -> Self {
        let n = [dims.nx, dims.ny, dims.nz];
        let blocks = best_factorization(n, dim, n_procs.max(1));
        let axes = [0, 1, 2].map(|a| LinearPartition::new(n[a], blocks[a]));
        Self { blocks, axes }
    }

    /// Blocks per axis.
    pub fn blocks(&self) -> [usize; 3] {
        self.blocks
    }

    /// Rank owning the element at `ijk`.
    pub fn owner(&self, ijk: Ijk) -> usize {
        let b = [0, 1, 2].map(|a| self.axes[a].owner(ijk[a]));
        b[0] + self.blocks[0] * (b[1] + self.blocks[1] * b[2])
    }
}

fn interface_area(n: [u64; 3], p: [usize; 3]) -> u64 {
    (0..3)
        .map(|a| {
            let face: u64 = (0..3).filter(|&b| b != a).map(|b| n[b]).product();
            (p[a] as u64 - 1) * face
        })
        .sum()
}

fn best_factorization(n: [u64; 3], dim: usize, n_procs: usize) -> [usize; 3] {
    let divisors: Vec<usize> = (1..=n_procs).filter(|d| n_procs % d == 0).collect();
    let mut candidates = Vec::new();
    for &px in &divisors {
        for &py in divisors.iter().filter(|&&d| (n_procs / px) % d == 0) {
            let pz = n_procs / px / py;
            let p = [px, py, pz];
            if (dim..3).all(|a| p[a] == 1) {
                candidates.push(p);
            }
        }
    }
    // Prefer layouts that give every rank at least one element.
    let fits = |p: &[usize; 3]| (0..3).all(|a| p[a] as u64 <= n[a]);
    let pool: Vec<[usize; 3]> = if candidates.iter().any(fits) {
        candidates.into_iter().filter(fits).collect()
    } else {
        candidates
    };
    pool.into_iter()
        .min_by_key(|&p| interface_area(n, p))
        .unwrap_or([n_procs, 1, 1])
}
