//! Contiguous near-equal chunks of an ID range.

use std::ops::Range;

/// Splits `0..n_items` into `n_procs` contiguous chunks whose sizes differ
/// by at most one; the first `n_items % n_procs` chunks are the larger ones.
///
/// Every rank computes the same answer locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinearPartition {
    n_items: u64,
    n_procs: usize,
}

impl LinearPartition {
    /// `n_procs` must be at least 1.
    pub fn new(n_items: u64, n_procs: usize) -> Self {
        debug_assert!(n_procs > 0);
        Self {
            n_items,
            n_procs: n_procs.max(1),
        }
    }

    pub fn n_items(&self) -> u64 {
        self.n_items
    }

    pub fn n_procs(&self) -> usize {
        self.n_procs
    }

    fn base(&self) -> u64 {
        self.n_items / self.n_procs as u64
    }

    fn leftovers(&self) -> u64 {
        self.n_items % self.n_procs as u64
    }

    /// Chunk of `rank` as `begin..end`.
    pub fn range(&self, rank: usize) -> Range<u64> {
        let (base, left, r) = (self.base(), self.leftovers(), rank as u64);
        if r < left {
            let begin = (base + 1) * r;
            begin..begin + base + 1
        } else {
            let begin = (base + 1) * left + base * (r - left);
            begin..begin + base
        }
    }

    pub fn len(&self, rank: usize) -> u64 {
        let r = self.range(rank);
        r.end - r.start
    }

    pub fn is_empty(&self, rank: usize) -> bool {
        self.len(rank) == 0
    }

    /// Rank whose chunk contains `id`.
    pub fn owner(&self, id: u64) -> usize {
        let (base, left) = (self.base(), self.leftovers());
        let first_past_large = left * (base + 1);
        if id < first_past_large {
            (id / (base + 1)) as usize
        } else if base == 0 {
            // out of range; clamp to the last rank
            self.n_procs - 1
        } else {
            ((id - first_past_large) / base + left) as usize
        }
    }

    /// All `n_procs + 1` chunk edges.
    pub fn vtxdist(&self) -> Vec<u64> {
        let mut edges: Vec<u64> = (0..self.n_procs).map(|r| self.range(r).start).collect();
        edges.push(self.n_items);
        edges
    }
}
