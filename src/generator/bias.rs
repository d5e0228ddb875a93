//! Geometric grading of grid lines.
//!
//! With bias `b` along an axis of `N` elements and width `w`, grid line
//! `n` moves to `min + w·(1 - bⁿ)/(1 - bᴺ)`, so consecutive elements grow
//! by the factor `b`. Midside nodes of quadratic elements move to the
//! average of the two surrounding grid lines.

use crate::mesh::DistributedMesh;
use crate::mesh_error::MeshGenError;
use crate::structured::{Dims, Extents};

/// Distance from a grid or midside position still treated as on it.
pub const BIAS_TOLERANCE: f64 = 1e-6;

/// Map one coordinate of a node sitting on the uniform grid onto the biased grid.
///
/// `None` if `x` is neither on a grid line nor halfway between two.
pub fn biased_coordinate(x: f64, min: f64, width: f64, n_elems: u64, bias: f64) -> Option<f64> {
    let float_index = (x - min) * n_elems as f64 / width;
    let integer_part = float_index.trunc();
    let fractional_part = float_index.fract();
    let denom = 1.0 - bias.powf(n_elems as f64);

    if fractional_part.abs() < BIAS_TOLERANCE || (fractional_part.abs() - 1.0).abs() < BIAS_TOLERANCE {
        let index = float_index.round();
        Some(min + width * (1.0 - bias.powf(index)) / denom)
    } else if (fractional_part - 0.5).abs() < BIAS_TOLERANCE {
        let lower = bias.powf(integer_part);
        let upper = bias.powf(integer_part + 1.0);
        Some(min + width * (1.0 - 0.5 * (lower + upper)) / denom)
    } else {
        None
    }
}

/// Apply per-axis `biases` to every node of `mesh`.
///
/// Axes with bias 1 or zero width are left alone. Coordinates must
/// already be scaled to `extents`.
pub fn apply_bias(
    mesh: &mut DistributedMesh,
    dims: Dims,
    extents: &Extents,
    biases: [f64; 3],
    dim: usize,
) -> Result<(), MeshGenError> {
    for axis in 0..dim {
        let bias = biases[axis];
        let width = extents.width(axis);
        if bias == 1.0 || width == 0.0 {
            continue;
        }
        let n = dims.along(axis);
        for node in mesh.nodes_mut() {
            let x = node.coords[axis];
            node.coords[axis] = biased_coordinate(x, extents.min[axis], width, n, bias)
                .ok_or(MeshGenError::UnsupportedBiasPosition {
                    node: node.id,
                    axis,
                    coord: x,
                })?;
        }
        log::debug!("biased axis {axis} by {bias}");
    }
    Ok(())
}
