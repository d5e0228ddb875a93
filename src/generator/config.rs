//! Generator configuration.
//!
//! A plain serde struct: every field except `dim` has a default, unknown
//! fields are rejected, and [`RectilinearMeshConfig::validate`] checks the
//! ranges that serde cannot express.

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshGenError;
use crate::partitioning::PartitionOptions;
use crate::structured::{Dims, ElemType, Extents};

pub const MIN_BIAS: f64 = 0.5;
pub const MAX_BIAS: f64 = 2.0;

fn one() -> u64 {
    1
}

fn unit() -> f64 {
    1.0
}

fn one_layer() -> usize {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RectilinearMeshConfig {
    /// Mesh dimension: 1, 2 or 3.
    pub dim: usize,

    #[serde(default = "one")]
    pub nx: u64,
    #[serde(default = "one")]
    pub ny: u64,
    #[serde(default = "one")]
    pub nz: u64,

    #[serde(default)]
    pub xmin: f64,
    #[serde(default)]
    pub ymin: f64,
    #[serde(default)]
    pub zmin: f64,
    #[serde(default = "unit")]
    pub xmax: f64,
    #[serde(default = "unit")]
    pub ymax: f64,
    #[serde(default = "unit")]
    pub zmax: f64,

    /// Defaults to the linear element of `dim`.
    #[serde(default)]
    pub elem_type: Option<ElemType>,

    #[serde(default = "unit")]
    pub bias_x: f64,
    #[serde(default = "unit")]
    pub bias_y: f64,
    #[serde(default = "unit")]
    pub bias_z: f64,

    /// Trace element, neighbor and ghost IDs at info level.
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub partition: PartitionOptions,

    /// Number of face-neighbor ghost rings around the owned elements.
    #[serde(default = "one_layer")]
    pub num_side_layers: usize,

    /// Also ghost diagonal (point) neighbors of owned elements.
    #[serde(default)]
    pub ghost_point_neighbors: bool,
}

impl RectilinearMeshConfig {
    /// A single element of the unit cube in `dim` dimensions.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            nx: 1,
            ny: 1,
            nz: 1,
            xmin: 0.0,
            ymin: 0.0,
            zmin: 0.0,
            xmax: 1.0,
            ymax: 1.0,
            zmax: 1.0,
            elem_type: None,
            bias_x: 1.0,
            bias_y: 1.0,
            bias_z: 1.0,
            verbose: false,
            partition: PartitionOptions::default(),
            num_side_layers: 1,
            ghost_point_neighbors: false,
        }
    }

    /// Element counts with unused axes forced to 1.
    pub fn dims(&self) -> Dims {
        let n = [self.nx, self.ny, self.nz];
        let along = |axis: usize| if axis < self.dim { n[axis] } else { 1 };
        Dims::new(along(0), along(1), along(2))
    }

    pub fn extents(&self) -> Extents {
        Extents {
            min: [self.xmin, self.ymin, self.zmin],
            max: [self.xmax, self.ymax, self.zmax],
        }
    }

    pub fn biases(&self) -> [f64; 3] {
        [self.bias_x, self.bias_y, self.bias_z]
    }

    /// The configured element type, or the linear default for `dim`.
    pub fn elem_type(&self) -> Result<ElemType, MeshGenError> {
        match self.elem_type {
            Some(t) => Ok(t),
            None => ElemType::default_for_dim(self.dim)
                .ok_or_else(|| MeshGenError::invalid_parameter("dim", self.dim, "must be 1, 2 or 3")),
        }
    }

    pub fn validate(&self) -> Result<(), MeshGenError> {
        if !(1..=3).contains(&self.dim) {
            return Err(MeshGenError::invalid_parameter("dim", self.dim, "must be 1, 2 or 3"));
        }

        const N_NAMES: [&str; 3] = ["nx", "ny", "nz"];
        const MIN_NAMES: [&str; 3] = ["xmin", "ymin", "zmin"];
        const BIAS_NAMES: [&str; 3] = ["bias_x", "bias_y", "bias_z"];
        let n = [self.nx, self.ny, self.nz];
        let extents = self.extents();
        let biases = self.biases();
        for axis in 0..self.dim {
            if n[axis] == 0 {
                return Err(MeshGenError::invalid_parameter(
                    N_NAMES[axis],
                    n[axis],
                    "must be at least 1",
                ));
            }
            if !(extents.max[axis] > extents.min[axis]) {
                return Err(MeshGenError::invalid_parameter(
                    MIN_NAMES[axis],
                    extents.min[axis],
                    format!("must be less than the maximum ({})", extents.max[axis]),
                ));
            }
            if !(MIN_BIAS..=MAX_BIAS).contains(&biases[axis]) {
                return Err(MeshGenError::invalid_parameter(
                    BIAS_NAMES[axis],
                    biases[axis],
                    format!("must lie in [{MIN_BIAS}, {MAX_BIAS}]"),
                ));
            }
        }

        let elem_type = self.elem_type()?;
        if elem_type.dim() != self.dim {
            return Err(MeshGenError::UnsupportedElementType {
                elem_type,
                dim: self.dim,
            });
        }

        if self.num_side_layers == 0 {
            return Err(MeshGenError::invalid_parameter(
                "num_side_layers",
                0,
                "must be at least 1",
            ));
        }
        if self.partition.num_parts_per_compute_node == 0 {
            return Err(MeshGenError::invalid_parameter(
                "num_parts_per_compute_node",
                0,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
