#![cfg_attr(docsrs, feature(doc_cfg))]
//! # dist-rect-mesh
//!
//! Distributed generation of rectilinear (edge / quad / hex) meshes. Every
//! process builds only its own part of an `nx × ny × nz` grid plus a ghost
//! layer, without any process ever holding the global mesh.
//!
//! ## Features
//! - Implicit structured index space: element and node IDs are pure
//!   functions of `(i, j, k)`, identical on every rank
//! - Linear, block ("square") and graph partitioning: recursive coordinate
//!   bisection computed from each rank's own rows, a hierarchical variant,
//!   and opt-in gather-to-root graph bisection or METIS
//! - Keyed push/pull collectives over pluggable communicators (serial,
//!   in-process threads, MPI)
//! - Ghost layers with owner resolution and remote-neighbor markers
//! - Geometric biasing of grid lines
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! dist-rect-mesh = "0.3"
//! # Optional features:
//! # features = ["mpi-support", "rayon", "metis-support"]
//! ```
//!
//! ```
//! use dist_rect_mesh::prelude::*;
//!
//! let mut config = RectilinearMeshConfig::new(2);
//! config.nx = 4;
//! config.ny = 3;
//! let mesh = DistributedRectilinearMeshGenerator::new(config)?.generate(&NoComm)?;
//! assert_eq!(mesh.n_elem(), 12);
//! # Ok::<(), MeshGenError>(())
//! ```
//!
//! ## Determinism
//!
//! All partitioners are deterministic: the same configuration on the same
//! number of ranks always yields the same distribution.

pub mod algs;
pub mod generator;
pub mod mesh;
pub mod mesh_error;
pub mod partitioning;
pub mod structured;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{CommTag, Communicator, LocalComm, NoComm, Wait};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::exchange::{Exchanger, KeyedIds};
    pub use crate::generator::{DistributedRectilinearMeshGenerator, RectilinearMeshConfig};
    pub use crate::mesh::{
        BoundaryId, BoundaryInfo, DistributedMesh, Elem, ElemOwnership, Neighbor, Node, SideState,
    };
    pub use crate::mesh_error::MeshGenError;
    pub use crate::partitioning::linear::LinearPartition;
    pub use crate::partitioning::{
        GraphPartitioner, PartitionMethod, PartitionOptions, Partitioner, RowPartitioner,
    };
    pub use crate::structured::{
        Dims, ElemId, ElemType, ElementTopology, Extents, NodeId, topology_for,
    };
}
