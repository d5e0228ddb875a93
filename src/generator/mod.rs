//! Distributed rectilinear mesh generation.
//!
//! [`DistributedRectilinearMeshGenerator::generate`] builds this rank's
//! piece of an `nx × ny × nz` grid without ever holding the global mesh:
//!
//! 1. slice the element IDs linearly and build the local adjacency rows,
//! 2. partition ([`crate::partitioning`]),
//! 3. migrate element IDs to their owners and materialize them,
//! 4. add ghost layers and seal the neighbor links ([`ghosts`]),
//! 5. finalize and agree on node owners across ranks ([`node_owners`]),
//! 6. scale to the physical box and apply the bias ([`bias`]).
//!
//! Every step that communicates is collective: all ranks must call
//! `generate` with the same configuration.

pub mod bias;
pub mod config;
pub mod ghosts;
pub mod migration;
pub mod node_owners;

pub use config::RectilinearMeshConfig;

use itertools::Itertools;

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::dual_graph::build_local_graph;
use crate::algs::exchange::Exchanger;
use crate::mesh::DistributedMesh;
use crate::mesh_error::MeshGenError;
use crate::partitioning::linear::LinearPartition;
use crate::partitioning::{
    PartitionMethod, Partitioner, assign_local_rows, coordinate, resolve_partitioner,
};
use crate::structured::{ElementTopology, topology_for};

const TAG_PARTITION: CommTag = CommTag::new(0x2100); // .. 0x2108
const TAG_MIGRATE: CommTag = CommTag::new(0x2110); // .. 0x2112
const TAG_GHOST_OWNER: CommTag = CommTag::new(0x2120); // .. 0x2124
const TAG_NODE_OWNER: CommTag = CommTag::new(0x2130); // .. 0x2134

/// Builds each rank's piece of a rectilinear grid from a validated
/// [`RectilinearMeshConfig`].
#[derive(Debug)]
pub struct DistributedRectilinearMeshGenerator {
    config: RectilinearMeshConfig,
    topology: Box<dyn ElementTopology>,
    partitioner: Partitioner,
}

impl DistributedRectilinearMeshGenerator {
    /// Validate `config` and pick the element topology and partitioner.
    pub fn new(config: RectilinearMeshConfig) -> Result<Self, MeshGenError> {
        config.validate()?;
        let topology = topology_for(config.elem_type()?, config.dims())?;
        let partitioner = match config.partition.method {
            PartitionMethod::Graph => resolve_partitioner(
                &config.partition.part_package,
                config.partition.num_parts_per_compute_node,
            )?,
            _ => Partitioner::Distributed(Box::new(coordinate::CoordinateBisection)),
        };
        Ok(Self {
            config,
            topology,
            partitioner,
        })
    }

    /// Like [`DistributedRectilinearMeshGenerator::new`], but graph
    /// partitioning uses `partitioner` instead of the configured package.
    pub fn with_partitioner(
        config: RectilinearMeshConfig,
        partitioner: Partitioner,
    ) -> Result<Self, MeshGenError> {
        config.validate()?;
        let topology = topology_for(config.elem_type()?, config.dims())?;
        Ok(Self {
            config,
            topology,
            partitioner,
        })
    }

    pub fn config(&self) -> &RectilinearMeshConfig {
        &self.config
    }

    pub fn topology(&self) -> &dyn ElementTopology {
        self.topology.as_ref()
    }

    /// Build this rank's owned elements and ghost layer.
    pub fn generate<C: Communicator>(&self, comm: &C) -> Result<DistributedMesh, MeshGenError> {
        let cfg = &self.config;
        let topology = self.topology.as_ref();
        let ex = Exchanger::new(comm);
        let (rank, size) = (ex.rank(), ex.size());

        let linear = LinearPartition::new(topology.n_elems(), size);
        if linear.is_empty(rank) {
            log::warn!(
                "rank {rank} starts with no elements ({} elements on {size} ranks)",
                topology.n_elems()
            );
        }
        let first_row = linear.range(rank).start;

        let graph = build_local_graph(topology, &linear, rank);
        let parts = assign_local_rows(
            cfg.partition.method,
            topology,
            &graph,
            &self.partitioner,
            &ex,
            TAG_PARTITION,
        )?;
        if cfg.verbose {
            log::info!("rank {rank}: rows from {first_row} assigned to {parts:?}");
        }

        let owned = migration::migrate(&ex, first_row, &parts, TAG_MIGRATE)?;
        if owned.is_empty() {
            log::warn!("rank {rank} owns no elements after partitioning");
        }
        if cfg.verbose {
            log::info!("rank {rank}: owned elements {}", owned.iter().join(" "));
        }

        let mut mesh = DistributedMesh::new(rank, size, topology.dim());
        for &id in &owned {
            topology.add_element(&mut mesh, topology.indices(id), id, rank)?;
        }

        let table = ghosts::OwnerTable {
            linear: &linear,
            parts: &parts,
        };
        ghosts::add_ghost_layers(&ex, &mut mesh, topology, &table, cfg, TAG_GHOST_OWNER)?;
        ghosts::seal(&mut mesh)?;

        if cfg.verbose {
            for elem in mesh.elems() {
                let neighbors: Vec<_> = (0..elem.n_sides()).map(|s| elem.neighbor(s)).collect();
                log::info!("rank {rank}: element {} neighbors {neighbors:?}", elem.id);
            }
        }

        for (id, name) in topology.boundary_names().iter().enumerate() {
            mesh.boundary_info_mut().set_sideset_name(id as i32, *name);
        }
        mesh.prepare_for_use(true)?;
        node_owners::assign_node_owners(&ex, &mut mesh, topology, &table, TAG_NODE_OWNER)?;

        let extents = cfg.extents();
        topology.scale_nodes(&mut mesh, &extents);
        bias::apply_bias(
            &mut mesh,
            topology.dims(),
            &extents,
            cfg.biases(),
            topology.dim(),
        )?;

        log::debug!(
            "rank {rank}: {} local elements, {} ghosts, {} nodes",
            mesh.local_elements().count(),
            mesh.ghost_elements().count(),
            mesh.n_nodes()
        );
        Ok(mesh)
    }
}
