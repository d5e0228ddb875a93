//! METIS k-way partitioning (feature `metis-support`).

use metis::{Graph, Idx};

use crate::algs::dual_graph::CsrGraph;
use crate::mesh_error::MeshGenError;
use crate::partitioning::GraphPartitioner;

#[derive(Clone, Copy, Debug, Default)]
pub struct MetisKway;

fn failed(reason: impl std::fmt::Debug) -> MeshGenError {
    MeshGenError::PartitionerFailed {
        package: "metis".into(),
        reason: format!("{reason:?}"),
    }
}

impl GraphPartitioner for MetisKway {
    fn name(&self) -> &str {
        "metis"
    }

    fn partition(&self, graph: &CsrGraph, n_parts: usize) -> Result<Vec<usize>, MeshGenError> {
        let n = graph.n_vertices();
        // METIS rejects nparts == 1 and empty graphs.
        if n_parts <= 1 || n == 0 {
            return Ok(vec![0; n]);
        }
        let xadj: Vec<Idx> = graph.xadj.iter().map(|&x| x as Idx).collect();
        let adjncy: Vec<Idx> = graph.adjncy.iter().map(|&v| v as Idx).collect();
        let vwgt: Vec<Idx> = graph.vwgt.iter().map(|&w| w as Idx).collect();
        let mut part: Vec<Idx> = vec![0; n];

        Graph::new(1, n_parts as Idx, &xadj, &adjncy)
            .map_err(failed)?
            .set_vwgt(&vwgt)
            .part_kway(&mut part)
            .map_err(failed)?;

        Ok(part.into_iter().map(|p| p as usize).collect())
    }
}
