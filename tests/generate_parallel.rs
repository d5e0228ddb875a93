use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dist_rect_mesh::algs::dual_graph::DistributedGraph;
use dist_rect_mesh::partitioning::coordinate::CoordinateBisection;
use dist_rect_mesh::prelude::*;

fn run_ranks(
    n_ranks: usize,
    generator: &DistributedRectilinearMeshGenerator,
) -> Vec<Result<DistributedMesh, MeshGenError>> {
    let world = LocalComm::world(n_ranks);
    std::thread::scope(|s| {
        let handles: Vec<_> = world
            .iter()
            .map(|comm| s.spawn(move || generator.generate(comm)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("rank thread panicked"))
            .collect()
    })
}

fn generate_on(n_ranks: usize, config: RectilinearMeshConfig) -> Vec<DistributedMesh> {
    let generator = DistributedRectilinearMeshGenerator::new(config).unwrap();
    run_ranks(n_ranks, &generator)
        .into_iter()
        .map(|r| r.unwrap())
        .collect()
}

/// Owner of every element across all ranks; panics on double ownership.
fn global_owners(meshes: &[DistributedMesh]) -> BTreeMap<u64, usize> {
    let mut owners = BTreeMap::new();
    for mesh in meshes {
        for elem in mesh.local_elements() {
            let prev = owners.insert(elem.id, mesh.rank());
            assert!(prev.is_none(), "element {} owned twice", elem.id);
        }
    }
    owners
}

fn check_consistency(meshes: &[DistributedMesh], n_elems: u64) {
    let owners = global_owners(meshes);
    assert_eq!(owners.keys().copied().collect::<Vec<_>>(), (0..n_elems).collect::<Vec<_>>());
    for mesh in meshes {
        mesh.validate_sides().unwrap();
        for ghost in mesh.ghost_elements() {
            assert_eq!(owners[&ghost.id], ghost.processor_id, "ghost {} owner", ghost.id);
            assert_eq!(mesh.ownership().is_ghost(ghost.id), Some(true));
        }
        // owned elements never face a remote side
        for elem in mesh.local_elements() {
            for side in 0..elem.n_sides() {
                assert_ne!(elem.neighbor(side), Some(Neighbor::Remote));
            }
        }
    }
    let mut node_owner: BTreeMap<u64, Option<usize>> = BTreeMap::new();
    for mesh in meshes {
        for node in mesh.nodes() {
            assert!(node.processor_id.is_some(), "node {} has no owner", node.id);
            if let Some(prev) = node_owner.insert(node.id, node.processor_id) {
                assert_eq!(prev, node.processor_id, "node {} owner differs", node.id);
            }
        }
    }
}

#[test]
fn line_on_two_ranks() {
    let mut config = RectilinearMeshConfig::new(1);
    config.nx = 4;
    config.xmax = 4.0;
    let meshes = generate_on(2, config);
    check_consistency(&meshes, 4);

    let mut node_users: BTreeMap<u64, BTreeSet<u64>> = BTreeMap::new();
    let mut coords = BTreeMap::new();
    for mesh in &meshes {
        for elem in mesh.local_elements() {
            for &n in &elem.nodes {
                node_users.entry(n).or_default().insert(elem.id);
                coords.insert(n, mesh.node(n).unwrap().coords[0]);
            }
        }
    }
    assert_eq!(node_users.len(), 5);
    for n in 1..4 {
        assert_eq!(node_users[&n].len(), 2, "node {n}");
    }
    assert_eq!(coords[&0], 0.0);
    assert_eq!(coords[&4], 4.0);

    let left_mesh = meshes.iter().find(|m| m.contains_node(0)).unwrap();
    let left = left_mesh.boundary_info().boundary_id_by_name("left").unwrap();
    assert!(left_mesh.boundary_info().nodes_with_boundary(left).contains(&0));
    let right_mesh = meshes.iter().find(|m| m.contains_node(4)).unwrap();
    let right = right_mesh.boundary_info().boundary_id_by_name("right").unwrap();
    assert!(right_mesh.boundary_info().nodes_with_boundary(right).contains(&4));
}

#[test]
fn line_split_has_one_ghost_per_side() {
    let mut config = RectilinearMeshConfig::new(1);
    config.nx = 4;
    let meshes = generate_on(2, config);
    for mesh in &meshes {
        assert_eq!(mesh.local_elements().count(), 2);
        assert_eq!(mesh.ghost_elements().count(), 1);
        let ghost = mesh.ghost_elements().next().unwrap();
        let remote = (0..2)
            .filter(|&s| ghost.neighbor(s) == Some(Neighbor::Remote))
            .count();
        assert_eq!(remote, 1);
    }
}

/// Sends element `v` to rank `(v * 3 + 1) % P`: scattered, no locality.
#[derive(Debug)]
struct Scatter;

impl RowPartitioner for Scatter {
    fn name(&self) -> &str {
        "scatter"
    }

    fn partition_rows(
        &self,
        graph: &DistributedGraph,
        _topology: &dyn ElementTopology,
        rank: usize,
        n_parts: usize,
    ) -> Result<Vec<usize>, MeshGenError> {
        let first = graph.first_row(rank) as usize;
        Ok((first..first + graph.n_local())
            .map(|v| (v * 3 + 1) % n_parts)
            .collect())
    }
}

fn scattered(config: RectilinearMeshConfig) -> DistributedRectilinearMeshGenerator {
    DistributedRectilinearMeshGenerator::with_partitioner(
        config,
        Partitioner::Distributed(Box::new(Scatter)),
    )
    .unwrap()
}

#[derive(Debug, Default)]
struct Seen {
    calls: AtomicUsize,
    most_rows: AtomicUsize,
}

/// Coordinate bisection that records how many rows each call was given.
#[derive(Debug)]
struct RowSpy(Arc<Seen>);

impl RowPartitioner for RowSpy {
    fn name(&self) -> &str {
        "row-spy"
    }

    fn partition_rows(
        &self,
        graph: &DistributedGraph,
        topology: &dyn ElementTopology,
        rank: usize,
        n_parts: usize,
    ) -> Result<Vec<usize>, MeshGenError> {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        self.0.most_rows.fetch_max(graph.n_local(), Ordering::SeqCst);
        CoordinateBisection.partition_rows(graph, topology, rank, n_parts)
    }
}

#[test]
fn cube_on_four_ranks_with_arbitrary_distribution() {
    let mut config = RectilinearMeshConfig::new(3);
    config.nx = 2;
    config.ny = 2;
    config.nz = 2;
    let generator = scattered(config);
    let meshes: Vec<_> = run_ranks(4, &generator)
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    check_consistency(&meshes, 8);
    for (id, owner) in global_owners(&meshes) {
        assert_eq!(owner, (id as usize * 3 + 1) % 4);
    }
}

#[test]
fn scattered_hex_nodes_take_the_global_minimum_owner() {
    let mut config = RectilinearMeshConfig::new(3);
    config.nx = 3;
    config.ny = 3;
    config.nz = 3;
    let meshes: Vec<_> = run_ranks(4, &scattered(config))
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    check_consistency(&meshes, 27);

    let topo = topology_for(ElemType::Hex8, Dims::new(3, 3, 3)).unwrap();
    let mut expected: BTreeMap<u64, usize> = BTreeMap::new();
    for e in 0..27u64 {
        let owner = (e as usize * 3 + 1) % 4;
        for (n, _) in topo.element_nodes(topo.indices(e)) {
            let lo = expected.entry(n).or_insert(owner);
            *lo = (*lo).min(owner);
        }
    }
    for mesh in &meshes {
        for node in mesh.nodes() {
            assert_eq!(node.processor_id, Some(expected[&node.id]), "node {}", node.id);
        }
    }
}

#[test]
fn row_partitioners_only_see_local_rows() {
    let mut config = RectilinearMeshConfig::new(2);
    config.nx = 8;
    config.ny = 8;
    let seen = Arc::new(Seen::default());
    let generator = DistributedRectilinearMeshGenerator::with_partitioner(
        config,
        Partitioner::Distributed(Box::new(RowSpy(Arc::clone(&seen)))),
    )
    .unwrap();
    let meshes: Vec<_> = run_ranks(4, &generator)
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    check_consistency(&meshes, 64);
    assert_eq!(seen.calls.load(Ordering::SeqCst), 4);
    assert_eq!(seen.most_rows.load(Ordering::SeqCst), 16);
    for mesh in &meshes {
        assert_eq!(mesh.local_elements().count(), 16);
    }
}

/// Fails on rank 1 only.
#[derive(Debug)]
struct FailsOnRankOne;

impl RowPartitioner for FailsOnRankOne {
    fn name(&self) -> &str {
        "fails-on-one"
    }

    fn partition_rows(
        &self,
        graph: &DistributedGraph,
        topology: &dyn ElementTopology,
        rank: usize,
        n_parts: usize,
    ) -> Result<Vec<usize>, MeshGenError> {
        if rank == 1 {
            return Err(MeshGenError::PartitionerFailed {
                package: self.name().to_string(),
                reason: "refused".to_string(),
            });
        }
        CoordinateBisection.partition_rows(graph, topology, rank, n_parts)
    }
}

#[test]
fn local_partitioner_failure_reaches_every_rank() {
    let mut config = RectilinearMeshConfig::new(2);
    config.nx = 4;
    config.ny = 3;
    let generator = DistributedRectilinearMeshGenerator::with_partitioner(
        config,
        Partitioner::Distributed(Box::new(FailsOnRankOne)),
    )
    .unwrap();
    for result in run_ranks(3, &generator) {
        assert!(matches!(result, Err(MeshGenError::PartitionerFailed { .. })));
    }
}

#[test]
fn gathered_package_is_still_available() {
    let mut config = RectilinearMeshConfig::new(2);
    config.nx = 6;
    config.ny = 4;
    config.partition.part_package = "gathered".into();
    let meshes = generate_on(3, config);
    check_consistency(&meshes, 24);
    for mesh in &meshes {
        assert!(mesh.local_elements().count() > 0);
    }
}

#[test]
fn quad_grid_partition_methods_agree_on_invariants() {
    for method in [PartitionMethod::Linear, PartitionMethod::Graph, PartitionMethod::Square] {
        let mut config = RectilinearMeshConfig::new(2);
        config.nx = 6;
        config.ny = 4;
        config.partition.method = method;
        let meshes = generate_on(4, config);
        check_consistency(&meshes, 24);
        for mesh in &meshes {
            assert!(mesh.local_elements().count() > 0, "{method:?}");
        }
    }
}

#[test]
fn square_method_builds_blocks() {
    let mut config = RectilinearMeshConfig::new(2);
    config.nx = 4;
    config.ny = 4;
    config.partition.method = PartitionMethod::Square;
    let meshes = generate_on(4, config);
    for mesh in &meshes {
        assert_eq!(mesh.local_elements().count(), 4);
        // a 2x2 block has two exposed sides, each facing two ghosts
        assert_eq!(mesh.ghost_elements().count(), 4);
    }
}

#[test]
fn hierarchical_partitioner() {
    let mut config = RectilinearMeshConfig::new(2);
    config.nx = 8;
    config.ny = 2;
    config.partition.part_package = "hierarch".into();
    config.partition.num_parts_per_compute_node = 2;
    let meshes = generate_on(4, config);
    check_consistency(&meshes, 16);
}

#[test]
fn hierarchical_partitioner_rejects_bad_hint_on_every_rank() {
    let mut config = RectilinearMeshConfig::new(1);
    config.nx = 6;
    config.partition.part_package = "hierarch".into();
    config.partition.num_parts_per_compute_node = 2;
    let generator = DistributedRectilinearMeshGenerator::new(config).unwrap();
    for result in run_ranks(3, &generator) {
        assert!(result.is_err());
    }
}

#[test]
fn second_side_layer_grows_the_halo() {
    let mut config = RectilinearMeshConfig::new(1);
    config.nx = 8;
    config.partition.method = PartitionMethod::Linear;
    config.num_side_layers = 2;
    let meshes = generate_on(2, config);
    check_consistency(&meshes, 8);
    let ghosts: Vec<u64> = meshes[0].ghost_elements().map(|e| e.id).collect();
    assert_eq!(ghosts, vec![4, 5]);
    assert_eq!(meshes[0].neighbor(4, 1).unwrap(), Some(Neighbor::Local(5)));
    assert_eq!(meshes[0].neighbor(5, 1).unwrap(), Some(Neighbor::Remote));
}

#[test]
fn point_neighbors_pull_in_diagonals() {
    let mut config = RectilinearMeshConfig::new(2);
    config.nx = 2;
    config.ny = 2;
    config.partition.method = PartitionMethod::Linear;
    let faces = generate_on(4, config.clone());
    config.ghost_point_neighbors = true;
    let corners = generate_on(4, config);

    for (f, c) in faces.iter().zip(&corners) {
        assert_eq!(f.ghost_elements().count(), 2);
        assert_eq!(c.ghost_elements().count(), 3);
        c.validate_sides().unwrap();
    }
}

#[test]
fn more_ranks_than_elements() {
    let mut config = RectilinearMeshConfig::new(1);
    config.nx = 2;
    let meshes = generate_on(3, config);
    check_consistency(&meshes, 2);
    assert_eq!(meshes.iter().filter(|m| m.n_elem() == 0).count(), 1);
}

#[test]
fn node_owners_are_the_smallest_touching_rank() {
    let mut config = RectilinearMeshConfig::new(1);
    config.nx = 4;
    config.partition.method = PartitionMethod::Linear;
    let meshes = generate_on(2, config);
    // node 2 is shared by element 1 (rank 0) and element 2 (rank 1)
    for mesh in &meshes {
        assert_eq!(mesh.node(2).unwrap().processor_id, Some(0));
    }
}

#[test]
fn biased_hex_grid_matches_across_ranks() {
    let mut config = RectilinearMeshConfig::new(3);
    config.nx = 3;
    config.ny = 2;
    config.nz = 2;
    config.bias_x = 1.5;
    config.bias_z = 0.7;
    let meshes = generate_on(3, config);
    check_consistency(&meshes, 12);

    let mut seen: BTreeMap<u64, [f64; 3]> = BTreeMap::new();
    for mesh in &meshes {
        for node in mesh.nodes() {
            if let Some(prev) = seen.insert(node.id, node.coords) {
                assert_eq!(prev, node.coords, "node {} differs between ranks", node.id);
            }
        }
    }
}
