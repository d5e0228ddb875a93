use dist_rect_mesh::prelude::*;

fn serial(config: RectilinearMeshConfig) -> DistributedMesh {
    DistributedRectilinearMeshGenerator::new(config)
        .unwrap()
        .generate(&NoComm)
        .unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[test]
fn two_by_two_quads() {
    let mut config = RectilinearMeshConfig::new(2);
    config.nx = 2;
    config.ny = 2;
    let mesh = serial(config);

    assert_eq!(mesh.n_elem(), 4);
    assert_eq!(mesh.n_nodes(), 9);
    assert!(mesh.is_prepared());
    let info = mesh.boundary_info();
    for name in ["bottom", "right", "top", "left"] {
        let id = info.boundary_id_by_name(name).unwrap();
        assert_eq!(info.side_count(id), 2, "{name}");
        assert_eq!(info.nodes_with_boundary(id).len(), 3, "{name}");
    }
    for elem in mesh.elems() {
        assert_eq!(elem.processor_id, 0);
        for side in 0..4 {
            let state = mesh.side_state(elem.id, side).unwrap();
            assert!(matches!(state, SideState::Linked(_) | SideState::Boundary));
        }
    }
    // element 0 touches element 1 on its right and element 2 on top
    assert_eq!(mesh.neighbor(0, 1).unwrap(), Some(Neighbor::Local(1)));
    assert_eq!(mesh.neighbor(0, 2).unwrap(), Some(Neighbor::Local(2)));
}

#[test]
fn adding_an_element_twice_is_a_no_op() {
    let topo = topology_for(ElemType::Quad4, Dims::new(2, 2, 1)).unwrap();
    let mut mesh = DistributedMesh::new(0, 1, 2);
    assert!(topo.add_element(&mut mesh, [1, 1, 0], 3, 0).unwrap());
    let before = (mesh.n_elem(), mesh.n_nodes(), mesh.boundary_info().side_list());
    assert!(!topo.add_element(&mut mesh, [1, 1, 0], 3, 0).unwrap());
    assert_eq!(
        (mesh.n_elem(), mesh.n_nodes(), mesh.boundary_info().side_list()),
        before
    );
}

#[test]
fn physical_box_is_honored() {
    let mut config = RectilinearMeshConfig::new(3);
    config.nx = 2;
    config.ny = 1;
    config.nz = 4;
    config.xmin = -1.0;
    config.xmax = 3.0;
    config.zmin = 10.0;
    config.zmax = 12.0;
    let mesh = serial(config);
    assert_eq!(mesh.n_elem(), 8);
    assert_eq!(mesh.n_nodes(), 3 * 2 * 5);
    let (mut lo, mut hi) = ([f64::MAX; 3], [f64::MIN; 3]);
    for node in mesh.nodes() {
        for a in 0..3 {
            lo[a] = lo[a].min(node.coords[a]);
            hi[a] = hi[a].max(node.coords[a]);
        }
    }
    assert_eq!(lo, [-1.0, 0.0, 10.0]);
    assert_eq!(hi, [3.0, 1.0, 12.0]);
}

#[test]
fn bias_moves_the_middle_node() {
    let mut config = RectilinearMeshConfig::new(1);
    config.nx = 2;
    config.bias_x = 2.0;
    let mesh = serial(config);
    assert!(close(mesh.node(1).unwrap().coords[0], 1.0 / 3.0));
    assert!(close(mesh.node(2).unwrap().coords[0], 1.0));
}

#[test]
fn bias_places_midside_nodes_between_biased_vertices() {
    let mut config = RectilinearMeshConfig::new(1);
    config.nx = 2;
    config.bias_x = 2.0;
    config.elem_type = Some(ElemType::Edge3);
    let mesh = serial(config);
    // vertices at 0, 1/3, 1 and midsides at 1/6, 2/3
    let x = |id: u64| mesh.node(id).unwrap().coords[0];
    assert!(close(x(2), 1.0 / 3.0));
    assert!(close(x(1), 1.0 / 6.0));
    assert!(close(x(3), 2.0 / 3.0));
}

#[test]
fn quad9_grid_has_midside_and_center_nodes() {
    let mut config = RectilinearMeshConfig::new(2);
    config.nx = 2;
    config.ny = 1;
    config.elem_type = Some(ElemType::Quad9);
    let mesh = serial(config);
    assert_eq!(mesh.n_elem(), 2);
    assert_eq!(mesh.n_nodes(), 5 * 3);
    assert_eq!(mesh.neighbor(0, 1).unwrap(), Some(Neighbor::Local(1)));
    let right = mesh.boundary_info().boundary_id_by_name("right").unwrap();
    // corners plus the midside node of the right edge
    assert_eq!(mesh.boundary_info().nodes_with_boundary(right).len(), 3);
}

#[test]
fn config_from_json() {
    let json = r#"{
        "dim": 2,
        "nx": 3,
        "ny": 2,
        "xmax": 6.0,
        "elem_type": "QUAD",
        "partition": { "method": "square" }
    }"#;
    let config: RectilinearMeshConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.elem_type, Some(ElemType::Quad4));
    assert_eq!(config.partition.method, PartitionMethod::Square);
    let mesh = serial(config);
    assert_eq!(mesh.n_elem(), 6);
    assert!(mesh.nodes().any(|n| close(n.coords[0], 6.0)));
}

#[test]
fn unknown_config_fields_are_rejected() {
    let json = r#"{ "dim": 1, "nx": 3, "num_cores_for_partition": 2 }"#;
    assert!(serde_json::from_str::<RectilinearMeshConfig>(json).is_err());
}

#[test]
fn invalid_configs_fail_before_any_communication() {
    let mut bias = RectilinearMeshConfig::new(2);
    bias.bias_y = 2.5;
    let mut dims = RectilinearMeshConfig::new(3);
    dims.nz = 0;
    let mut elem = RectilinearMeshConfig::new(1);
    elem.elem_type = Some(ElemType::Hex8);
    let mut layers = RectilinearMeshConfig::new(1);
    layers.num_side_layers = 0;

    for config in [bias, dims, elem, layers] {
        let err = DistributedRectilinearMeshGenerator::new(config).unwrap_err();
        assert!(err.is_configuration_error(), "{err}");
    }
}

#[test]
fn serial_ignores_partition_method() {
    for method in [PartitionMethod::Linear, PartitionMethod::Square, PartitionMethod::Graph] {
        let mut config = RectilinearMeshConfig::new(3);
        config.nx = 2;
        config.ny = 2;
        config.nz = 2;
        config.partition.method = method;
        config.num_side_layers = 2;
        config.ghost_point_neighbors = true;
        let mesh = serial(config);
        assert_eq!(mesh.local_elements().count(), 8);
        assert_eq!(mesh.ghost_elements().count(), 0);
        mesh.validate_sides().unwrap();
    }
}
