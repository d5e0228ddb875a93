use dist_rect_mesh::algs::dual_graph::build_local_graph;
use dist_rect_mesh::partitioning::block::BlockPartition;
use dist_rect_mesh::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn ranges_tile_and_owner_agrees(n_items in 0u64..500, n_procs in 1usize..40) {
        let lp = LinearPartition::new(n_items, n_procs);
        let mut next = 0;
        for rank in 0..n_procs {
            let r = lp.range(rank);
            prop_assert_eq!(r.start, next);
            next = r.end;
            for id in r {
                prop_assert_eq!(lp.owner(id), rank);
            }
        }
        prop_assert_eq!(next, n_items);
    }

    #[test]
    fn chunks_differ_by_at_most_one(n_items in 0u64..500, n_procs in 1usize..40) {
        let lp = LinearPartition::new(n_items, n_procs);
        let lens: Vec<u64> = (0..n_procs).map(|r| lp.len(r)).collect();
        let (lo, hi) = (lens.iter().min().unwrap(), lens.iter().max().unwrap());
        prop_assert!(hi - lo <= 1);
        prop_assert_eq!(lp.vtxdist().len(), n_procs + 1);
    }

    #[test]
    fn local_rows_stitch_into_a_symmetric_graph(nx in 1u64..6, ny in 1u64..6, n_procs in 1usize..5) {
        let topo = topology_for(ElemType::Quad4, Dims::new(nx, ny, 1)).unwrap();
        let lp = LinearPartition::new(topo.n_elems(), n_procs);
        let mut rows: Vec<Vec<u64>> = Vec::new();
        for rank in 0..n_procs {
            let g = build_local_graph(topo.as_ref(), &lp, rank);
            prop_assert_eq!(g.n_local() as u64, lp.len(rank));
            for local in 0..g.n_local() {
                let row = g.row(local).to_vec();
                prop_assert_eq!(row.len(), topo.num_neighbors(topo.indices(rows.len() as u64)));
                rows.push(row);
            }
        }
        for (v, row) in rows.iter().enumerate() {
            for &w in row {
                prop_assert!(rows[w as usize].contains(&(v as u64)));
            }
        }
    }

    #[test]
    fn blocks_cover_every_rank(nx in 1u64..9, ny in 1u64..9, n_procs in 1usize..9) {
        let dims = Dims::new(nx, ny, 1);
        let bp = BlockPartition::new(dims, 2, n_procs);
        for j in 0..ny {
            for i in 0..nx {
                prop_assert!(bp.owner([i, j, 0]) < n_procs);
            }
        }
    }
}

#[test]
fn four_elements_on_two_ranks() {
    let lp = LinearPartition::new(4, 2);
    assert_eq!(lp.range(0), 0..2);
    assert_eq!(lp.range(1), 2..4);
    assert_eq!(lp.vtxdist(), vec![0, 2, 4]);
}
