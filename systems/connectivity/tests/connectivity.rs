use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use veiled_hollow_core::{CellCoord, CellRect, CellRectSize, RoomId};
use veiled_hollow_system_connectivity::{Config, ConnectivityGraph};
use veiled_hollow_world::{Room, RoomEdgeKind};

fn scattered_rooms(rng: &mut ChaCha8Rng, count: u32) -> Vec<Room> {
    (0..count)
        .map(|index| {
            let column = (index % 5) * 14 + rng.gen_range(0..4);
            let row = (index / 5) * 14 + rng.gen_range(0..4);
            Room::new(
                RoomId::new(index),
                CellRect::from_origin_and_size(
                    CellCoord::new(column, row),
                    CellRectSize::new(rng.gen_range(9..12), rng.gen_range(9..12)),
                ),
            )
        })
        .collect()
}

#[test]
fn graphs_always_connect_every_room() {
    let system = ConnectivityGraph::default();

    for seed in 0..200 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let count = rng.gen_range(1..=20);
        let rooms = scattered_rooms(&mut rng, count);
        let graph = system.build(&rooms, &mut rng).expect("graph");

        assert_eq!(graph.room_count(), rooms.len());
        assert!(graph.is_connected(), "seed {seed} left rooms disconnected");
        for edge in graph.edges() {
            assert_ne!(edge.a(), edge.b(), "self loops are never stored");
        }
    }
}

#[test]
fn lattice_of_cocircular_centers_is_connected() {
    let rooms: Vec<Room> = (0..9)
        .map(|index| {
            Room::new(
                RoomId::new(index),
                CellRect::from_origin_and_size(
                    CellCoord::new(4 + (index % 3) * 14, 4 + (index / 3) * 14),
                    CellRectSize::new(10, 10),
                ),
            )
        })
        .collect();
    let system = ConnectivityGraph::default();

    for seed in 0..20 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let graph = system.build(&rooms, &mut rng).expect("graph");
        assert!(graph.is_connected(), "seed {seed} left a lattice room behind");
        assert!(graph.edges().len() >= rooms.len() - 1);
    }
}

#[test]
fn backbone_has_one_edge_per_extra_room() {
    let system = ConnectivityGraph::new(Config {
        extra_edge_fraction: 0.5,
    });

    for seed in 0..100 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let rooms = scattered_rooms(&mut rng, 15);
        let graph = system.build(&rooms, &mut rng).expect("graph");

        let count = |kind| {
            graph
                .edges()
                .iter()
                .filter(|edge| edge.kind() == kind)
                .count()
        };
        let backbone = count(RoomEdgeKind::Spanning) + count(RoomEdgeKind::Fallback);
        assert_eq!(backbone, rooms.len() - 1, "seed {seed}: backbone is a tree");
        assert!(count(RoomEdgeKind::Spanning) > 0, "seed {seed}: triangulation used");
        assert!(
            count(RoomEdgeKind::Loop) <= rooms.len(),
            "seed {seed}: loops stay a fraction of the leftovers"
        );
    }
}

#[test]
fn loop_edges_are_chosen_deterministically() {
    let system = ConnectivityGraph::default();
    let build = |seed| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let rooms = scattered_rooms(&mut rng, 12);
        system.build(&rooms, &mut rng).expect("graph")
    };

    assert_eq!(build(5), build(5));
}
