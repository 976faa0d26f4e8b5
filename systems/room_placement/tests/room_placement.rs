use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use veiled_hollow_core::{CellState, RoomId};
use veiled_hollow_system_room_placement::{Config, RoomPlacer};
use veiled_hollow_world::Grid;

#[test]
fn default_parameters_never_lose_every_room() {
    let placer = RoomPlacer::default();

    for seed in 0..1_000 {
        let mut grid = Grid::new(70, 70);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let placement = placer
            .place(&mut grid, &mut rng)
            .unwrap_or_else(|error| panic!("seed {seed} failed: {error}"));
        assert!(
            !placement.rooms.is_empty(),
            "seed {seed} produced no rooms"
        );
        assert_eq!(
            placement.rooms.len() + placement.rejected,
            placement.candidates,
            "every candidate is either accepted or rejected"
        );
    }
}

#[test]
fn accepted_rooms_keep_their_spacing_and_margin() {
    let config = Config::default();
    let placer = RoomPlacer::new(config.clone());

    for seed in 0..200 {
        let mut grid = Grid::new(70, 70);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let placement = placer.place(&mut grid, &mut rng).expect("rooms placed");

        for (index, room) in placement.rooms.iter().enumerate() {
            let bounds = room.bounds();
            assert_eq!(room.id(), RoomId::new(index as u32), "ids follow list order");
            assert!(bounds.size().width() > config.min_room_size);
            assert!(bounds.size().height() > config.min_room_size);
            assert!(bounds.left() >= config.margin && bounds.top() >= config.margin);
            assert!(bounds.right() <= 70 - config.margin);
            assert!(bounds.bottom() <= 70 - config.margin);

            for other in &placement.rooms[index + 1..] {
                assert!(
                    !bounds.overlaps_with_spacing(&other.bounds(), config.room_spacing),
                    "seed {seed}: rooms {:?} and {:?} crowd each other",
                    room.id(),
                    other.id()
                );
            }
        }
    }
}

#[test]
fn accepted_rooms_are_stamped_open() {
    let placer = RoomPlacer::default();
    let mut grid = Grid::new(70, 70);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let placement = placer.place(&mut grid, &mut rng).expect("rooms placed");

    let open_cells = grid
        .view()
        .iter()
        .filter(|state| *state == CellState::Open)
        .count();
    let room_cells: u32 = placement
        .rooms
        .iter()
        .map(|room| room.bounds().size().width() * room.bounds().size().height())
        .sum();
    assert_eq!(open_cells, room_cells as usize);

    for room in &placement.rooms {
        assert!(room.bounds().cells().all(|cell| grid.state(cell) == CellState::Open));
    }
}

#[test]
fn same_seed_places_same_rooms() {
    let placer = RoomPlacer::default();
    let run = |seed| {
        let mut grid = Grid::new(70, 70);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let placement = placer.place(&mut grid, &mut rng).expect("rooms placed");
        (placement.rooms, grid)
    };

    assert_eq!(run(17), run(17));
}
