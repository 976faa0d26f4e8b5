#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Population planning: decides where items and enemies appear in a finished layout.

use log::debug;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use veiled_hollow_core::{CellCoord, CellState, EnemyKind, GridView, RoomId, SpawnTag};
use veiled_hollow_world::{Room, SpawnManifest};

/// Tuning knobs controlling how densely rooms are populated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether every non-starting room receives an item at its center.
    pub place_items: bool,
    /// Fewest enemies a room aims for.
    pub min_enemies: u32,
    /// Most enemies a room may receive.
    pub max_enemies: u32,
    /// Random cells tried per room before settling for fewer enemies.
    pub placement_attempts: u32,
    /// Half side of the square around an enemy that must be entirely open floor.
    pub clearance_radius: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            place_items: true,
            min_enemies: 1,
            max_enemies: 2,
            placement_attempts: 10,
            clearance_radius: 3,
        }
    }
}

/// Pure system that fills a spawn manifest.
#[derive(Clone, Debug, Default)]
pub struct PopulationPlanner {
    config: Config,
}

impl PopulationPlanner {
    /// Creates a planner using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration the planner runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Plans spawns for every room except `starting_room`.
    ///
    /// Rooms that run out of attempts simply get fewer enemies.
    pub fn populate<R: Rng + ?Sized>(
        &self,
        rooms: &[Room],
        grid: GridView<'_>,
        starting_room: RoomId,
        rng: &mut R,
    ) -> SpawnManifest {
        let mut manifest = SpawnManifest::new();

        for room in rooms.iter().filter(|room| room.id() != starting_room) {
            if self.config.place_items && grid.is_open(room.center()) {
                let _ = manifest.insert(room.center(), SpawnTag::Item);
            }

            let wanted = self.enemy_target(rng);
            let placed = self.place_enemies(room, grid, wanted, &mut manifest, rng);
            if placed < wanted {
                debug!(
                    "room {} received {placed} of {wanted} enemies after {} attempts",
                    room.id().get(),
                    self.config.placement_attempts
                );
            }
        }

        manifest
    }

    fn enemy_target<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let low = self.config.min_enemies.min(self.config.max_enemies);
        rng.gen_range(low..=self.config.max_enemies.max(low))
    }

    fn place_enemies<R: Rng + ?Sized>(
        &self,
        room: &Room,
        grid: GridView<'_>,
        wanted: u32,
        manifest: &mut SpawnManifest,
        rng: &mut R,
    ) -> u32 {
        let bounds = room.bounds();
        let columns = bounds.left() + 1..bounds.right().saturating_sub(1);
        let rows = bounds.top() + 1..bounds.bottom().saturating_sub(1);
        if columns.is_empty() || rows.is_empty() {
            return 0;
        }

        let mut placed = 0;
        for _ in 0..self.config.placement_attempts {
            if placed >= wanted {
                break;
            }

            let cell = CellCoord::new(
                rng.gen_range(columns.clone()),
                rng.gen_range(rows.clone()),
            );
            if manifest.get(cell).is_some()
                || !is_valid_enemy_position(grid, cell, self.config.clearance_radius)
            {
                continue;
            }

            let kind = EnemyKind::ALL
                .choose(rng)
                .copied()
                .unwrap_or(EnemyKind::Skeleton);
            if manifest.insert(cell, SpawnTag::Enemy(kind)) {
                placed += 1;
            }
        }
        placed
    }
}

/// Reports whether every cell within `radius` of `cell`, on both axes, is open floor.
#[must_use]
pub fn is_valid_enemy_position(grid: GridView<'_>, cell: CellCoord, radius: u32) -> bool {
    let radius = i64::from(radius);
    let (column, row) = (i64::from(cell.column()), i64::from(cell.row()));

    (row - radius..=row + radius).all(|y| {
        (column - radius..=column + radius).all(|x| grid.state_at(x, y) == CellState::Open)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use veiled_hollow_core::{CellRect, CellRectSize};
    use veiled_hollow_world::Grid;

    fn room(index: u32, column: u32, row: u32, size: u32) -> Room {
        Room::new(
            RoomId::new(index),
            CellRect::from_origin_and_size(
                CellCoord::new(column, row),
                CellRectSize::new(size, size),
            ),
        )
    }

    #[test]
    fn clearance_requires_open_square() {
        let mut grid = Grid::new(20, 20);
        grid.fill_rect(room(0, 2, 2, 10).bounds(), CellState::Open);
        let view = grid.view();

        assert!(is_valid_enemy_position(view, CellCoord::new(6, 6), 3));
        assert!(is_valid_enemy_position(view, CellCoord::new(5, 5), 3));
        assert!(!is_valid_enemy_position(view, CellCoord::new(4, 6), 3));
        assert!(!is_valid_enemy_position(view, CellCoord::new(9, 9), 3));
        assert!(is_valid_enemy_position(view, CellCoord::new(2, 2), 0));
        assert!(!is_valid_enemy_position(view, CellCoord::new(0, 0), 0));
    }

    #[test]
    fn starting_room_stays_empty() {
        let rooms = [room(0, 2, 2, 12), room(1, 20, 2, 12)];
        let mut grid = Grid::new(40, 20);
        for room in &rooms {
            grid.fill_rect(room.bounds(), CellState::Open);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let manifest =
            PopulationPlanner::default().populate(&rooms, grid.view(), RoomId::new(0), &mut rng);

        assert!(manifest
            .iter()
            .all(|(cell, _)| !rooms[0].bounds().contains(cell)));
        assert_eq!(manifest.get(rooms[1].center()), Some(SpawnTag::Item));
    }

    #[test]
    fn items_need_an_open_center() {
        let rooms = [room(0, 2, 2, 12), room(1, 20, 2, 12)];
        let mut grid = Grid::new(40, 20);
        for room in &rooms {
            grid.fill_rect(room.bounds(), CellState::Open);
        }
        let _ = grid.set(rooms[1].center(), CellState::Door);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let manifest =
            PopulationPlanner::default().populate(&rooms, grid.view(), RoomId::new(0), &mut rng);

        assert_eq!(manifest.get(rooms[1].center()), None);
    }

    #[test]
    fn cramped_rooms_receive_no_enemies() {
        let rooms = [room(0, 2, 2, 6), room(1, 12, 2, 6)];
        let mut grid = Grid::new(30, 12);
        for room in &rooms {
            grid.fill_rect(room.bounds(), CellState::Open);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let manifest =
            PopulationPlanner::default().populate(&rooms, grid.view(), RoomId::new(0), &mut rng);

        assert_eq!(manifest.enemy_count(), 0);
        assert_eq!(manifest.len(), 1, "only the item remains");
    }

    #[test]
    fn enemy_target_respects_bounds() {
        let planner = PopulationPlanner::new(Config {
            min_enemies: 3,
            max_enemies: 1,
            ..Config::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for _ in 0..50 {
            assert_eq!(planner.enemy_target(&mut rng), 1);
        }
    }
}
