#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level bootstrap that wires the generation systems into one pipeline.
//!
//! [`DungeonGenerator`] validates a [`GenerationConfig`] once and then turns
//! any seed into a finished [`Level`]: rooms are placed, connected, carved,
//! finished and populated, each stage drawing from its own labelled random
//! stream so that tuning one stage never reshuffles another.

use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use veiled_hollow_core::{GenerationError, TileGrid, MAP_HEIGHT, MAP_WIDTH, TILE_SIZE};
use veiled_hollow_system_connectivity::ConnectivityGraph;
use veiled_hollow_system_corridors::CorridorCarver;
use veiled_hollow_system_finishing::LayoutFinisher;
use veiled_hollow_system_population::PopulationPlanner;
use veiled_hollow_system_room_placement::RoomPlacer;
use veiled_hollow_world::{Grid, Level, LevelParts, Room, RoomEdgeKind};

const ROOMS_STREAM: &str = "rooms";
const GRAPH_STREAM: &str = "graph";
const CORRIDORS_STREAM: &str = "corridors";
const POPULATION_STREAM: &str = "population";

/// Every tuning value the generation pipeline reads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of grid columns.
    pub map_columns: u32,
    /// Number of grid rows.
    pub map_rows: u32,
    /// Side length of one cell in world units.
    pub tile_size: f32,
    /// Room sampling and separation.
    pub rooms: veiled_hollow_system_room_placement::Config,
    /// Graph construction.
    pub connectivity: veiled_hollow_system_connectivity::Config,
    /// Corridor carving.
    pub corridors: veiled_hollow_system_corridors::Config,
    /// Border enforcement and door placement.
    pub finishing: veiled_hollow_system_finishing::Config,
    /// Item and enemy placement.
    pub population: veiled_hollow_system_population::Config,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            map_columns: MAP_WIDTH,
            map_rows: MAP_HEIGHT,
            tile_size: TILE_SIZE,
            rooms: Default::default(),
            connectivity: Default::default(),
            corridors: Default::default(),
            finishing: Default::default(),
            population: Default::default(),
        }
    }
}

impl GenerationConfig {
    /// Rejects combinations of values the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let invalid = |reason| Err(GenerationError::InvalidConfig { reason });

        if self.map_columns == 0 || self.map_rows == 0 {
            return invalid("map dimensions must be non-zero");
        }
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return invalid("tile size must be positive");
        }
        if self.corridors.corridor_width == 0 {
            return invalid("corridor width must be non-zero");
        }
        if self.corridors.border_thickness != self.finishing.border_thickness {
            return invalid("corridor and finishing border thickness differ");
        }
        if self.rooms.margin < self.finishing.border_thickness {
            return invalid("room margin must cover the border");
        }
        if self.rooms.room_spacing < self.corridors.corridor_width.div_ceil(2) {
            return invalid("room spacing must fit half a corridor");
        }
        let room_sizes = [self.rooms.size_mean, self.rooms.size_deviation];
        if room_sizes.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return invalid("room size mean and deviation must be finite and non-negative");
        }
        if !(0.0..=1.0).contains(&self.connectivity.extra_edge_fraction) {
            return invalid("extra edge fraction must lie in [0, 1]");
        }
        if self.finishing.door_size == 0 {
            return invalid("door size must be non-zero");
        }
        if self.population.min_enemies > self.population.max_enemies {
            return invalid("minimum enemies exceed maximum enemies");
        }
        Ok(())
    }
}

/// Seeded level generator built from a validated configuration.
#[derive(Clone, Debug)]
pub struct DungeonGenerator {
    config: GenerationConfig,
    placer: RoomPlacer,
    connectivity: ConnectivityGraph,
    carver: CorridorCarver,
    finisher: LayoutFinisher,
    population: PopulationPlanner,
}

impl DungeonGenerator {
    /// Validates `config` and prepares every stage.
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        config.validate()?;
        Ok(Self {
            placer: RoomPlacer::new(config.rooms.clone()),
            connectivity: ConnectivityGraph::new(config.connectivity.clone()),
            carver: CorridorCarver::new(config.corridors.clone()),
            finisher: LayoutFinisher::new(config.finishing.clone()),
            population: PopulationPlanner::new(config.population.clone()),
            config,
        })
    }

    /// Configuration the generator was built from.
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generates the level for `seed`.
    ///
    /// The same seed and configuration always yield the same level. Fails only
    /// when no room survives placement.
    pub fn generate(&self, seed: u64) -> Result<Level, GenerationError> {
        let mut grid = Grid::new(self.config.map_columns, self.config.map_rows);

        let placement = self
            .placer
            .place(&mut grid, &mut stage_rng(seed, ROOMS_STREAM))?;
        let rooms = placement.rooms;
        let starting_room = rooms
            .first()
            .map(Room::id)
            .ok_or(GenerationError::EmptyRoomList)?;

        let graph = self
            .connectivity
            .build(&rooms, &mut stage_rng(seed, GRAPH_STREAM))?;
        let corridors = self.carver.carve_all(
            &mut grid,
            &rooms,
            &graph,
            &mut stage_rng(seed, CORRIDORS_STREAM),
        );
        let report = self.finisher.finish(&mut grid, &rooms);
        let manifest = self.population.populate(
            &rooms,
            grid.view(),
            starting_room,
            &mut stage_rng(seed, POPULATION_STREAM),
        );

        let count = |kind| {
            graph
                .edges()
                .iter()
                .filter(|edge| edge.kind() == kind)
                .count()
        };
        info!(
            "seed {seed}: {} rooms ({} rejected), {} spanning + {} loop + {} fallback edges, {} doors, {} spawns ({} enemies)",
            rooms.len(),
            placement.rejected,
            count(RoomEdgeKind::Spanning),
            count(RoomEdgeKind::Loop),
            count(RoomEdgeKind::Fallback),
            report.doors.len(),
            manifest.len(),
            manifest.enemy_count()
        );

        Level::assemble(LevelParts {
            seed,
            tile_grid: TileGrid::new(
                self.config.map_columns,
                self.config.map_rows,
                self.config.tile_size,
            ),
            grid,
            rooms,
            starting_room,
            graph,
            corridors,
            doors: report.doors,
            manifest,
        })
    }
}

/// Deterministic random stream for one pipeline stage.
fn stage_rng(seed: u64, label: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_labeled_seed(seed, label))
}

fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
