#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state for Veiled Hollow.
//!
//! The generation pipeline mutates a [`Grid`] in place while it runs. Once the
//! pipeline finishes, everything is frozen into a [`Level`] and only exposed
//! through the read-only [`query`] functions.

mod reachability;

use std::collections::BTreeMap;

use veiled_hollow_core::{
    CellCoord, CellRect, CellState, GenerationError, GridView, RoomId, SpawnTag, TileGrid,
};

/// Dense, row-major tile occupancy grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cells: Vec<CellState>,
}

impl Grid {
    /// Creates a grid of the provided dimensions with every cell blocked.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![CellState::Blocked; capacity],
        }
    }

    /// Provides the dimensions of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// State of the cell, or [`CellState::Blocked`] when out of range.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> CellState {
        self.view().state(cell)
    }

    /// Overwrites the state of the cell. Returns `true` when the state changed.
    pub fn set(&mut self, cell: CellCoord, state: CellState) -> bool {
        let Some(index) = self.view().index(cell) else {
            return false;
        };
        match self.cells.get_mut(index) {
            Some(slot) if *slot != state => {
                *slot = state;
                true
            }
            _ => false,
        }
    }

    /// Stamps every in-range cell of the rectangle with the provided state.
    pub fn fill_rect(&mut self, rect: CellRect, state: CellState) {
        for cell in rect.cells() {
            let _ = self.set(cell, state);
        }
    }

    /// Captures a read-only view of the grid.
    #[must_use]
    pub fn view(&self) -> GridView<'_> {
        GridView::new(&self.cells, self.columns, self.rows)
    }
}

/// Finalized rectangular room accepted by room placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Room {
    id: RoomId,
    bounds: CellRect,
}

impl Room {
    /// Creates a room with the provided identifier and bounds.
    #[must_use]
    pub const fn new(id: RoomId, bounds: CellRect) -> Self {
        Self { id, bounds }
    }

    /// Identifier of the room, equal to its index in the room list.
    #[must_use]
    pub const fn id(&self) -> RoomId {
        self.id
    }

    /// Rectangle of open floor covered by the room.
    #[must_use]
    pub const fn bounds(&self) -> CellRect {
        self.bounds
    }

    /// Center cell of the room.
    #[must_use]
    pub const fn center(&self) -> CellCoord {
        self.bounds.center()
    }
}

/// Reason an edge was added to the room graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoomEdgeKind {
    /// Minimum spanning tree backbone.
    Spanning,
    /// Extra triangulation edge that introduces a loop.
    Loop,
    /// Nearest-neighbour link added by the fallback chain or the reachability repair.
    Fallback,
}

/// Undirected connection between two rooms, stored with `a < b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoomEdge {
    a: RoomId,
    b: RoomId,
    kind: RoomEdgeKind,
}

impl RoomEdge {
    /// Creates a normalized edge between two rooms.
    #[must_use]
    pub fn new(first: RoomId, second: RoomId, kind: RoomEdgeKind) -> Self {
        let (a, b) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        Self { a, b, kind }
    }

    /// Room with the lower identifier.
    #[must_use]
    pub const fn a(&self) -> RoomId {
        self.a
    }

    /// Room with the higher identifier.
    #[must_use]
    pub const fn b(&self) -> RoomId {
        self.b
    }

    /// Reason the edge exists.
    #[must_use]
    pub const fn kind(&self) -> RoomEdgeKind {
        self.kind
    }
}

/// Undirected room graph expressed as an adjacency list over room indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoomGraph {
    edges: Vec<RoomEdge>,
    adjacency: Vec<Vec<RoomId>>,
}

impl RoomGraph {
    /// Creates an edgeless graph over `room_count` rooms.
    #[must_use]
    pub fn new(room_count: usize) -> Self {
        Self {
            edges: Vec::new(),
            adjacency: vec![Vec::new(); room_count],
        }
    }

    /// Number of rooms the graph spans.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Adds an undirected edge. Returns `false` for self loops, unknown rooms,
    /// and edges that already exist.
    pub fn add_edge(&mut self, first: RoomId, second: RoomId, kind: RoomEdgeKind) -> bool {
        if first == second
            || first.index() >= self.adjacency.len()
            || second.index() >= self.adjacency.len()
            || self.contains_edge(first, second)
        {
            return false;
        }

        self.edges.push(RoomEdge::new(first, second, kind));
        self.adjacency[first.index()].push(second);
        self.adjacency[second.index()].push(first);
        true
    }

    /// Reports whether the two rooms are directly connected.
    #[must_use]
    pub fn contains_edge(&self, first: RoomId, second: RoomId) -> bool {
        self.adjacency
            .get(first.index())
            .is_some_and(|neighbors| neighbors.contains(&second))
    }

    /// Edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[RoomEdge] {
        &self.edges
    }

    /// Rooms directly connected to `room`.
    #[must_use]
    pub fn neighbors(&self, room: RoomId) -> &[RoomId] {
        self.adjacency
            .get(room.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Marks every room reachable from `start` using an explicit stack.
    #[must_use]
    pub fn reached_from(&self, start: RoomId) -> Vec<bool> {
        let mut reached = vec![false; self.adjacency.len()];
        if start.index() >= reached.len() {
            return reached;
        }
        reached[start.index()] = true;

        let mut stack = vec![start];
        while let Some(room) = stack.pop() {
            for &neighbor in self.neighbors(room) {
                if !reached[neighbor.index()] {
                    reached[neighbor.index()] = true;
                    stack.push(neighbor);
                }
            }
        }

        reached
    }

    /// Reports whether every room is reachable from every other room.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.adjacency.is_empty()
            || self
                .reached_from(RoomId::new(0))
                .into_iter()
                .all(|reached| reached)
    }
}

/// Cells opened while carving one graph edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Corridor {
    edge: RoomEdge,
    cells: Vec<CellCoord>,
}

impl Corridor {
    /// Records the cells opened for the provided edge.
    #[must_use]
    pub fn new(edge: RoomEdge, cells: Vec<CellCoord>) -> Self {
        Self { edge, cells }
    }

    /// Graph edge the corridor realises.
    #[must_use]
    pub const fn edge(&self) -> RoomEdge {
        self.edge
    }

    /// Cells newly opened by the corridor, in carving order.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }
}

/// Door marker placed over a corridor entering a room from above.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Door {
    room: RoomId,
    region: CellRect,
}

impl Door {
    /// Creates a door attached to `room` covering `region`.
    #[must_use]
    pub const fn new(room: RoomId, region: CellRect) -> Self {
        Self { room, region }
    }

    /// Room whose top wall the door sits in.
    #[must_use]
    pub const fn room(&self) -> RoomId {
        self.room
    }

    /// Full marker region; its bottom row holds the door cells.
    #[must_use]
    pub const fn region(&self) -> CellRect {
        self.region
    }
}

/// Mapping from grid cell to the entity that should spawn there.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpawnManifest {
    entries: BTreeMap<CellCoord, SpawnTag>,
}

impl SpawnManifest {
    /// Creates an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a spawn. Returns `false` and leaves the manifest untouched when
    /// the cell already carries a tag.
    pub fn insert(&mut self, cell: CellCoord, tag: SpawnTag) -> bool {
        if self.entries.contains_key(&cell) {
            return false;
        }
        let _ = self.entries.insert(cell, tag);
        true
    }

    /// Tag recorded for the cell, if any.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<SpawnTag> {
        self.entries.get(&cell).copied()
    }

    /// Iterator over every spawn in cell order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, SpawnTag)> + '_ {
        self.entries.iter().map(|(cell, tag)| (*cell, *tag))
    }

    /// Number of recorded spawns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no spawns were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of enemy spawns.
    #[must_use]
    pub fn enemy_count(&self) -> usize {
        self.entries
            .values()
            .filter(|tag| matches!(tag, SpawnTag::Enemy(_)))
            .count()
    }
}

/// Pieces produced by the generation pipeline, ready to be frozen into a [`Level`].
#[derive(Clone, Debug)]
pub struct LevelParts {
    /// Seed the level was generated from.
    pub seed: u64,
    /// World-space description of the grid.
    pub tile_grid: TileGrid,
    /// Finished cell grid.
    pub grid: Grid,
    /// Accepted rooms indexed by [`RoomId`].
    pub rooms: Vec<Room>,
    /// Room the player starts in.
    pub starting_room: RoomId,
    /// Room graph the corridors were carved from.
    pub graph: RoomGraph,
    /// Corridors carved for each graph edge.
    pub corridors: Vec<Corridor>,
    /// Doors placed during finishing.
    pub doors: Vec<Door>,
    /// Items and enemies to instantiate.
    pub manifest: SpawnManifest,
}

/// Finished, immutable dungeon level.
#[derive(Clone, Debug)]
pub struct Level {
    seed: u64,
    tile_grid: TileGrid,
    grid: Grid,
    rooms: Vec<Room>,
    starting_room: RoomId,
    graph: RoomGraph,
    corridors: Vec<Corridor>,
    doors: Vec<Door>,
    manifest: SpawnManifest,
}

impl Level {
    /// Freezes the pipeline output into a level.
    ///
    /// Fails with [`GenerationError::EmptyRoomList`] when there is no room to
    /// start in, so a level is never handed out half-initialised.
    pub fn assemble(parts: LevelParts) -> Result<Self, GenerationError> {
        if parts.rooms.is_empty() || parts.starting_room.index() >= parts.rooms.len() {
            return Err(GenerationError::EmptyRoomList);
        }

        Ok(Self {
            seed: parts.seed,
            tile_grid: parts.tile_grid,
            grid: parts.grid,
            rooms: parts.rooms,
            starting_room: parts.starting_room,
            graph: parts.graph,
            corridors: parts.corridors,
            doors: parts.doors,
            manifest: parts.manifest,
        })
    }
}

/// Query functions that provide read-only access to a finished level.
pub mod query {
    use veiled_hollow_core::{CellCoord, GridView, RoomId, TileGrid};

    use super::reachability::ReachabilityField;
    use super::{Corridor, Door, Level, Room, RoomGraph, SpawnManifest};

    /// Seed the level was generated from.
    #[must_use]
    pub fn seed(level: &Level) -> u64 {
        level.seed
    }

    /// Provides read-only access to the level's tile grid definition.
    #[must_use]
    pub fn tile_grid(level: &Level) -> &TileGrid {
        &level.tile_grid
    }

    /// Exposes a read-only view of the finished cell grid.
    #[must_use]
    pub fn grid_view(level: &Level) -> GridView<'_> {
        level.grid.view()
    }

    /// Accepted rooms indexed by [`RoomId`].
    #[must_use]
    pub fn rooms(level: &Level) -> &[Room] {
        &level.rooms
    }

    /// Room looked up by identifier.
    #[must_use]
    pub fn room(level: &Level, id: RoomId) -> Option<&Room> {
        level.rooms.get(id.index())
    }

    /// Identifier of the room the player starts in.
    #[must_use]
    pub fn starting_room(level: &Level) -> RoomId {
        level.starting_room
    }

    /// Cell the player spawns on: the starting room's center.
    #[must_use]
    pub fn player_start(level: &Level) -> CellCoord {
        level
            .rooms
            .get(level.starting_room.index())
            .map_or(CellCoord::new(0, 0), Room::center)
    }

    /// Room graph retained for diagnostics.
    #[must_use]
    pub fn graph(level: &Level) -> &RoomGraph {
        &level.graph
    }

    /// Corridors carved during generation.
    #[must_use]
    pub fn corridors(level: &Level) -> &[Corridor] {
        &level.corridors
    }

    /// Doors placed during finishing.
    #[must_use]
    pub fn doors(level: &Level) -> &[Door] {
        &level.doors
    }

    /// Spawns awaiting instantiation.
    #[must_use]
    pub fn spawn_manifest(level: &Level) -> &SpawnManifest {
        &level.manifest
    }

    /// Rooms whose centers cannot be reached over passable cells from the
    /// player start.
    #[must_use]
    pub fn unreachable_rooms(level: &Level) -> Vec<RoomId> {
        let field = distance_field_from(level, player_start(level));
        level
            .rooms
            .iter()
            .filter(|room| field.steps_to(room.center()).is_none())
            .map(Room::id)
            .collect()
    }

    /// Number of 4-connected steps between two cells, if they are connected.
    #[must_use]
    pub fn walking_distance(level: &Level, from: CellCoord, to: CellCoord) -> Option<u32> {
        distance_field_from(level, from).steps_to(to)
    }

    fn distance_field_from(level: &Level, source: CellCoord) -> ReachabilityField<'_> {
        ReachabilityField::flood(level.grid.view(), source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veiled_hollow_core::CellRectSize;

    fn rect(column: u32, row: u32, width: u32, height: u32) -> CellRect {
        CellRect::from_origin_and_size(
            CellCoord::new(column, row),
            CellRectSize::new(width, height),
        )
    }

    fn two_room_parts(connect: bool) -> LevelParts {
        let mut grid = Grid::new(12, 6);
        let rooms = vec![
            Room::new(RoomId::new(0), rect(1, 1, 3, 3)),
            Room::new(RoomId::new(1), rect(7, 1, 3, 3)),
        ];
        for room in &rooms {
            grid.fill_rect(room.bounds(), CellState::Open);
        }
        if connect {
            grid.fill_rect(rect(4, 2, 3, 1), CellState::Open);
        }

        LevelParts {
            seed: 7,
            tile_grid: TileGrid::new(12, 6, 32.0),
            grid,
            rooms,
            starting_room: RoomId::new(0),
            graph: RoomGraph::new(2),
            corridors: Vec::new(),
            doors: Vec::new(),
            manifest: SpawnManifest::new(),
        }
    }

    #[test]
    fn new_grid_is_fully_blocked() {
        let grid = Grid::new(4, 3);
        assert!(grid.view().iter().all(|state| state == CellState::Blocked));
        assert_eq!(grid.dimensions(), (4, 3));
    }

    #[test]
    fn set_reports_changes_and_ignores_out_of_range() {
        let mut grid = Grid::new(2, 2);
        assert!(grid.set(CellCoord::new(1, 1), CellState::Open));
        assert!(!grid.set(CellCoord::new(1, 1), CellState::Open));
        assert!(!grid.set(CellCoord::new(5, 5), CellState::Open));
        assert_eq!(grid.state(CellCoord::new(5, 5)), CellState::Blocked);
    }

    #[test]
    fn graph_rejects_duplicates_and_self_loops() {
        let mut graph = RoomGraph::new(3);
        assert!(graph.add_edge(RoomId::new(0), RoomId::new(1), RoomEdgeKind::Spanning));
        assert!(!graph.add_edge(RoomId::new(1), RoomId::new(0), RoomEdgeKind::Loop));
        assert!(!graph.add_edge(RoomId::new(2), RoomId::new(2), RoomEdgeKind::Loop));
        assert!(!graph.add_edge(RoomId::new(2), RoomId::new(9), RoomEdgeKind::Loop));
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.edges()[0].a(), RoomId::new(0));
    }

    #[test]
    fn graph_reachability_uses_all_edges() {
        let mut graph = RoomGraph::new(4);
        assert!(graph.add_edge(RoomId::new(0), RoomId::new(2), RoomEdgeKind::Spanning));
        assert!(graph.add_edge(RoomId::new(2), RoomId::new(3), RoomEdgeKind::Spanning));
        assert!(!graph.is_connected());
        assert_eq!(
            graph.reached_from(RoomId::new(0)),
            vec![true, false, true, true]
        );

        assert!(graph.add_edge(RoomId::new(1), RoomId::new(3), RoomEdgeKind::Fallback));
        assert!(graph.is_connected());
    }

    #[test]
    fn manifest_keeps_first_tag_per_cell() {
        let mut manifest = SpawnManifest::new();
        let cell = CellCoord::new(3, 3);
        assert!(manifest.insert(cell, SpawnTag::Item));
        assert!(!manifest.insert(
            cell,
            SpawnTag::Enemy(veiled_hollow_core::EnemyKind::Spider)
        ));
        assert_eq!(manifest.get(cell), Some(SpawnTag::Item));
        assert_eq!(manifest.enemy_count(), 0);
    }

    #[test]
    fn assemble_rejects_empty_room_list() {
        let mut parts = two_room_parts(true);
        parts.rooms.clear();
        assert_eq!(
            Level::assemble(parts).err(),
            Some(GenerationError::EmptyRoomList)
        );
    }

    #[test]
    fn unreachable_rooms_reports_sealed_rooms() {
        let sealed = Level::assemble(two_room_parts(false)).expect("level");
        assert_eq!(query::unreachable_rooms(&sealed), vec![RoomId::new(1)]);

        let connected = Level::assemble(two_room_parts(true)).expect("level");
        assert!(query::unreachable_rooms(&connected).is_empty());
        assert_eq!(
            query::walking_distance(&connected, CellCoord::new(2, 2), CellCoord::new(8, 2)),
            Some(6)
        );
    }

    #[test]
    fn player_starts_in_starting_room_center() {
        let level = Level::assemble(two_room_parts(true)).expect("level");
        assert_eq!(query::player_start(&level), CellCoord::new(2, 2));
        assert_eq!(query::starting_room(&level), RoomId::new(0));
    }
}
