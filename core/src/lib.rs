#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Veiled Hollow dungeon engine.
//!
//! This crate defines the vocabulary that connects the authoritative level,
//! the pure generation systems, and the run-time pursuit systems. Generation
//! systems mutate a level's tile grid in a fixed pipeline before any agent
//! exists; afterwards every consumer reads the grid through [`GridView`], so
//! mutation and read phases never overlap.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of tile columns in a generated map.
pub const MAP_WIDTH: u32 = 70;

/// Default number of tile rows in a generated map.
pub const MAP_HEIGHT: u32 = 70;

/// Default side length of a single tile expressed in world units.
pub const TILE_SIZE: f32 = 32.0;

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Returns the cell displaced by the provided signed offsets, if it stays
    /// within the non-negative quadrant.
    #[must_use]
    pub fn offset(self, columns: i64, rows: i64) -> Option<CellCoord> {
        let column = u32::try_from(i64::from(self.column).checked_add(columns)?).ok()?;
        let row = u32::try_from(i64::from(self.row).checked_add(rows)?).ok()?;
        Some(CellCoord::new(column, row))
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// First column covered by the rectangle.
    #[must_use]
    pub const fn left(&self) -> u32 {
        self.origin.column()
    }

    /// First row covered by the rectangle.
    #[must_use]
    pub const fn top(&self) -> u32 {
        self.origin.row()
    }

    /// Column one past the last column covered by the rectangle.
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.origin.column().saturating_add(self.size.width())
    }

    /// Row one past the last row covered by the rectangle.
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.origin.row().saturating_add(self.size.height())
    }

    /// Center cell of the rectangle, rounding toward the origin.
    #[must_use]
    pub const fn center(&self) -> CellCoord {
        CellCoord::new(
            self.origin.column() + self.size.width() / 2,
            self.origin.row() + self.size.height() / 2,
        )
    }

    /// Reports whether the cell lies within the rectangle.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() >= self.left()
            && cell.column() < self.right()
            && cell.row() >= self.top()
            && cell.row() < self.bottom()
    }

    /// Reports whether the cell lies within the rectangle, excluding its
    /// outermost ring of cells.
    #[must_use]
    pub const fn interior_contains(&self, cell: CellCoord) -> bool {
        cell.column() > self.left()
            && cell.column() + 1 < self.right()
            && cell.row() > self.top()
            && cell.row() + 1 < self.bottom()
    }

    /// Reports whether the two rectangles share at least one cell.
    #[must_use]
    pub fn overlaps(&self, other: &CellRect) -> bool {
        self.overlaps_with_spacing(other, 0)
    }

    /// Reports whether the rectangles overlap once both are inflated by
    /// `spacing` cells on every side.
    #[must_use]
    pub fn overlaps_with_spacing(&self, other: &CellRect, spacing: u32) -> bool {
        let spacing = i64::from(spacing);
        let (a_left, a_top) = (i64::from(self.left()) - spacing, i64::from(self.top()) - spacing);
        let (a_right, a_bottom) = (
            i64::from(self.right()) + spacing,
            i64::from(self.bottom()) + spacing,
        );
        let (b_left, b_top) = (
            i64::from(other.left()) - spacing,
            i64::from(other.top()) - spacing,
        );
        let (b_right, b_bottom) = (
            i64::from(other.right()) + spacing,
            i64::from(other.bottom()) + spacing,
        );

        a_left < b_right && a_right > b_left && a_top < b_bottom && a_bottom > b_top
    }

    /// Iterator over every cell covered by the rectangle in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let (left, right) = (self.left(), self.right());
        (self.top()..self.bottom())
            .flat_map(move |row| (left..right).map(move |column| CellCoord::new(column, row)))
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Occupancy state of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Floor that agents and the player may occupy.
    Open,
    /// Solid, impassable wall.
    Blocked,
    /// Threshold cell of a door placed over a corridor entrance.
    Door,
}

impl CellState {
    /// Reports whether agents may traverse the cell.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        matches!(self, Self::Open | Self::Door)
    }
}

/// Describes the discrete tile layout of a level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_length: f32,
}

impl TileGrid {
    /// Creates a new tile grid description.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, tile_length: f32) -> Self {
        Self {
            columns,
            rows,
            tile_length,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Total width of the grid measured in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Total height of the grid measured in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }
}

/// Read-only view into a dense, row-major cell state grid.
///
/// Queries outside the grid report [`CellState::Blocked`] so neighbour
/// inspection near the map edge never needs its own bounds handling.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    cells: &'a [CellState],
    columns: u32,
    rows: u32,
}

impl<'a> GridView<'a> {
    /// Captures a new grid view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [CellState], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// State of the provided cell, or [`CellState::Blocked`] when out of range.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> CellState {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(CellState::Blocked)
    }

    /// State at signed coordinates, reporting [`CellState::Blocked`] for any
    /// position outside the grid.
    #[must_use]
    pub fn state_at(&self, column: i64, row: i64) -> CellState {
        match (u32::try_from(column), u32::try_from(row)) {
            (Ok(column), Ok(row)) => self.state(CellCoord::new(column, row)),
            _ => CellState::Blocked,
        }
    }

    /// Reports whether the cell is [`CellState::Open`].
    #[must_use]
    pub fn is_open(&self, cell: CellCoord) -> bool {
        self.state(cell) == CellState::Open
    }

    /// Reports whether agents may traverse the cell.
    #[must_use]
    pub fn is_passable(&self, cell: CellCoord) -> bool {
        self.state(cell).is_passable()
    }

    /// Returns an iterator over all cell states in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = CellState> + 'a {
        self.cells.iter().copied()
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Row-major index of the cell, if it lies within the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            row.checked_mul(width)?.checked_add(column)
        } else {
            None
        }
    }
}

/// Stable identifier of an accepted room: its index in the level's room list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(u32);

impl RoomId {
    /// Creates a new room identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the room within the level's room list.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier assigned to a mobile agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Monotonic agent identifier source owned by whoever spawns agents.
///
/// Each level (or test) owns its own allocator, so identifiers never leak
/// between levels.
#[derive(Clone, Debug, Default)]
pub struct AgentIdAllocator {
    next: u32,
}

impl AgentIdAllocator {
    /// Creates an allocator whose first identifier is zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Hands out the next unused identifier.
    pub fn allocate(&mut self) -> AgentId {
        let id = AgentId::new(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Number of identifiers handed out so far.
    #[must_use]
    pub const fn allocated(&self) -> u32 {
        self.next
    }
}

/// Kinds of hostile agents that populate the dungeon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Burrowing worm that strikes from the ground.
    Worm,
    /// Larger burrowing worm.
    BigWorm,
    /// Slow walking skeleton.
    Skeleton,
    /// Fast crawling spider.
    Spider,
}

impl EnemyKind {
    /// Every enemy kind in declaration order.
    pub const ALL: [EnemyKind; 4] = [Self::Worm, Self::BigWorm, Self::Skeleton, Self::Spider];

    /// Static tuning values for the kind.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        let speed = match self {
            Self::Worm | Self::BigWorm => 0.0,
            Self::Skeleton => 1.0,
            Self::Spider => 2.0,
        };
        EnemyStats {
            health: 100,
            damage: 20,
            speed,
            resistance: 3,
            attack_radius: 30.0,
            notice_radius: 360.0,
            experience: 100,
        }
    }

    /// Behaviour profile that decides how the kind reacts to its target.
    #[must_use]
    pub const fn profile(self) -> MovementProfile {
        match self {
            Self::Worm | Self::BigWorm => MovementProfile::Stationary,
            Self::Skeleton | Self::Spider => MovementProfile::Mobile,
        }
    }
}

/// Static tuning values shared by every enemy of one kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Starting hit points.
    pub health: u32,
    /// Damage dealt per successful attack.
    pub damage: u32,
    /// Movement speed in world units per frame at 60 frames per second.
    pub speed: f32,
    /// Flat damage reduction applied by the combat layer.
    pub resistance: u32,
    /// Distance in world units at which the enemy starts attacking.
    pub attack_radius: f32,
    /// Distance in world units at which the enemy notices its target.
    pub notice_radius: f32,
    /// Experience awarded when the enemy dies.
    pub experience: u32,
}

/// How an enemy kind moves relative to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MovementProfile {
    /// Walks toward the target using the path planner.
    Mobile,
    /// Stays put, emerging to attack and burrowing again afterwards.
    Stationary,
}

/// Tag attached to a cell of the spawn manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnTag {
    /// A pickup item.
    Item,
    /// An enemy of the provided kind.
    Enemy(EnemyKind),
}

/// Hard failures that abort level construction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The map has no usable area once the margin is removed.
    #[error("map of {columns}x{rows} cells leaves no room for placement")]
    EmptyMap {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// Every candidate room was rejected by the size and containment filter.
    #[error("none of the {candidates} candidate rooms survived filtering")]
    NoRoomsSurvived {
        /// Number of candidate rectangles that were sampled.
        candidates: usize,
    },
    /// A step that needs at least one room received none.
    #[error("the room list is empty")]
    EmptyRoomList,
    /// A tuning value makes generation impossible.
    #[error("invalid generation config: {reason}")]
    InvalidConfig {
        /// Human readable description of the offending value.
        reason: &'static str,
    },
}
