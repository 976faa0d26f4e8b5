#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Corridor carving system that opens L-shaped channels between connected rooms.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use veiled_hollow_core::{CellCoord, CellState};
use veiled_hollow_world::{Corridor, Grid, Room, RoomEdge, RoomGraph};

/// Tuning knobs controlling corridor shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of cells a corridor spans across its direction of travel.
    pub corridor_width: u32,
    /// Cells along the map edge that corridors must never open.
    pub border_thickness: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corridor_width: 3,
            border_thickness: 3,
        }
    }
}

/// Order in which the two legs of an L-shaped corridor are walked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegOrder {
    /// Run along the first room's row, then along the second room's column.
    HorizontalFirst,
    /// Run along the first room's column, then along the second room's row.
    VerticalFirst,
}

/// Pure system that opens corridors in a grid.
#[derive(Clone, Debug, Default)]
pub struct CorridorCarver {
    config: Config,
}

impl CorridorCarver {
    /// Creates a carver using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration the carver runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Carves one corridor for every graph edge, in edge order.
    pub fn carve_all<R: Rng + ?Sized>(
        &self,
        grid: &mut Grid,
        rooms: &[Room],
        graph: &RoomGraph,
        rng: &mut R,
    ) -> Vec<Corridor> {
        graph
            .edges()
            .iter()
            .map(|edge| self.carve(grid, rooms, *edge, rng))
            .collect()
    }

    /// Carves the corridor for `edge`, picking the leg order at random.
    pub fn carve<R: Rng + ?Sized>(
        &self,
        grid: &mut Grid,
        rooms: &[Room],
        edge: RoomEdge,
        rng: &mut R,
    ) -> Corridor {
        let order = if rng.gen_bool(0.5) {
            LegOrder::HorizontalFirst
        } else {
            LegOrder::VerticalFirst
        };
        self.carve_with_order(grid, rooms, edge, order)
    }

    /// Carves the corridor for `edge` using a fixed leg order.
    ///
    /// Center-line cells are always opened so the two rooms end up connected;
    /// the surrounding band only opens cells that pass the corridor guard.
    pub fn carve_with_order(
        &self,
        grid: &mut Grid,
        rooms: &[Room],
        edge: RoomEdge,
        order: LegOrder,
    ) -> Corridor {
        let (Some(first), Some(second)) =
            (rooms.get(edge.a().index()), rooms.get(edge.b().index()))
        else {
            debug!("skipping corridor for unknown rooms {edge:?}");
            return Corridor::new(edge, Vec::new());
        };

        let from = first.center();
        let to = second.center();
        let mut opened = Vec::new();

        match order {
            LegOrder::HorizontalFirst => {
                let columns = (from.column(), to.column());
                self.horizontal_leg(grid, rooms, from.row(), columns, &mut opened);
                self.vertical_leg(grid, rooms, to.column(), (from.row(), to.row()), &mut opened);
            }
            LegOrder::VerticalFirst => {
                self.vertical_leg(grid, rooms, from.column(), (from.row(), to.row()), &mut opened);
                let columns = (from.column(), to.column());
                self.horizontal_leg(grid, rooms, to.row(), columns, &mut opened);
            }
        }

        Corridor::new(edge, opened)
    }

    fn horizontal_leg(
        &self,
        grid: &mut Grid,
        rooms: &[Room],
        row: u32,
        (from, to): (u32, u32),
        opened: &mut Vec<CellCoord>,
    ) {
        for column in span(from, to) {
            let center = CellCoord::new(column, row);
            open(grid, center, opened);
            for offset in self.band_offsets() {
                if let Some(cell) = center.offset(0, offset) {
                    self.open_if_corridor_space(grid, rooms, cell, opened);
                }
            }
        }
    }

    fn vertical_leg(
        &self,
        grid: &mut Grid,
        rooms: &[Room],
        column: u32,
        (from, to): (u32, u32),
        opened: &mut Vec<CellCoord>,
    ) {
        for row in span(from, to) {
            let center = CellCoord::new(column, row);
            open(grid, center, opened);
            for offset in self.band_offsets() {
                if let Some(cell) = center.offset(offset, 0) {
                    self.open_if_corridor_space(grid, rooms, cell, opened);
                }
            }
        }
    }

    /// Perpendicular offsets covered by the band, `-(w/2) ..= w-1-(w/2)`.
    fn band_offsets(&self) -> std::ops::RangeInclusive<i64> {
        let width = i64::from(self.config.corridor_width.max(1));
        let low = -(width / 2);
        low..=low + width - 1
    }

    fn open_if_corridor_space(
        &self,
        grid: &mut Grid,
        rooms: &[Room],
        cell: CellCoord,
        opened: &mut Vec<CellCoord>,
    ) {
        if self.is_corridor_space(grid, rooms, cell) {
            open(grid, cell, opened);
        }
    }

    /// Reports whether a band cell may become corridor floor: it must lie on
    /// the map, outside the border band, and outside every room's interior.
    #[must_use]
    pub fn is_corridor_space(&self, grid: &Grid, rooms: &[Room], cell: CellCoord) -> bool {
        let (columns, rows) = grid.dimensions();
        let border = self.config.border_thickness;
        let inside_border = cell.column() >= border
            && cell.row() >= border
            && cell.column().saturating_add(border) < columns
            && cell.row().saturating_add(border) < rows;

        inside_border
            && !rooms
                .iter()
                .any(|room| room.bounds().interior_contains(cell))
    }
}

fn open(grid: &mut Grid, cell: CellCoord, opened: &mut Vec<CellCoord>) {
    if grid.set(cell, CellState::Open) {
        opened.push(cell);
    }
}

/// Inclusive range between two values regardless of their order.
fn span(a: u32, b: u32) -> std::ops::RangeInclusive<u32> {
    a.min(b)..=a.max(b)
}
