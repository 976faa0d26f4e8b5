#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Layout finishing: seals the map border, removes thin wall slivers, and
//! marks corridor entrances with doors.

use log::debug;
use serde::{Deserialize, Serialize};
use veiled_hollow_core::{CellCoord, CellRect, CellRectSize, CellState};
use veiled_hollow_world::{Door, Grid, Room};

/// Tuning knobs for the finishing pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cells along every map edge that are forced to [`CellState::Blocked`].
    pub border_thickness: u32,
    /// Side length of the square door marker, and the widest corridor
    /// entrance that still receives a door.
    pub door_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            border_thickness: 3,
            door_size: 4,
        }
    }
}

/// Summary of a finishing pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinishReport {
    /// Doors placed over corridor entrances.
    pub doors: Vec<Door>,
    /// Number of sliver cells that were opened.
    pub slivers_opened: usize,
    /// Number of full sliver sweeps, including the final sweep that changed nothing.
    pub sweeps: usize,
}

/// Pure system that post-processes a carved grid.
#[derive(Clone, Debug, Default)]
pub struct LayoutFinisher {
    config: Config,
}

impl LayoutFinisher {
    /// Creates a finisher using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration the finisher runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs every finishing step in order: border, slivers, doors.
    pub fn finish(&self, grid: &mut Grid, rooms: &[Room]) -> FinishReport {
        self.force_border(grid);
        let (slivers_opened, sweeps) = self.collapse_slivers(grid);
        let doors = self.place_doors(grid, rooms);

        debug!(
            "finishing opened {slivers_opened} slivers in {sweeps} sweeps and placed {} doors",
            doors.len()
        );

        FinishReport {
            doors,
            slivers_opened,
            sweeps,
        }
    }

    /// Blocks every cell within the border thickness of the map edge.
    pub fn force_border(&self, grid: &mut Grid) {
        let (columns, rows) = grid.dimensions();
        for row in 0..rows {
            for column in 0..columns {
                let cell = CellCoord::new(column, row);
                if self.in_border(cell, columns, rows) {
                    let _ = grid.set(cell, CellState::Blocked);
                }
            }
        }
    }

    /// Opens every non-border blocked cell that has open cells on both of
    /// its left and right sides, or on both of its top and bottom sides.
    ///
    /// Sweeps repeat until nothing changes, since opening one sliver can turn
    /// a neighbour into a new one. Returns the number of opened cells and the
    /// number of sweeps.
    pub fn collapse_slivers(&self, grid: &mut Grid) -> (usize, usize) {
        let (columns, rows) = grid.dimensions();
        let border = self.config.border_thickness;
        let mut opened = 0;
        let mut sweeps = 0;

        loop {
            sweeps += 1;
            let mut changed = 0;
            for row in border..rows.saturating_sub(border) {
                for column in border..columns.saturating_sub(border) {
                    let cell = CellCoord::new(column, row);
                    if is_sliver(grid, cell) && grid.set(cell, CellState::Open) {
                        changed += 1;
                    }
                }
            }

            opened += changed;
            if changed == 0 {
                return (opened, sweeps);
            }
        }
    }

    /// Marks qualifying corridor entrances in the row above each room.
    ///
    /// Every maximal run of open cells in that row, within the room's columns
    /// and no wider than the door size, receives a square door region whose
    /// bottom row becomes [`CellState::Door`].
    pub fn place_doors(&self, grid: &mut Grid, rooms: &[Room]) -> Vec<Door> {
        let mut doors = Vec::new();
        for room in rooms {
            let bounds = room.bounds();
            let Some(threshold) = bounds.top().checked_sub(1) else {
                continue;
            };
            if threshold < self.config.border_thickness {
                continue;
            }

            for (start, width) in open_runs(grid, threshold, bounds.left(), bounds.right()) {
                if width > self.config.door_size {
                    continue;
                }

                let region = self.door_region(bounds, threshold, start);
                for column in region.left()..region.right() {
                    let cell = CellCoord::new(column, threshold);
                    if grid.state(cell) == CellState::Open {
                        let _ = grid.set(cell, CellState::Door);
                    }
                }
                doors.push(Door::new(room.id(), region));
            }
        }
        doors
    }

    fn door_region(&self, room: CellRect, threshold: u32, run_start: u32) -> CellRect {
        let size = self.config.door_size.max(1);
        let left = run_start
            .min(room.right().saturating_sub(size))
            .max(room.left());
        let right = left.saturating_add(size).min(room.right());
        let top = threshold
            .saturating_add(1)
            .saturating_sub(size)
            .max(self.config.border_thickness);

        CellRect::from_origin_and_size(
            CellCoord::new(left, top),
            CellRectSize::new(right - left, threshold - top + 1),
        )
    }

    fn in_border(&self, cell: CellCoord, columns: u32, rows: u32) -> bool {
        let border = self.config.border_thickness;
        cell.column() < border
            || cell.row() < border
            || cell.column().saturating_add(border) >= columns
            || cell.row().saturating_add(border) >= rows
    }
}

fn is_sliver(grid: &Grid, cell: CellCoord) -> bool {
    if grid.state(cell) != CellState::Blocked {
        return false;
    }

    let view = grid.view();
    let (column, row) = (i64::from(cell.column()), i64::from(cell.row()));
    let open = |column, row| view.state_at(column, row) == CellState::Open;

    let horizontal = open(column - 1, row) && open(column + 1, row);
    let vertical = open(column, row - 1) && open(column, row + 1);
    horizontal || vertical
}

/// Maximal runs of open cells in `row` between `left` and `right` (exclusive),
/// as `(first column, width)`.
fn open_runs(grid: &Grid, row: u32, left: u32, right: u32) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut current: Option<(u32, u32)> = None;

    for column in left..right {
        let open = grid.state(CellCoord::new(column, row)) == CellState::Open;
        current = match (current, open) {
            (Some((start, width)), true) => Some((start, width + 1)),
            (None, true) => Some((column, 1)),
            (Some(run), false) => {
                runs.push(run);
                None
            }
            (None, false) => None,
        };
    }

    runs.extend(current);
    runs
}
