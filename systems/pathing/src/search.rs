//! A* search over the 4-connected passable cells of a grid.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use veiled_hollow_core::{CellCoord, GridView};

const NO_PARENT: usize = usize::MAX;

/// Finds a shortest 4-connected path from `start` to `goal`, both included.
///
/// Returns `None` when either end is impassable or the goal cannot be
/// reached. Movement cost is uniform, so the Manhattan heuristic is
/// admissible and the returned path is optimal.
#[must_use]
pub fn find_path(grid: GridView<'_>, start: CellCoord, goal: CellCoord) -> Option<Vec<CellCoord>> {
    if !grid.is_passable(start) || !grid.is_passable(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let (columns, rows) = grid.dimensions();
    let cell_count = usize::try_from(u64::from(columns) * u64::from(rows)).ok()?;
    let start_index = grid.index(start)?;
    let goal_index = grid.index(goal)?;
    let width = usize::try_from(columns).ok()?;

    let mut best_cost = vec![u32::MAX; cell_count];
    let mut came_from = vec![NO_PARENT; cell_count];
    let mut heap = BinaryHeap::new();

    best_cost[start_index] = 0;
    heap.push(Reverse((start.manhattan_distance(goal), 0u32, 0u32, start_index)));
    let mut tie_seq = 1u32;

    while let Some(Reverse((_, cost, _, index))) = heap.pop() {
        if cost != best_cost[index] {
            continue;
        }
        if index == goal_index {
            return Some(reconstruct(&came_from, goal_index, width));
        }

        let current = cell_of(index, width);
        for neighbor in neighbors(current) {
            if !grid.is_passable(neighbor) {
                continue;
            }
            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };

            let next_cost = cost.saturating_add(1);
            if next_cost >= best_cost[neighbor_index] {
                continue;
            }

            best_cost[neighbor_index] = next_cost;
            came_from[neighbor_index] = index;
            let estimate = next_cost.saturating_add(neighbor.manhattan_distance(goal));
            heap.push(Reverse((estimate, next_cost, tie_seq, neighbor_index)));
            tie_seq = tie_seq.wrapping_add(1);
        }
    }

    None
}

fn reconstruct(came_from: &[usize], goal_index: usize, width: usize) -> Vec<CellCoord> {
    let mut path = vec![cell_of(goal_index, width)];
    let mut index = goal_index;
    while came_from[index] != NO_PARENT {
        index = came_from[index];
        path.push(cell_of(index, width));
    }
    path.reverse();
    path
}

fn cell_of(index: usize, width: usize) -> CellCoord {
    let column = u32::try_from(index % width).unwrap_or(u32::MAX);
    let row = u32::try_from(index / width).unwrap_or(u32::MAX);
    CellCoord::new(column, row)
}

/// Up, right, down, left; cells that would leave the non-negative quadrant are skipped.
fn neighbors(cell: CellCoord) -> impl Iterator<Item = CellCoord> {
    [(0, -1), (1, 0), (0, 1), (-1, 0)]
        .into_iter()
        .filter_map(move |(columns, rows)| cell.offset(columns, rows))
}
