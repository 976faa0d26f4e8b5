//! Line-of-sight checks and greedy any-angle path shortcutting.

use veiled_hollow_core::{CellCoord, GridView};

/// Reports whether the straight segment between two cell centers only
/// crosses passable cells.
///
/// The segment is sampled at unit steps along its longer axis. When both
/// cells coincide there is nothing to step along, so the answer is whether
/// that single cell is passable.
///
/// Only the rounded sample cells are tested, so a diagonal segment may
/// clip the corner of a wall it passes between two samples.
#[must_use]
pub fn has_line_of_sight(grid: GridView<'_>, from: CellCoord, to: CellCoord) -> bool {
    let (x0, y0) = (f64::from(from.column()), f64::from(from.row()));
    let (dx, dy) = (f64::from(to.column()) - x0, f64::from(to.row()) - y0);
    let steps = from.column().abs_diff(to.column()).max(from.row().abs_diff(to.row()));

    if steps == 0 {
        return grid.is_passable(from);
    }

    let steps_f = f64::from(steps);
    (0..=steps).all(|step| {
        let t = f64::from(step) / steps_f;
        let column = (x0 + dx * t).round() as i64;
        let row = (y0 + dy * t).round() as i64;
        grid.state_at(column, row).is_passable()
    })
}

/// Shortcuts a raw path by repeatedly jumping from the current anchor to the
/// farthest later node it can see.
///
/// Paths with fewer than three nodes are returned unchanged.
#[must_use]
pub fn smooth_path(grid: GridView<'_>, path: &[CellCoord]) -> Vec<CellCoord> {
    let Some(&first) = path.first() else {
        return Vec::new();
    };
    if path.len() < 3 {
        return path.to_vec();
    }

    let mut smoothed = vec![first];
    let mut anchor = 0;
    let last = path.len() - 1;

    while anchor < last {
        let next = (anchor + 1..=last)
            .rev()
            .find(|&candidate| has_line_of_sight(grid, path[anchor], path[candidate]))
            .unwrap_or(anchor + 1);
        smoothed.push(path[next]);
        anchor = next;
    }

    smoothed
}
