//! Flood fill over passable cells, used to audit how a level hangs together.

use std::collections::VecDeque;

use veiled_hollow_core::{CellCoord, GridView};

const STEPS: [(i64, i64); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Walking distance from one source cell to every passable cell it reaches.
#[derive(Clone, Debug)]
pub(crate) struct ReachabilityField<'a> {
    view: GridView<'a>,
    steps: Vec<Option<u32>>,
}

impl<'a> ReachabilityField<'a> {
    /// Floods outward from `source` across 4-connected passable cells.
    ///
    /// A blocked or out-of-range source reaches nothing, itself included.
    pub(crate) fn flood(view: GridView<'a>, source: CellCoord) -> Self {
        let (columns, rows) = view.dimensions();
        let cell_count = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut field = Self {
            view,
            steps: vec![None; cell_count],
        };

        let Some(start) = view.index(source).filter(|_| view.is_passable(source)) else {
            return field;
        };
        field.steps[start] = Some(0);

        let mut frontier = VecDeque::from([(source, 0_u32)]);
        while let Some((cell, walked)) = frontier.pop_front() {
            for (dx, dy) in STEPS {
                let column = i64::from(cell.column()) + dx;
                let row = i64::from(cell.row()) + dy;
                if !view.state_at(column, row).is_passable() {
                    continue;
                }
                // state_at only reports passable cells inside the grid.
                let (Ok(column), Ok(row)) = (u32::try_from(column), u32::try_from(row)) else {
                    continue;
                };
                let next = CellCoord::new(column, row);
                let Some(slot) = view.index(next).and_then(|index| field.steps.get_mut(index))
                else {
                    continue;
                };
                if slot.is_none() {
                    *slot = Some(walked + 1);
                    frontier.push_back((next, walked + 1));
                }
            }
        }
        field
    }

    /// Steps from the source to `cell`, or `None` when the flood never got there.
    #[must_use]
    pub(crate) fn steps_to(&self, cell: CellCoord) -> Option<u32> {
        self.view
            .index(cell)
            .and_then(|index| self.steps.get(index).copied().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veiled_hollow_core::CellState;

    fn view_of(rows: &[&str]) -> Vec<CellState> {
        rows.iter()
            .flat_map(|row| row.chars())
            .map(|glyph| match glyph {
                '.' => CellState::Open,
                '+' => CellState::Door,
                _ => CellState::Blocked,
            })
            .collect()
    }

    #[test]
    fn distances_grow_one_step_at_a_time() {
        let cells = view_of(&["...", "...", "...", "..."]);
        let field = ReachabilityField::flood(GridView::new(&cells, 3, 4), CellCoord::new(1, 2));

        assert_eq!(field.steps_to(CellCoord::new(1, 2)), Some(0));
        assert_eq!(field.steps_to(CellCoord::new(1, 1)), Some(1));
        assert_eq!(field.steps_to(CellCoord::new(1, 0)), Some(2));
        assert_eq!(field.steps_to(CellCoord::new(0, 0)), Some(3));
    }

    #[test]
    fn walls_force_detours_and_doors_let_through() {
        let cells = view_of(&[".#.", ".#.", "..+", "..."]);
        let field = ReachabilityField::flood(GridView::new(&cells, 3, 4), CellCoord::new(0, 0));

        assert_eq!(field.steps_to(CellCoord::new(1, 0)), None);
        assert_eq!(field.steps_to(CellCoord::new(2, 2)), Some(4));
        assert_eq!(field.steps_to(CellCoord::new(2, 0)), Some(6));
    }

    #[test]
    fn sealed_pockets_and_foreign_cells_stay_unreached() {
        let cells = view_of(&[".#."]);
        let field = ReachabilityField::flood(GridView::new(&cells, 3, 1), CellCoord::new(0, 0));

        assert_eq!(field.steps_to(CellCoord::new(2, 0)), None);
        assert_eq!(field.steps_to(CellCoord::new(5, 0)), None);
    }

    #[test]
    fn blocked_source_reaches_nothing() {
        let cells = view_of(&["#.."]);
        let field = ReachabilityField::flood(GridView::new(&cells, 3, 1), CellCoord::new(0, 0));

        assert_eq!(field.steps_to(CellCoord::new(0, 0)), None);
        assert_eq!(field.steps_to(CellCoord::new(1, 0)), None);
    }
}
