#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-agent path planning over a finished dungeon grid.
//!
//! A [`PathPlanner`] belongs to exactly one pursuing agent. It converts world
//! positions to grid cells, searches with A*, shortcuts the result with line
//! of sight, and replans only when its interval elapses or the target moves
//! to another cell. Whenever no route exists the planner steers straight at
//! the target instead.

mod search;
mod smoothing;

use std::collections::VecDeque;
use std::time::Duration;

use glam::Vec2;
use log::trace;
use serde::{Deserialize, Serialize};
use veiled_hollow_core::{CellCoord, GridView};

pub use search::find_path;
pub use smoothing::{has_line_of_sight, smooth_path};

/// Tuning knobs shared by every planner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Milliseconds between forced replans while the target stays in one cell.
    /// Lower values track the target more closely at a higher search cost.
    pub replan_interval_ms: u64,
    /// Distance to a waypoint, as a fraction of the tile length, at which the
    /// waypoint counts as reached.
    pub arrival_radius: f32,
}

impl Config {
    /// Replan interval as a [`Duration`].
    #[must_use]
    pub fn replan_interval(&self) -> Duration {
        Duration::from_millis(self.replan_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            replan_interval_ms: 200,
            arrival_radius: 0.25,
        }
    }
}

/// Whether a planner is currently chasing something.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlannerState {
    /// No target; the planner produces no movement.
    Idle,
    /// Following a target, replanning as needed.
    Pursuing,
}

/// Grid cell containing the world position, using floor division.
///
/// Negative or non-finite positions and non-positive tile lengths have no cell.
#[must_use]
pub fn cell_at(position: Vec2, tile_length: f32) -> Option<CellCoord> {
    if !position.is_finite() || tile_length <= 0.0 || position.x < 0.0 || position.y < 0.0 {
        return None;
    }
    let scaled = (position / tile_length).floor();
    Some(CellCoord::new(scaled.x as u32, scaled.y as u32))
}

/// World position of the center of `cell`.
#[must_use]
pub fn cell_center(cell: CellCoord, tile_length: f32) -> Vec2 {
    Vec2::new(
        (cell.column() as f32 + 0.5) * tile_length,
        (cell.row() as f32 + 0.5) * tile_length,
    )
}

/// Path planner owned by a single pursuing agent.
#[derive(Clone, Debug)]
pub struct PathPlanner {
    config: Config,
    tile_length: f32,
    state: PlannerState,
    target: Option<Vec2>,
    planned_target_cell: Option<CellCoord>,
    since_plan: Option<Duration>,
    waypoints: VecDeque<CellCoord>,
    plans_computed: u64,
}

impl PathPlanner {
    /// Creates an idle planner for a grid with the given tile length.
    #[must_use]
    pub fn new(config: Config, tile_length: f32) -> Self {
        Self {
            config,
            tile_length,
            state: PlannerState::Idle,
            target: None,
            planned_target_cell: None,
            since_plan: None,
            waypoints: VecDeque::new(),
            plans_computed: 0,
        }
    }

    /// Current planner state.
    #[must_use]
    pub fn state(&self) -> PlannerState {
        self.state
    }

    /// Number of searches run since the planner was created.
    #[must_use]
    pub fn plans_computed(&self) -> u64 {
        self.plans_computed
    }

    /// Last target position the planner was told about.
    #[must_use]
    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    /// Remaining waypoints, nearest first.
    pub fn waypoints(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.waypoints.iter().copied()
    }

    /// Records the target's latest position and starts pursuing it.
    pub fn notify_target_moved(&mut self, position: Vec2) {
        self.target = Some(position);
        self.state = PlannerState::Pursuing;
    }

    /// Drops the waypoint the agent could not reach so it moves on to the next one.
    pub fn notify_blocked(&mut self) {
        let _ = self.waypoints.pop_front();
    }

    /// Stops pursuing and forgets the current path.
    pub fn stop(&mut self) {
        self.state = PlannerState::Idle;
        self.target = None;
        self.planned_target_cell = None;
        self.since_plan = None;
        self.waypoints.clear();
    }

    /// Advances the planner clock, replans when due, and drops reached waypoints.
    ///
    /// Returns `true` when a new path was computed during this tick.
    pub fn tick(&mut self, dt: Duration, agent_position: Vec2, grid: GridView<'_>) -> bool {
        if self.state == PlannerState::Idle {
            return false;
        }
        let Some(target) = self.target else {
            return false;
        };

        let target_cell = cell_at(target, self.tile_length);
        let elapsed = self.since_plan.map(|since| since.saturating_add(dt));
        let due = match elapsed {
            None => true,
            Some(elapsed) => {
                elapsed >= self.config.replan_interval() || target_cell != self.planned_target_cell
            }
        };

        let replanned = if due {
            self.replan(agent_position, target_cell, grid);
            true
        } else {
            self.since_plan = elapsed;
            false
        };

        self.drop_reached_waypoints(agent_position);
        replanned
    }

    /// World position of the next waypoint, if the planner has one.
    #[must_use]
    pub fn next_waypoint(&self) -> Option<Vec2> {
        self.waypoints
            .front()
            .map(|cell| cell_center(*cell, self.tile_length))
    }

    /// Unit vector the agent should move along.
    ///
    /// Points at the next waypoint, or straight at the target when there is no
    /// path. Zero while idle or when already on top of the goal.
    #[must_use]
    pub fn movement_direction(&self, agent_position: Vec2) -> Vec2 {
        if self.state == PlannerState::Idle {
            return Vec2::ZERO;
        }

        match (self.next_waypoint(), self.target) {
            (Some(waypoint), _) => (waypoint - agent_position).normalize_or_zero(),
            (None, Some(target)) => (target - agent_position).normalize_or_zero(),
            (None, None) => Vec2::ZERO,
        }
    }

    fn replan(&mut self, agent_position: Vec2, target_cell: Option<CellCoord>, grid: GridView<'_>) {
        let agent_cell = cell_at(agent_position, self.tile_length);
        let raw = match (agent_cell, target_cell) {
            (Some(from), Some(to)) => find_path(grid, from, to),
            _ => None,
        };

        self.waypoints.clear();
        match raw {
            Some(path) => {
                self.waypoints.extend(smooth_path(grid, &path).into_iter().skip(1));
                trace!(
                    "replanned {agent_cell:?} -> {target_cell:?}: {} raw cells, {} waypoints",
                    path.len(),
                    self.waypoints.len()
                );
            }
            None => trace!("no path {agent_cell:?} -> {target_cell:?}; steering directly"),
        }

        self.planned_target_cell = target_cell;
        self.since_plan = Some(Duration::ZERO);
        self.plans_computed += 1;
    }

    fn drop_reached_waypoints(&mut self, agent_position: Vec2) {
        let radius = self.config.arrival_radius * self.tile_length;
        while let Some(&cell) = self.waypoints.front() {
            if agent_position.distance(cell_center(cell, self.tile_length)) > radius {
                break;
            }
            let _ = self.waypoints.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_at_floors_world_positions() {
        assert_eq!(cell_at(Vec2::new(0.0, 0.0), 32.0), Some(CellCoord::new(0, 0)));
        assert_eq!(cell_at(Vec2::new(63.9, 64.0), 32.0), Some(CellCoord::new(1, 2)));
        assert_eq!(cell_at(Vec2::new(-0.1, 4.0), 32.0), None);
        assert_eq!(cell_at(Vec2::new(f32::NAN, 4.0), 32.0), None);
        assert_eq!(cell_at(Vec2::new(4.0, 4.0), 0.0), None);
    }

    #[test]
    fn cell_center_round_trips_through_cell_at() {
        let cell = CellCoord::new(7, 3);
        let center = cell_center(cell, 32.0);
        assert_eq!(center, Vec2::new(240.0, 112.0));
        assert_eq!(cell_at(center, 32.0), Some(cell));
    }

    #[test]
    fn idle_planner_does_nothing() {
        let cells = vec![veiled_hollow_core::CellState::Open; 4];
        let view = GridView::new(&cells, 2, 2);
        let mut planner = PathPlanner::new(Config::default(), 1.0);

        assert!(!planner.tick(Duration::from_millis(500), Vec2::new(0.5, 0.5), view));
        assert_eq!(planner.plans_computed(), 0);
        assert_eq!(planner.movement_direction(Vec2::ZERO), Vec2::ZERO);
        assert_eq!(planner.state(), PlannerState::Idle);
    }

    #[test]
    fn stop_discards_path_and_target() {
        let cells = vec![veiled_hollow_core::CellState::Open; 9];
        let view = GridView::new(&cells, 3, 3);
        let mut planner = PathPlanner::new(Config::default(), 1.0);
        planner.notify_target_moved(Vec2::new(2.5, 2.5));
        assert!(planner.tick(Duration::ZERO, Vec2::new(0.5, 0.5), view));
        assert!(planner.next_waypoint().is_some());

        planner.stop();

        assert_eq!(planner.state(), PlannerState::Idle);
        assert_eq!(planner.next_waypoint(), None);
        assert_eq!(planner.target(), None);
    }
}
