//! Headless replay of a level's enemies pursuing a target that tours every room.

use std::fmt;
use std::time::Duration;

use glam::Vec2;
use veiled_hollow_core::AgentIdAllocator;
use veiled_hollow_system_pathing::{cell_at, cell_center, find_path, smooth_path};
use veiled_hollow_system_pursuit::{BehaviorState, Config, Enemy, MovementIntent, Pursuit};
use veiled_hollow_world::{query, Level};

const FRAME: Duration = Duration::from_micros(16_667);
/// World units the target covers per frame.
const TARGET_SPEED: f32 = 3.0;

/// Outcome of a replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ChaseReport {
    pub(crate) frames: u32,
    pub(crate) enemies: usize,
    pub(crate) replans: u64,
    pub(crate) reached_attack_range: usize,
}

impl fmt::Display for ChaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames, {} enemies, {} replans, {} reached attack range",
            self.frames, self.enemies, self.replans, self.reached_attack_range
        )
    }
}

/// Replay state for one level.
pub(crate) struct Chase<'level> {
    level: &'level Level,
    tile_length: f32,
    pursuit: Pursuit,
    enemies: Vec<Enemy>,
    route: Vec<Vec2>,
    next_stop: usize,
    target: Vec2,
    frames: u32,
    attacked: Vec<bool>,
    intents: Vec<MovementIntent>,
}

impl<'level> Chase<'level> {
    /// Spawns the level's enemies and puts the target on the player start.
    pub(crate) fn new(level: &'level Level, config: Config) -> Self {
        let tile_length = query::tile_grid(level).tile_length();
        let pursuit = Pursuit::new(config);
        let enemies = pursuit.spawn_enemies(
            query::spawn_manifest(level),
            &mut AgentIdAllocator::new(),
            tile_length,
        );
        Self {
            level,
            tile_length,
            route: room_tour(level, tile_length),
            next_stop: 0,
            target: cell_center(query::player_start(level), tile_length),
            frames: 0,
            attacked: vec![false; enemies.len()],
            intents: Vec::with_capacity(enemies.len()),
            enemies,
            pursuit,
        }
    }

    /// Simulates `frames` more frames.
    pub(crate) fn advance(&mut self, frames: u32) {
        for _ in 0..frames {
            self.step();
        }
    }

    /// Summary of everything simulated so far.
    pub(crate) fn report(&self) -> ChaseReport {
        ChaseReport {
            frames: self.frames,
            enemies: self.enemies.len(),
            replans: self
                .enemies
                .iter()
                .map(|enemy| enemy.planner().plans_computed())
                .sum(),
            reached_attack_range: self.attacked.iter().filter(|attacked| **attacked).count(),
        }
    }

    fn step(&mut self) {
        self.move_target();

        let view = query::grid_view(self.level);
        let tile_length = self.tile_length;
        let is_obstructed = |position: Vec2| {
            cell_at(position, tile_length).map_or(true, |cell| !view.is_passable(cell))
        };

        self.intents.clear();
        self.pursuit.handle(
            FRAME,
            self.target,
            view,
            &mut self.enemies,
            &is_obstructed,
            &mut self.intents,
        );

        for intent in &self.intents {
            let Some(enemy) = self.enemies.iter_mut().find(|enemy| enemy.id() == intent.agent)
            else {
                continue;
            };
            let next = enemy.position() + intent.velocity;
            if !is_obstructed(next) {
                enemy.set_position(next);
            }
        }
        for (attacked, enemy) in self.attacked.iter_mut().zip(&self.enemies) {
            *attacked |= enemy.state() == BehaviorState::Attack;
        }
        self.frames += 1;
    }

    fn move_target(&mut self) {
        let Some(&stop) = self.route.get(self.next_stop) else {
            return;
        };
        let offset = stop - self.target;
        if offset.length() <= TARGET_SPEED {
            self.target = stop;
            self.next_stop = (self.next_stop + 1) % self.route.len();
        } else {
            self.target += offset.normalize() * TARGET_SPEED;
        }
    }
}

/// Waypoints leading from the player start through every room center in id
/// order and back to the start.
fn room_tour(level: &Level, tile_length: f32) -> Vec<Vec2> {
    let view = query::grid_view(level);
    let start = query::player_start(level);
    let stops = query::rooms(level)
        .iter()
        .map(|room| room.center())
        .filter(|center| *center != start)
        .chain(std::iter::once(start));

    let mut route = Vec::new();
    let mut from = start;
    for stop in stops {
        let Some(path) = find_path(view, from, stop) else {
            continue;
        };
        route.extend(
            smooth_path(view, &path)
                .into_iter()
                .skip(1)
                .map(|cell| cell_center(cell, tile_length)),
        );
        from = stop;
    }
    route
}
