#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy behaviour system that turns the state machine and path planner into
//! per-frame movement intents.

mod behavior;

use std::time::Duration;

use glam::Vec2;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use veiled_hollow_core::{
    AgentId, AgentIdAllocator, EnemyKind, GridView, MovementProfile, SpawnTag,
};
use veiled_hollow_system_pathing::{cell_center, PathPlanner};
use veiled_hollow_world::SpawnManifest;

pub use behavior::{
    next_state, transitions, BehaviorState, Conditions, Guard, Transition, MOBILE_TRANSITIONS,
    STATIONARY_TRANSITIONS,
};

/// Timing configuration shared by every enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Planner settings handed to each mobile enemy.
    pub planner: veiled_hollow_system_pathing::Config,
    /// Milliseconds after an attack starts before the next one may begin.
    pub attack_cooldown_ms: u64,
    /// Milliseconds after a hit during which further hits are ignored.
    pub invulnerability_ms: u64,
    /// Length of the attack animation in milliseconds.
    pub attack_animation_ms: u64,
    /// Length of the hurt animation in milliseconds.
    pub hurt_animation_ms: u64,
    /// Length of the burrowing animation in milliseconds.
    pub retreat_animation_ms: u64,
    /// Length of the death animation in milliseconds.
    pub dying_animation_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            planner: veiled_hollow_system_pathing::Config::default(),
            attack_cooldown_ms: 1_000,
            invulnerability_ms: 500,
            attack_animation_ms: 400,
            hurt_animation_ms: 300,
            retreat_animation_ms: 400,
            dying_animation_ms: 600,
        }
    }
}

impl Config {
    fn animation_length(&self, state: BehaviorState) -> Option<Duration> {
        let millis = match state {
            BehaviorState::Attack => self.attack_animation_ms,
            BehaviorState::Hurt => self.hurt_animation_ms,
            BehaviorState::Retreat => self.retreat_animation_ms,
            BehaviorState::Dying => self.dying_animation_ms,
            BehaviorState::Idle
            | BehaviorState::Pursue
            | BehaviorState::Waiting
            | BehaviorState::Dead => return None,
        };
        Some(Duration::from_millis(millis))
    }
}

/// A hostile agent instantiated from the spawn manifest.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: AgentId,
    kind: EnemyKind,
    position: Vec2,
    health: u32,
    state: BehaviorState,
    state_elapsed: Duration,
    cooldown_remaining: Duration,
    invulnerable_remaining: Duration,
    invulnerability: Duration,
    damaged: bool,
    planner: PathPlanner,
}

impl Enemy {
    fn new(id: AgentId, kind: EnemyKind, position: Vec2, config: &Config, tile_length: f32) -> Self {
        let state = match kind.profile() {
            MovementProfile::Mobile => BehaviorState::Idle,
            MovementProfile::Stationary => BehaviorState::Waiting,
        };
        Self {
            id,
            kind,
            position,
            health: kind.stats().health,
            state,
            state_elapsed: Duration::ZERO,
            cooldown_remaining: Duration::ZERO,
            invulnerable_remaining: Duration::ZERO,
            invulnerability: Duration::from_millis(config.invulnerability_ms),
            damaged: false,
            planner: PathPlanner::new(config.planner.clone(), tile_length),
        }
    }

    /// Identifier handed out by the spawning allocator.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Kind of the enemy.
    #[must_use]
    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Current world position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Moves the enemy, typically after the renderer applied its intent.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Remaining hit points.
    #[must_use]
    pub fn health(&self) -> u32 {
        self.health
    }

    /// Current behaviour state.
    #[must_use]
    pub fn state(&self) -> BehaviorState {
        self.state
    }

    /// Planner steering the enemy while it pursues.
    #[must_use]
    pub fn planner(&self) -> &PathPlanner {
        &self.planner
    }

    /// Records a hit resolved by the combat layer.
    ///
    /// Returns `false` and ignores the hit while the enemy is invulnerable or
    /// already dying.
    pub fn notify_damaged(&mut self, remaining_health: u32) -> bool {
        if !self.state.is_alive() || !self.invulnerable_remaining.is_zero() {
            return false;
        }
        self.health = remaining_health;
        self.damaged = true;
        self.invulnerable_remaining = self.invulnerability;
        true
    }

    fn advance_timers(&mut self, dt: Duration) {
        self.state_elapsed = self.state_elapsed.saturating_add(dt);
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(dt);
        self.invulnerable_remaining = self.invulnerable_remaining.saturating_sub(dt);
    }
}

/// Velocity an enemy wants to move with this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementIntent {
    /// Agent the intent belongs to.
    pub agent: AgentId,
    /// Desired velocity in world units per frame.
    pub velocity: Vec2,
    /// Behaviour state after this frame's transition.
    pub state: BehaviorState,
}

/// Drives every enemy's state machine and planner.
#[derive(Clone, Debug, Default)]
pub struct Pursuit {
    config: Config,
}

impl Pursuit {
    /// Creates the system with the provided timing configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Timing configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Instantiates an enemy for every enemy tag of the manifest, in manifest order.
    pub fn spawn_enemies(
        &self,
        manifest: &SpawnManifest,
        allocator: &mut AgentIdAllocator,
        tile_length: f32,
    ) -> Vec<Enemy> {
        let enemies: Vec<Enemy> = manifest
            .iter()
            .filter_map(|(cell, tag)| match tag {
                SpawnTag::Enemy(kind) => Some((cell, kind)),
                SpawnTag::Item => None,
            })
            .map(|(cell, kind)| {
                Enemy::new(
                    allocator.allocate(),
                    kind,
                    cell_center(cell, tile_length),
                    &self.config,
                    tile_length,
                )
            })
            .collect();
        info!("spawned {} enemies", enemies.len());
        enemies
    }

    /// Advances every enemy by `dt` and emits one intent per enemy that is not dead.
    ///
    /// `is_obstructed` reports whether a world position is blocked by something
    /// the grid does not know about, such as another agent.
    pub fn handle<F>(
        &self,
        dt: Duration,
        target: Vec2,
        grid: GridView<'_>,
        agents: &mut [Enemy],
        is_obstructed: F,
        out: &mut Vec<MovementIntent>,
    ) where
        F: Fn(Vec2) -> bool,
    {
        for agent in agents.iter_mut() {
            if agent.state == BehaviorState::Dead {
                continue;
            }
            agent.advance_timers(dt);

            let stats = agent.kind.stats();
            let conditions = Conditions {
                target_distance: agent.position.distance(target),
                attack_radius: stats.attack_radius,
                notice_radius: stats.notice_radius,
                attack_ready: agent.cooldown_remaining.is_zero(),
                animation_finished: self
                    .config
                    .animation_length(agent.state)
                    .is_some_and(|length| agent.state_elapsed >= length),
                damaged: agent.damaged,
                health_depleted: agent.health == 0,
            };
            agent.damaged = false;

            let table = transitions(agent.kind.profile());
            if let Some(next) = next_state(table, agent.state, &conditions) {
                self.enter(agent, next, target);
            }
            if agent.state == BehaviorState::Dead {
                continue;
            }

            let velocity = if agent.state == BehaviorState::Pursue {
                Self::pursue(agent, dt, target, grid, stats.speed, &is_obstructed)
            } else {
                Vec2::ZERO
            };
            out.push(MovementIntent {
                agent: agent.id,
                velocity,
                state: agent.state,
            });
        }
    }

    fn enter(&self, agent: &mut Enemy, next: BehaviorState, target: Vec2) {
        debug!("{:?} {:?}: {:?} -> {next:?}", agent.kind, agent.id, agent.state);
        if agent.state == BehaviorState::Pursue {
            agent.planner.stop();
        }
        match next {
            BehaviorState::Pursue => agent.planner.notify_target_moved(target),
            BehaviorState::Attack => {
                agent.cooldown_remaining = Duration::from_millis(self.config.attack_cooldown_ms);
            }
            _ => {}
        }
        agent.state = next;
        agent.state_elapsed = Duration::ZERO;
    }

    fn pursue<F>(
        agent: &mut Enemy,
        dt: Duration,
        target: Vec2,
        grid: GridView<'_>,
        speed: f32,
        is_obstructed: &F,
    ) -> Vec2
    where
        F: Fn(Vec2) -> bool,
    {
        agent.planner.notify_target_moved(target);
        let _ = agent.planner.tick(dt, agent.position, grid);

        let mut direction = agent.planner.movement_direction(agent.position);
        if direction != Vec2::ZERO && is_obstructed(agent.position + direction * speed) {
            agent.planner.notify_blocked();
            direction = agent.planner.movement_direction(agent.position);
        }
        direction * speed
    }
}
