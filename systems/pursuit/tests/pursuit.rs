use std::time::Duration;

use glam::Vec2;
use veiled_hollow_core::{
    AgentId, AgentIdAllocator, CellCoord, CellState, EnemyKind, GridView, SpawnTag,
};
use veiled_hollow_system_pathing::cell_center;
use veiled_hollow_system_pursuit::{BehaviorState, Config, Enemy, MovementIntent, Pursuit};
use veiled_hollow_world::SpawnManifest;

const TILE: f32 = 32.0;
const FRAME: Duration = Duration::from_millis(100);

fn world(column: u32, row: u32) -> Vec2 {
    cell_center(CellCoord::new(column, row), TILE)
}

fn spawn_one(pursuit: &Pursuit, kind: EnemyKind, cell: CellCoord) -> Vec<Enemy> {
    let mut manifest = SpawnManifest::new();
    assert!(manifest.insert(cell, SpawnTag::Enemy(kind)));
    pursuit.spawn_enemies(&manifest, &mut AgentIdAllocator::new(), TILE)
}

fn step(
    pursuit: &Pursuit,
    dt: Duration,
    target: Vec2,
    view: GridView<'_>,
    enemies: &mut [Enemy],
) -> Vec<MovementIntent> {
    let mut intents = Vec::new();
    pursuit.handle(dt, target, view, enemies, |_| false, &mut intents);
    intents
}

#[test]
fn enemies_spawn_in_manifest_order_with_injected_ids() {
    let mut manifest = SpawnManifest::new();
    assert!(manifest.insert(CellCoord::new(5, 5), SpawnTag::Enemy(EnemyKind::Spider)));
    assert!(manifest.insert(CellCoord::new(2, 3), SpawnTag::Item));
    assert!(manifest.insert(CellCoord::new(1, 1), SpawnTag::Enemy(EnemyKind::Worm)));
    let mut allocator = AgentIdAllocator::new();
    let _ = allocator.allocate();

    let enemies = Pursuit::default().spawn_enemies(&manifest, &mut allocator, TILE);

    assert_eq!(enemies.len(), 2);
    assert_eq!(enemies[0].id(), AgentId::new(1));
    assert_eq!(enemies[0].kind(), EnemyKind::Worm);
    assert_eq!(enemies[0].position(), world(1, 1));
    assert_eq!(enemies[0].state(), BehaviorState::Waiting);
    assert_eq!(enemies[1].id(), AgentId::new(2));
    assert_eq!(enemies[1].kind(), EnemyKind::Spider);
    assert_eq!(enemies[1].state(), BehaviorState::Idle);
    assert_eq!(enemies[1].health(), 100);
    assert_eq!(allocator.allocated(), 3);
}

#[test]
fn noticed_target_is_pursued_along_a_planned_path() {
    let cells = vec![CellState::Open; 100];
    let view = GridView::new(&cells, 10, 10);
    let pursuit = Pursuit::default();
    let mut enemies = spawn_one(&pursuit, EnemyKind::Skeleton, CellCoord::new(1, 1));

    let intents = step(&pursuit, FRAME, world(9, 9), view, &mut enemies);
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].state, BehaviorState::Idle, "target beyond notice radius");
    assert_eq!(intents[0].velocity, Vec2::ZERO);

    let intents = step(&pursuit, FRAME, world(8, 8), view, &mut enemies);
    assert_eq!(intents[0].state, BehaviorState::Pursue);
    assert!((intents[0].velocity.length() - 1.0).abs() < 1e-5);
    assert_eq!(enemies[0].planner().plans_computed(), 1);

    let intents = step(&pursuit, FRAME, world(9, 9), view, &mut enemies);
    assert_eq!(intents[0].state, BehaviorState::Idle, "target slipped out of notice range");
    assert_eq!(enemies[0].planner().next_waypoint(), None);
}

#[test]
fn attacks_respect_the_cooldown() {
    let cells = vec![CellState::Open; 100];
    let view = GridView::new(&cells, 10, 10);
    let pursuit = Pursuit::new(Config {
        attack_cooldown_ms: 1_000,
        attack_animation_ms: 400,
        ..Config::default()
    });
    let mut enemies = spawn_one(&pursuit, EnemyKind::Skeleton, CellCoord::new(1, 1));
    let target = world(1, 1) + Vec2::new(12.0, 0.0);

    let states: Vec<BehaviorState> = (0..11)
        .map(|_| step(&pursuit, FRAME, target, view, &mut enemies)[0].state)
        .collect();

    use BehaviorState::{Attack, Idle, Pursue};
    assert_eq!(
        states,
        vec![Attack, Attack, Attack, Attack, Idle, Pursue, Pursue, Pursue, Pursue, Pursue, Attack]
    );
}

#[test]
fn only_pursuers_move() {
    let cells = vec![CellState::Open; 400];
    let view = GridView::new(&cells, 20, 20);
    let mut manifest = SpawnManifest::new();
    for (cell, kind) in [
        (CellCoord::new(2, 2), EnemyKind::Worm),
        (CellCoord::new(3, 10), EnemyKind::BigWorm),
        (CellCoord::new(8, 9), EnemyKind::Skeleton),
        (CellCoord::new(15, 15), EnemyKind::Spider),
    ] {
        assert!(manifest.insert(cell, SpawnTag::Enemy(kind)));
    }
    let pursuit = Pursuit::default();
    let mut enemies = pursuit.spawn_enemies(&manifest, &mut AgentIdAllocator::new(), TILE);

    for frame in 0..30 {
        let target = world(10, 10) + Vec2::new(frame as f32, 0.0);
        for intent in step(&pursuit, Duration::from_millis(16), target, view, &mut enemies) {
            if intent.state == BehaviorState::Pursue {
                assert!(intent.velocity.length() > 0.0);
            } else {
                assert_eq!(intent.velocity, Vec2::ZERO, "{intent:?}");
            }
        }
    }
    for enemy in &enemies {
        if enemy.kind().profile() == veiled_hollow_core::MovementProfile::Stationary {
            assert_ne!(enemy.state(), BehaviorState::Pursue);
        }
    }
}

#[test]
fn burrowed_enemy_emerges_to_attack_and_burrows_again() {
    let cells = vec![CellState::Open; 100];
    let view = GridView::new(&cells, 10, 10);
    let pursuit = Pursuit::default();
    let mut enemies = spawn_one(&pursuit, EnemyKind::Worm, CellCoord::new(4, 4));
    let near = world(4, 4) + Vec2::new(0.0, 20.0);
    let far = world(8, 8);

    assert_eq!(step(&pursuit, FRAME, far, view, &mut enemies)[0].state, BehaviorState::Waiting);
    assert_eq!(step(&pursuit, FRAME, near, view, &mut enemies)[0].state, BehaviorState::Attack);
    for _ in 0..3 {
        assert_eq!(step(&pursuit, FRAME, far, view, &mut enemies)[0].state, BehaviorState::Attack);
    }
    assert_eq!(step(&pursuit, FRAME, far, view, &mut enemies)[0].state, BehaviorState::Idle);
    assert_eq!(step(&pursuit, FRAME, far, view, &mut enemies)[0].state, BehaviorState::Retreat);
    for _ in 0..3 {
        assert_eq!(step(&pursuit, FRAME, far, view, &mut enemies)[0].state, BehaviorState::Retreat);
    }
    assert_eq!(step(&pursuit, FRAME, far, view, &mut enemies)[0].state, BehaviorState::Waiting);
}

#[test]
fn damage_hurts_and_depleted_health_kills() {
    let cells = vec![CellState::Open; 100];
    let view = GridView::new(&cells, 10, 10);
    let pursuit = Pursuit::default();
    let mut enemies = spawn_one(&pursuit, EnemyKind::Spider, CellCoord::new(0, 0));
    let far = world(9, 9);

    assert!(enemies[0].notify_damaged(60));
    assert!(!enemies[0].notify_damaged(50), "still invulnerable");
    let tick = |dt: u64, enemies: &mut [Enemy]| {
        step(&pursuit, Duration::from_millis(dt), far, view, enemies)
    };

    assert_eq!(tick(16, &mut enemies)[0].state, BehaviorState::Hurt);
    assert_eq!(tick(300, &mut enemies)[0].state, BehaviorState::Idle);
    assert!(!enemies[0].notify_damaged(40), "invulnerability outlasts the hurt animation");
    assert_eq!(tick(200, &mut enemies)[0].state, BehaviorState::Idle);

    assert!(enemies[0].notify_damaged(0));
    assert_eq!(tick(16, &mut enemies)[0].state, BehaviorState::Dying);
    assert!(!enemies[0].notify_damaged(0));
    assert!(tick(600, &mut enemies).is_empty(), "dead enemies emit nothing");
    assert_eq!(enemies[0].state(), BehaviorState::Dead);
    assert!(tick(600, &mut enemies).is_empty());
}
