//! Plain-text rendering of a finished level.

use veiled_hollow_core::{CellCoord, CellState, EnemyKind, SpawnTag};
use veiled_hollow_world::{query, Level};

/// Draws the level with one glyph per cell and one line per row.
pub(crate) fn render(level: &Level, spawns: bool) -> String {
    let view = query::grid_view(level);
    let (columns, rows) = view.dimensions();
    let start = query::player_start(level);
    let manifest = query::spawn_manifest(level);

    let capacity = usize::try_from((u64::from(columns) + 1) * u64::from(rows)).unwrap_or(0);
    let mut out = String::with_capacity(capacity);
    for row in 0..rows {
        for column in 0..columns {
            let cell = CellCoord::new(column, row);
            let tag = if spawns { manifest.get(cell) } else { None };
            out.push(glyph(view.state(cell), cell == start, tag));
        }
        out.push('\n');
    }
    out
}

/// One-line description of what the level contains.
pub(crate) fn summary(level: &Level) -> String {
    let manifest = query::spawn_manifest(level);
    let enemies = manifest.enemy_count();
    format!(
        "seed {}: {} rooms, {} edges, {} corridors, {} doors, {} items, {} enemies",
        query::seed(level),
        query::rooms(level).len(),
        query::graph(level).edges().len(),
        query::corridors(level).len(),
        query::doors(level).len(),
        manifest.len() - enemies,
        enemies
    )
}

fn glyph(state: CellState, is_start: bool, tag: Option<SpawnTag>) -> char {
    if is_start {
        return '@';
    }
    match (tag, state) {
        (Some(SpawnTag::Item), _) => '$',
        (Some(SpawnTag::Enemy(kind)), _) => enemy_initial(kind),
        (None, CellState::Blocked) => '#',
        (None, CellState::Open) => '.',
        (None, CellState::Door) => '+',
    }
}

fn enemy_initial(kind: EnemyKind) -> char {
    match kind {
        EnemyKind::Worm => 'w',
        EnemyKind::BigWorm => 'W',
        EnemyKind::Skeleton => 'k',
        EnemyKind::Spider => 's',
    }
}
