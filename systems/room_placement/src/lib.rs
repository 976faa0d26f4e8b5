#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Room placement: scatter candidate rectangles, push them apart, and keep the
//! ones that fit the map.

use log::{debug, info, warn};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use veiled_hollow_core::{CellCoord, CellRect, CellRectSize, CellState, GenerationError, RoomId};
use veiled_hollow_world::{Grid, Room};

/// Tuning knobs controlling room placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of candidate rectangles sampled before separation; more candidates crowd the map.
    pub candidate_count: usize,
    /// Mean of the normal distribution rooms draw their width and height from.
    pub size_mean: f32,
    /// Standard deviation of the room size distribution; wider spreads mix closets and halls.
    pub size_deviation: f32,
    /// Rooms must be strictly wider and taller than this many cells to be kept.
    pub min_room_size: u32,
    /// Cells between the map edge and any room.
    pub margin: u32,
    /// Cells of wall reserved on every side of a room; two rooms end up at least twice this far apart.
    pub room_spacing: u32,
    /// Upper bound on separation sweeps before giving up on a fully overlap-free layout.
    pub max_separation_passes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            candidate_count: 25,
            size_mean: 10.0,
            size_deviation: 3.0,
            min_room_size: 8,
            margin: 4,
            room_spacing: 2,
            max_separation_passes: 10_000,
        }
    }
}

/// Result of a successful placement run.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Accepted rooms, indexed by their [`RoomId`].
    pub rooms: Vec<Room>,
    /// Number of candidates that were sampled.
    pub candidates: usize,
    /// Number of candidates rejected by size, containment, or overlap checks.
    pub rejected: usize,
    /// How the separation phase ended.
    pub separation: Separation,
}

/// Outcome of the iterative separation phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Separation {
    /// Number of sweeps performed.
    pub passes: u32,
    /// Whether the final sweep found no overlapping pair.
    pub converged: bool,
}

/// Pure system that places rooms on a blocked grid.
#[derive(Clone, Debug, Default)]
pub struct RoomPlacer {
    config: Config,
}

impl RoomPlacer {
    /// Creates a placer using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration the placer runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Places rooms and stamps their floor into `grid`.
    ///
    /// Rooms that survive are guaranteed to lie inside the margin and to keep
    /// `room_spacing` cells of wall on every side. Failing to separate every
    /// candidate is tolerated; ending with no room at all is not.
    pub fn place<R: Rng + ?Sized>(
        &self,
        grid: &mut Grid,
        rng: &mut R,
    ) -> Result<Placement, GenerationError> {
        let (columns, rows) = grid.dimensions();
        let margin = self.config.margin;
        if columns <= margin.saturating_mul(2) || rows <= margin.saturating_mul(2) {
            return Err(GenerationError::EmptyMap { columns, rows });
        }

        let mut candidates = self.sample_candidates(columns, rows, rng)?;
        let spacing = to_signed(self.config.room_spacing);
        let separation = separate(
            &mut candidates,
            spacing,
            self.config.max_separation_passes,
        );
        if !separation.converged {
            warn!(
                "room separation gave up after {} passes; overlapping candidates will be dropped",
                separation.passes
            );
        }
        for candidate in &mut candidates {
            candidate.pull_inside(margin, columns, rows);
        }

        let mut rooms: Vec<Room> = Vec::new();
        let mut rejected = 0;
        for candidate in &candidates {
            match self.accept(candidate, &rooms, columns, rows) {
                Ok(bounds) => {
                    let id = RoomId::new(u32::try_from(rooms.len()).unwrap_or(u32::MAX));
                    grid.fill_rect(bounds, CellState::Open);
                    rooms.push(Room::new(id, bounds));
                }
                Err(reason) => {
                    rejected += 1;
                    debug!("rejected candidate room {candidate:?}: {reason}");
                }
            }
        }

        if rooms.is_empty() {
            return Err(GenerationError::NoRoomsSurvived {
                candidates: candidates.len(),
            });
        }

        info!(
            "placed {} rooms from {} candidates ({} rejected)",
            rooms.len(),
            candidates.len(),
            rejected
        );

        Ok(Placement {
            rooms,
            candidates: candidates.len(),
            rejected,
            separation,
        })
    }

    fn sample_candidates<R: Rng + ?Sized>(
        &self,
        columns: u32,
        rows: u32,
        rng: &mut R,
    ) -> Result<Vec<Candidate>, GenerationError> {
        let sizes = Normal::new(self.config.size_mean, self.config.size_deviation).map_err(
            |_| GenerationError::InvalidConfig {
                reason: "room size distribution needs a finite, non-negative deviation",
            },
        )?;
        let margin = to_signed(self.config.margin);
        let columns = to_signed(columns);
        let rows = to_signed(rows);

        let mut candidates = Vec::with_capacity(self.config.candidate_count);
        for _ in 0..self.config.candidate_count {
            let width = sample_extent(&sizes, rng).min(columns);
            let height = sample_extent(&sizes, rng).min(rows);
            let x = sample_position(margin, columns - margin - width, rng);
            let y = sample_position(margin, rows - margin - height, rng);
            candidates.push(Candidate {
                x,
                y,
                width,
                height,
            });
        }
        Ok(candidates)
    }

    fn accept(
        &self,
        candidate: &Candidate,
        accepted: &[Room],
        columns: u32,
        rows: u32,
    ) -> Result<CellRect, Rejection> {
        let min_size = to_signed(self.config.min_room_size);
        if candidate.width <= min_size || candidate.height <= min_size {
            return Err(Rejection::TooSmall);
        }

        let margin = to_signed(self.config.margin);
        let contained = candidate.x >= margin
            && candidate.y >= margin
            && candidate.x + candidate.width <= to_signed(columns) - margin
            && candidate.y + candidate.height <= to_signed(rows) - margin;
        if !contained {
            return Err(Rejection::OutsideMargin);
        }

        let bounds = candidate.to_rect().ok_or(Rejection::OutsideMargin)?;
        if accepted
            .iter()
            .any(|room| room.bounds().overlaps_with_spacing(&bounds, self.config.room_spacing))
        {
            return Err(Rejection::Crowded);
        }

        Ok(bounds)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rejection {
    TooSmall,
    OutsideMargin,
    Crowded,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::TooSmall => "below the minimum room size",
            Self::OutsideMargin => "too close to the map edge",
            Self::Crowded => "overlaps an accepted room",
        };
        f.write_str(reason)
    }
}

/// Candidate rectangle in signed cells; separation may push it off the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Candidate {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl Candidate {
    fn to_rect(self) -> Option<CellRect> {
        Some(CellRect::from_origin_and_size(
            CellCoord::new(u32::try_from(self.x).ok()?, u32::try_from(self.y).ok()?),
            CellRectSize::new(
                u32::try_from(self.width).ok()?,
                u32::try_from(self.height).ok()?,
            ),
        ))
    }

    /// Moves a candidate that separation pushed past the margin back inside it.
    /// Candidates wider or taller than the usable area stay against the
    /// low margin and fail containment.
    fn pull_inside(&mut self, margin: u32, columns: u32, rows: u32) {
        let margin = to_signed(margin);
        self.x = self.x.min(to_signed(columns) - margin - self.width).max(margin);
        self.y = self.y.min(to_signed(rows) - margin - self.height).max(margin);
    }

    /// Twice the center along the axis, to stay in integers.
    fn doubled_center(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => 2 * self.x + self.width,
            Axis::Vertical => 2 * self.y + self.height,
        }
    }

    fn shift(&mut self, axis: Axis, amount: i32) {
        match axis {
            Axis::Horizontal => self.x += amount,
            Axis::Vertical => self.y += amount,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Penetration of two candidates inflated by `spacing`, along the axis that
/// needs the smaller push. `None` when they do not overlap.
fn penetration(a: &Candidate, b: &Candidate, spacing: i32) -> Option<(Axis, i32)> {
    let overlap_x =
        (a.x + a.width + spacing).min(b.x + b.width + spacing) - (a.x - spacing).max(b.x - spacing);
    let overlap_y = (a.y + a.height + spacing).min(b.y + b.height + spacing)
        - (a.y - spacing).max(b.y - spacing);

    if overlap_x <= 0 || overlap_y <= 0 {
        return None;
    }

    if overlap_x <= overlap_y {
        Some((Axis::Horizontal, overlap_x))
    } else {
        Some((Axis::Vertical, overlap_y))
    }
}

/// Pushes overlapping candidates apart, each moving half the overlap along the
/// cheaper axis, until a sweep finds nothing to fix or `max_passes` runs out.
fn separate(candidates: &mut [Candidate], spacing: i32, max_passes: u32) -> Separation {
    let mut passes = 0;
    while passes < max_passes {
        passes += 1;
        let mut moved = false;

        for first in 0..candidates.len() {
            let (head, tail) = candidates.split_at_mut(first + 1);
            let a = &mut head[first];
            for b in tail.iter_mut() {
                let Some((axis, overlap)) = penetration(a, b, spacing) else {
                    continue;
                };

                let half = overlap / 2;
                let rest = overlap - half;
                if a.doubled_center(axis) <= b.doubled_center(axis) {
                    a.shift(axis, -half);
                    b.shift(axis, rest);
                } else {
                    a.shift(axis, rest);
                    b.shift(axis, -half);
                }
                moved = true;
            }
        }

        if !moved {
            return Separation {
                passes,
                converged: true,
            };
        }
    }

    Separation {
        passes,
        converged: !any_overlap(candidates, spacing),
    }
}

fn any_overlap(candidates: &[Candidate], spacing: i32) -> bool {
    candidates.iter().enumerate().any(|(first, a)| {
        candidates[first + 1..]
            .iter()
            .any(|b| penetration(a, b, spacing).is_some())
    })
}

fn sample_extent<R: Rng + ?Sized>(sizes: &Normal<f32>, rng: &mut R) -> i32 {
    let value = sizes.sample(rng).round();
    if value.is_finite() {
        (value as i32).max(1)
    } else {
        1
    }
}

fn sample_position<R: Rng + ?Sized>(low: i32, high: i32, rng: &mut R) -> i32 {
    if high <= low {
        low
    } else {
        rng.gen_range(low..=high)
    }
}

fn to_signed(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
