#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Room connectivity: turns a room list into the graph corridors are carved from.

mod triangulation;

use std::cmp::Ordering;

use glam::DVec2;
use log::{debug, warn};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use veiled_hollow_core::{GenerationError, RoomId};
use veiled_hollow_world::{Room, RoomEdgeKind, RoomGraph};

/// Tuning knobs controlling how many alternate routes the dungeon gets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Share of the non-spanning triangulation edges re-added as loops, in `[0, 1]`.
    /// Zero yields a pure tree; higher values make the dungeon more circular.
    pub extra_edge_fraction: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extra_edge_fraction: 0.15,
        }
    }
}

/// Pure system that derives the room graph.
#[derive(Clone, Debug, Default)]
pub struct ConnectivityGraph {
    config: Config,
}

impl ConnectivityGraph {
    /// Creates the system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration the system runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds a connected graph over `rooms`.
    ///
    /// Three or more rooms are triangulated, reduced to a minimum spanning
    /// tree, and enriched with a random share of the leftover triangle edges.
    /// Smaller or degenerate layouts are chained to their nearest neighbours.
    /// A reachability sweep always runs last and links any room it cannot
    /// reach, so the returned graph is connected.
    pub fn build<R: Rng + ?Sized>(
        &self,
        rooms: &[Room],
        rng: &mut R,
    ) -> Result<RoomGraph, GenerationError> {
        if rooms.is_empty() {
            return Err(GenerationError::EmptyRoomList);
        }

        let centers: Vec<DVec2> = rooms
            .iter()
            .map(|room| {
                let center = room.center();
                DVec2::new(f64::from(center.column()), f64::from(center.row()))
            })
            .collect();

        let mut graph = RoomGraph::new(rooms.len());
        let triangulation = triangulation::delaunay_edges(&centers);
        if triangulation.is_empty() {
            if rooms.len() >= 3 {
                debug!("room centers are collinear; chaining rooms to their nearest neighbours");
            }
            chain_nearest(&centers, &mut graph);
        } else {
            let leftover = add_spanning_tree(&centers, triangulation, &mut graph);
            self.add_loops(leftover, &mut graph, rng);
        }

        let repaired = repair_reachability(&centers, &mut graph);
        if repaired > 0 && rooms.len() >= 3 {
            warn!("reachability sweep linked {repaired} disconnected rooms");
        }

        Ok(graph)
    }

    fn add_loops<R: Rng + ?Sized>(
        &self,
        mut leftover: Vec<(usize, usize)>,
        graph: &mut RoomGraph,
        rng: &mut R,
    ) {
        let fraction = self.config.extra_edge_fraction.clamp(0.0, 1.0);
        let wanted = (fraction * leftover.len() as f32).round() as usize;
        leftover.shuffle(rng);

        for &(a, b) in leftover.iter().take(wanted) {
            let _ = graph.add_edge(room_id(a), room_id(b), RoomEdgeKind::Loop);
        }
    }
}

/// Kruskal over the triangulation edges. Returns the edges the tree skipped.
fn add_spanning_tree(
    centers: &[DVec2],
    mut edges: Vec<(usize, usize)>,
    graph: &mut RoomGraph,
) -> Vec<(usize, usize)> {
    edges.sort_by(|&(a1, b1), &(a2, b2)| {
        let first = centers[a1].distance_squared(centers[b1]);
        let second = centers[a2].distance_squared(centers[b2]);
        first
            .total_cmp(&second)
            .then_with(|| (a1, b1).cmp(&(a2, b2)))
    });

    let mut components = DisjointSet::new(centers.len());
    let mut leftover = Vec::new();
    for (a, b) in edges {
        if components.union(a, b) {
            let _ = graph.add_edge(room_id(a), room_id(b), RoomEdgeKind::Spanning);
        } else {
            leftover.push((a, b));
        }
    }
    leftover
}

/// Walks from room zero, always linking to the closest room not yet chained.
fn chain_nearest(centers: &[DVec2], graph: &mut RoomGraph) {
    let mut chained = vec![false; centers.len()];
    let mut current = 0;
    chained[current] = true;

    while let Some(next) = nearest(centers, current, |index| !chained[index]) {
        let _ = graph.add_edge(room_id(current), room_id(next), RoomEdgeKind::Fallback);
        chained[next] = true;
        current = next;
    }
}

/// Links every room unreachable from room zero to its nearest reached room.
/// Returns the number of edges added.
fn repair_reachability(centers: &[DVec2], graph: &mut RoomGraph) -> usize {
    let mut added = 0;
    loop {
        let reached = graph.reached_from(RoomId::new(0));
        let Some(orphan) = reached.iter().position(|reached| !reached) else {
            return added;
        };
        let Some(anchor) = nearest(centers, orphan, |index| reached[index]) else {
            return added;
        };
        if graph.add_edge(room_id(orphan), room_id(anchor), RoomEdgeKind::Fallback) {
            added += 1;
        } else {
            return added;
        }
    }
}

fn nearest<F>(centers: &[DVec2], from: usize, mut eligible: F) -> Option<usize>
where
    F: FnMut(usize) -> bool,
{
    let origin = centers[from];
    (0..centers.len())
        .filter(|&index| index != from && eligible(index))
        .min_by(|&a, &b| {
            origin
                .distance_squared(centers[a])
                .total_cmp(&origin.distance_squared(centers[b]))
                .then(a.cmp(&b))
        })
}

fn room_id(index: usize) -> RoomId {
    RoomId::new(u32::try_from(index).unwrap_or(u32::MAX))
}

/// Union-find with path halving and union by size.
#[derive(Debug)]
struct DisjointSet {
    parents: Vec<usize>,
    sizes: Vec<usize>,
}

impl DisjointSet {
    fn new(count: usize) -> Self {
        Self {
            parents: (0..count).collect(),
            sizes: vec![1; count],
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parents[node] != node {
            self.parents[node] = self.parents[self.parents[node]];
            node = self.parents[node];
        }
        node
    }

    /// Merges the sets of `a` and `b`; `false` if they were already joined.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a == root_b {
            return false;
        }

        let (large, small) = match self.sizes[root_a].cmp(&self.sizes[root_b]) {
            Ordering::Less => (root_b, root_a),
            _ => (root_a, root_b),
        };
        self.parents[small] = large;
        self.sizes[large] += self.sizes[small];
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use veiled_hollow_core::{CellCoord, CellRect, CellRectSize};

    /// Room whose center lands on `(column, row)`.
    fn room_at(index: u32, column: u32, row: u32) -> Room {
        Room::new(
            RoomId::new(index),
            CellRect::from_origin_and_size(
                CellCoord::new(column - 2, row - 2),
                CellRectSize::new(4, 4),
            ),
        )
    }

    fn kinds(graph: &RoomGraph, kind: RoomEdgeKind) -> usize {
        graph.edges().iter().filter(|edge| edge.kind() == kind).count()
    }

    #[test]
    fn empty_room_list_is_a_hard_failure() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            ConnectivityGraph::default().build(&[], &mut rng),
            Err(GenerationError::EmptyRoomList)
        );
    }

    #[test]
    fn single_room_needs_no_edges() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let graph = ConnectivityGraph::default()
            .build(&[room_at(0, 10, 10)], &mut rng)
            .expect("graph");
        assert!(graph.edges().is_empty());
        assert!(graph.is_connected());
    }

    #[test]
    fn two_rooms_are_chained() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let rooms = [room_at(0, 10, 10), room_at(1, 40, 12)];
        let graph = ConnectivityGraph::default()
            .build(&rooms, &mut rng)
            .expect("graph");
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.edges()[0].kind(), RoomEdgeKind::Fallback);
        assert!(graph.is_connected());
    }

    #[test]
    fn collinear_rooms_fall_back_to_nearest_chain() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let rooms = [
            room_at(0, 30, 10),
            room_at(1, 10, 10),
            room_at(2, 50, 10),
            room_at(3, 20, 10),
        ];
        let graph = ConnectivityGraph::default()
            .build(&rooms, &mut rng)
            .expect("graph");
        assert!(graph.is_connected());
        assert_eq!(graph.edges().len(), 3);
        assert_eq!(kinds(&graph, RoomEdgeKind::Fallback), 3);
    }

    #[test]
    fn spanning_tree_prefers_short_edges() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let rooms = [
            room_at(0, 10, 10),
            room_at(1, 30, 10),
            room_at(2, 20, 30),
            room_at(3, 20, 17),
        ];
        let tree_only = ConnectivityGraph::new(Config {
            extra_edge_fraction: 0.0,
        })
        .build(&rooms, &mut rng)
        .expect("graph");

        assert_eq!(kinds(&tree_only, RoomEdgeKind::Spanning), 3);
        assert_eq!(tree_only.edges().len(), 3);
        for outer in 0..3 {
            assert!(
                tree_only.contains_edge(RoomId::new(outer), RoomId::new(3)),
                "outer room {outer} should hang off the central room"
            );
        }

        let every_edge = ConnectivityGraph::new(Config {
            extra_edge_fraction: 1.0,
        })
        .build(&rooms, &mut rng)
        .expect("graph");
        assert_eq!(kinds(&every_edge, RoomEdgeKind::Loop), 3);
        assert_eq!(every_edge.edges().len(), 6);
    }

    #[test]
    fn disjoint_set_merges_once() {
        let mut set = DisjointSet::new(4);
        assert!(set.union(0, 1));
        assert!(set.union(2, 3));
        assert!(set.union(1, 3));
        assert!(!set.union(0, 2));
        assert_eq!(set.find(0), set.find(3));
    }

    #[test]
    fn repair_links_isolated_rooms() {
        let centers = [
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(50.0, 0.0),
        ];
        let mut graph = RoomGraph::new(3);
        assert!(graph.add_edge(RoomId::new(0), RoomId::new(1), RoomEdgeKind::Spanning));

        assert_eq!(repair_reachability(&centers, &mut graph), 1);
        assert!(graph.contains_edge(RoomId::new(1), RoomId::new(2)));
        assert!(graph.is_connected());
    }
}
