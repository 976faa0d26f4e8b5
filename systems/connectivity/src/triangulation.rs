//! Bowyer–Watson Delaunay triangulation over room centers.

use std::collections::BTreeSet;

use glam::DVec2;

#[derive(Clone, Copy, Debug)]
struct Triangle {
    vertices: [usize; 3],
    circumcenter: DVec2,
    radius_squared: f64,
}

impl Triangle {
    fn new(vertices: [usize; 3], points: &[DVec2]) -> Option<Self> {
        let [a, b, c] = vertices.map(|index| points[index]);
        let determinant = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
        if determinant.abs() < f64::EPSILON {
            return None;
        }

        let (a_len, b_len, c_len) = (a.length_squared(), b.length_squared(), c.length_squared());
        let circumcenter = DVec2::new(
            (a_len * (b.y - c.y) + b_len * (c.y - a.y) + c_len * (a.y - b.y)) / determinant,
            (a_len * (c.x - b.x) + b_len * (a.x - c.x) + c_len * (b.x - a.x)) / determinant,
        );

        Some(Self {
            vertices,
            circumcenter,
            radius_squared: circumcenter.distance_squared(a),
        })
    }

    /// Strict test: a point on the circle is outside. Cocircular room
    /// centers can then leave a room off every triangle, and
    /// `repair_reachability` in the crate root links it back up.
    fn circumcircle_contains(&self, point: DVec2) -> bool {
        self.circumcenter.distance_squared(point) < self.radius_squared
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [ordered(a, b), ordered(b, c), ordered(a, c)]
    }
}

/// Unique undirected edges of the Delaunay triangulation of `points`, sorted.
///
/// Returns nothing for fewer than three points or when every point lies on
/// one line; callers are expected to connect such layouts another way.
pub(crate) fn delaunay_edges(points: &[DVec2]) -> Vec<(usize, usize)> {
    if points.len() < 3 {
        return Vec::new();
    }

    let mut vertices = points.to_vec();
    let real_count = vertices.len();
    vertices.extend(super_triangle(points));

    let Some(initial) = Triangle::new([real_count, real_count + 1, real_count + 2], &vertices)
    else {
        return Vec::new();
    };
    let mut triangles = vec![initial];

    for index in 0..real_count {
        let point = vertices[index];
        let (bad, good): (Vec<Triangle>, Vec<Triangle>) = triangles
            .into_iter()
            .partition(|triangle| triangle.circumcircle_contains(point));
        triangles = good;

        for (a, b) in cavity_boundary(&bad) {
            if let Some(triangle) = Triangle::new([a, b, index], &vertices) {
                triangles.push(triangle);
            }
        }
    }

    let mut edges = BTreeSet::new();
    for triangle in triangles
        .iter()
        .filter(|triangle| triangle.vertices.iter().all(|&vertex| vertex < real_count))
    {
        for edge in triangle.edges() {
            let _ = edges.insert(edge);
        }
    }
    edges.into_iter().collect()
}

/// Edges that belong to exactly one of the removed triangles.
fn cavity_boundary(bad: &[Triangle]) -> Vec<(usize, usize)> {
    let mut boundary = Vec::new();
    for (position, triangle) in bad.iter().enumerate() {
        for edge in triangle.edges() {
            let shared = bad
                .iter()
                .enumerate()
                .any(|(other, candidate)| other != position && candidate.edges().contains(&edge));
            if !shared {
                boundary.push(edge);
            }
        }
    }
    boundary
}

fn super_triangle(points: &[DVec2]) -> [DVec2; 3] {
    let (min, max) = points.iter().fold(
        (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
        |(min, max), point| (min.min(*point), max.max(*point)),
    );
    let span = (max - min).max_element().max(1.0);
    let mid = (min + max) * 0.5;

    [
        DVec2::new(mid.x - 20.0 * span, mid.y - span),
        DVec2::new(mid.x, mid.y + 20.0 * span),
        DVec2::new(mid.x + 20.0 * span, mid.y - span),
    ]
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
