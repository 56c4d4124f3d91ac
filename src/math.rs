//! Geometry primitives shared by clipping, projection, and the sector map.

use glam::Vec2;

/// Tolerance for half-plane and point-on-segment tests. Loose enough to
/// suppress grazing-edge flicker from floating point drift.
pub const GEOM_EPSILON: f32 = 0.005;

/// Angle between two vectors, always in `[0, PI]`.
///
/// The acos argument is clamped so that float drift on near-parallel vectors
/// never produces NaN. Degenerate (zero-length) inputs yield 0.
pub fn vector_angle(a: Vec2, b: Vec2) -> f32 {
    let len = a.length() * b.length();
    if len <= f32::EPSILON {
        return 0.0;
    }
    (a.dot(b) / len).clamp(-1.0, 1.0).acos()
}

/// True if `p` lies on the segment AB, within [`GEOM_EPSILON`].
fn point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    a.distance(p) + b.distance(p) - a.distance(b) < GEOM_EPSILON
}

/// Intersection point of segments A1-A2 and B1-B2, or `None` when the
/// segments are parallel or the line crossing falls outside either segment.
pub fn segment_intersection(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<Vec2> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = r.perp_dot(s);
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let t = (b1 - a1).perp_dot(s) / denom;
    let p = a1 + r * t;
    if point_on_segment(a1, a2, p) && point_on_segment(b1, b2, p) {
        Some(p)
    } else {
        None
    }
}

/// Parity (ray) test against a closed boundary loop.
///
/// `vertices` must repeat the first vertex as the last. Each edge whose y
/// range straddles the point toggles the inside flag when the point is left
/// of the crossing; an odd number of toggles means inside.
pub fn point_in_polygon(vertices: &[Vec2], p: Vec2) -> bool {
    let mut inside = false;
    for pair in vertices.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if (a.y > p.y) != (b.y > p.y) {
            let cross_x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < cross_x {
                inside = !inside;
            }
        }
    }
    inside
}
