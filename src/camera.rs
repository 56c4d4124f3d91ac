//! Viewer pose, view frustum, and the angular screen projection.
//!
//! Projection here is bearing-based rather than a pinhole matrix: a point's
//! screen column is its angle from the frustum-left direction over the total
//! field of view. Walls are clipped to the frustum first, which keeps the
//! bearing inside `[0, fov]` and makes the model valid for convex sectors.

use glam::Vec2;

use crate::math::{GEOM_EPSILON, segment_intersection, vector_angle};

pub struct Viewer {
    pub pos: Vec2,
    /// Facing direction in radians.
    pub yaw: f32,
    pub eye_z: f32,
    /// Horizontal field of view in radians.
    pub fov: f32,
    /// Ray-cast length used when clipping walls against the frustum edges.
    pub view_distance: f32,
}

impl Viewer {
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.yaw.cos(), self.yaw.sin())
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::new(self.yaw, self.fov)
    }
}

/// The pair of unit direction vectors bounding the horizontal view. The
/// left/right order is significant for bearing and angle-sign computations.
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub left: Vec2,
    pub right: Vec2,
}

impl Frustum {
    pub fn new(yaw: f32, fov: f32) -> Self {
        let left = yaw - fov / 2.0;
        let right = yaw + fov / 2.0;
        Frustum {
            left: Vec2::new(left.cos(), left.sin()),
            right: Vec2::new(right.cos(), right.sin()),
        }
    }

    /// Horizontal angle spanned between the two boundary directions.
    pub fn fov(&self) -> f32 {
        vector_angle(self.left, self.right)
    }

    /// Absolute world angle of the left boundary direction.
    pub fn left_angle(&self) -> f32 {
        self.left.y.atan2(self.left.x)
    }

    /// Half-plane test for a single viewer-relative point.
    pub fn contains_point(&self, rel: Vec2) -> bool {
        let left_perp = Vec2::new(-self.left.y, self.left.x);
        let right_perp = Vec2::new(self.right.y, -self.right.x);
        left_perp.dot(rel) > GEOM_EPSILON && right_perp.dot(rel) > GEOM_EPSILON
    }

    /// Half-plane test for a clipped wall span: the left endpoint must clear
    /// the right boundary and the right endpoint the left boundary.
    fn contains_span(&self, left_rel: Vec2, right_rel: Vec2) -> bool {
        let left_perp = Vec2::new(-self.left.y, self.left.x);
        let right_perp = Vec2::new(self.right.y, -self.right.x);
        right_perp.dot(left_rel) > GEOM_EPSILON && left_perp.dot(right_rel) > GEOM_EPSILON
    }

    /// Clip the wall segment AB against the frustum boundary rays cast from
    /// `viewer`. Where a boundary ray crosses the segment, the crossing
    /// replaces the corresponding endpoint; endpoints already inside are kept.
    /// Returns `None` when the surviving span falls outside the view.
    pub fn clip_segment(
        &self,
        viewer: Vec2,
        a: Vec2,
        b: Vec2,
        view_distance: f32,
    ) -> Option<(Vec2, Vec2)> {
        let left_hit = segment_intersection(viewer, viewer + self.left * view_distance, a, b);
        let right_hit = segment_intersection(viewer, viewer + self.right * view_distance, a, b);
        let left_point = left_hit.unwrap_or(a);
        let right_point = right_hit.unwrap_or(b);
        if !self.contains_span(left_point - viewer, right_point - viewer) {
            return None;
        }
        Some((left_point, right_point))
    }

    /// Bearing of `point` from the left boundary direction. Inside `[0, fov]`
    /// for points that survived clipping.
    pub fn bearing(&self, viewer: Vec2, point: Vec2) -> f32 {
        vector_angle(self.left, point - viewer)
    }

    /// The narrowed frustum spanned by two clipped wall endpoints, used when
    /// descending through a portal.
    pub fn narrowed(&self, viewer: Vec2, left_point: Vec2, right_point: Vec2) -> Frustum {
        let base = self.left_angle();
        let left = base + self.bearing(viewer, left_point);
        let right = base + self.bearing(viewer, right_point);
        Frustum {
            left: Vec2::new(left.cos(), left.sin()),
            right: Vec2::new(right.cos(), right.sin()),
        }
    }
}

/// Screen column for a world point: bearing over fov, scaled to the column
/// width. Callers add their render-bound left edge on top.
pub fn screen_x(viewer: Vec2, point: Vec2, frustum: &Frustum, column_width: f32) -> f32 {
    frustum.bearing(viewer, point) / frustum.fov() * column_width
}

/// Screen row for a point at horizontal distance `distance` and height
/// `rel_height` relative to the eye. The vertical angle is the angle between
/// straight-ahead `(0, 1)` and `(rel_height, distance)`, signed by the sign
/// of the height.
pub fn screen_y(distance: f32, rel_height: f32, vertical_fov: f32, screen_height: f32) -> f32 {
    let sign = if rel_height < 0.0 { -1.0 } else { 1.0 };
    let angle = vector_angle(Vec2::new(0.0, 1.0), Vec2::new(rel_height, distance)) * sign;
    let half = screen_height / 2.0;
    half - half * (angle / (vertical_fov / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn frustum_ahead() -> Frustum {
        // Facing +X with a 90 degree field of view.
        Frustum::new(0.0, FRAC_PI_2)
    }

    #[test]
    fn frustum_spans_the_requested_fov() {
        let f = frustum_ahead();
        assert!((f.fov() - FRAC_PI_2).abs() < 1e-5);
        assert!((f.left_angle() + FRAC_PI_2 / 2.0).abs() < 1e-5);
    }

    #[test]
    fn clipping_a_fully_visible_wall_keeps_it_unchanged() {
        let f = frustum_ahead();
        let a = Vec2::new(5.0, -1.0);
        let b = Vec2::new(5.0, 1.0);
        let (ca, cb) = f.clip_segment(Vec2::ZERO, a, b, 10_000.0).unwrap();
        assert!(ca.distance(a) < 1e-5);
        assert!(cb.distance(b) < 1e-5);
    }

    #[test]
    fn wall_behind_the_viewer_is_culled() {
        let f = frustum_ahead();
        assert!(
            f.clip_segment(
                Vec2::ZERO,
                Vec2::new(-5.0, -1.0),
                Vec2::new(-5.0, 1.0),
                10_000.0
            )
            .is_none()
        );
        // Same relative geometry from a moved viewer.
        let viewer = Vec2::new(100.0, 40.0);
        assert!(
            f.clip_segment(
                viewer,
                viewer + Vec2::new(-5.0, -1.0),
                viewer + Vec2::new(-5.0, 1.0),
                10_000.0
            )
            .is_none()
        );
    }

    #[test]
    fn wide_wall_is_clipped_to_the_frustum_edges() {
        let f = frustum_ahead();
        let (ca, cb) = f
            .clip_segment(
                Vec2::ZERO,
                Vec2::new(5.0, -50.0),
                Vec2::new(5.0, 50.0),
                10_000.0,
            )
            .unwrap();
        // Boundary rays at +-45 degrees cross x = 5 at y = -+5.
        assert!(ca.distance(Vec2::new(5.0, -5.0)) < 1e-2);
        assert!(cb.distance(Vec2::new(5.0, 5.0)) < 1e-2);
    }

    #[test]
    fn bearing_maps_linearly_onto_screen_columns() {
        let f = frustum_ahead();
        let width = 640.0;
        let on_left = f.left * 10.0;
        let on_right = f.right * 10.0;
        let ahead = Vec2::new(10.0, 0.0);
        assert!(screen_x(Vec2::ZERO, on_left, &f, width).abs() < 1e-2);
        assert!((screen_x(Vec2::ZERO, on_right, &f, width) - width).abs() < 1e-2);
        assert!((screen_x(Vec2::ZERO, ahead, &f, width) - width / 2.0).abs() < 1.0);
    }

    #[test]
    fn eye_level_projects_to_the_screen_centre() {
        let y = screen_y(10.0, 0.0, FRAC_PI_2, 480.0);
        assert!((y - 240.0).abs() < 1e-3);
    }

    #[test]
    fn heights_project_symmetrically_around_the_centre() {
        let h = 480.0;
        let above = screen_y(10.0, 3.0, FRAC_PI_2, h);
        let below = screen_y(10.0, -3.0, FRAC_PI_2, h);
        assert!(above < h / 2.0);
        assert!(below > h / 2.0);
        assert!((above + below - h).abs() < 1e-2);
    }

    #[test]
    fn narrowed_frustum_follows_the_clipped_endpoints() {
        let f = frustum_ahead();
        let left_point = Vec2::new(10.0, -2.0);
        let right_point = Vec2::new(10.0, 4.0);
        let narrowed = f.narrowed(Vec2::ZERO, left_point, right_point);
        assert!(narrowed.fov() < f.fov());
        // The narrowed boundaries pass through the wall endpoints.
        assert!(vector_angle(narrowed.left, left_point) < 1e-4);
        assert!(vector_angle(narrowed.right, right_point) < 1e-4);
    }
}
