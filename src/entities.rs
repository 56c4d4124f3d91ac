//! Transient billboard entities, drawn after solid geometry.
//!
//! Entities use the same bearing projection as walls and are depth-tested
//! per column against the finished wall set, so a nearer wall occludes them
//! through portals without any per-entity visibility walk.

use glam::Vec2;

use crate::camera::{Frustum, Viewer, screen_x, screen_y};
use crate::raster::fill_circle_depth;

pub struct Entity {
    pub pos: Vec2,
    /// World height of the disc centre.
    pub z: f32,
    /// World-space radius; the on-screen size follows the subtended angle.
    pub radius: f32,
    pub color: u32,
}

impl Entity {
    pub fn render(
        &self,
        buf: &mut [u32],
        width: usize,
        height: usize,
        viewer: &Viewer,
        frustum: &Frustum,
        depths: &mut [f32],
    ) {
        let rel = self.pos - viewer.pos;
        if !frustum.contains_point(rel) {
            return;
        }
        let distance = rel.length();
        if distance <= f32::EPSILON {
            return;
        }

        let screen_w = width as f32;
        let screen_h = height as f32;
        let vertical_fov = viewer.fov / (screen_w / screen_h);

        let cx = screen_x(viewer.pos, self.pos, frustum, screen_w);
        let cy = screen_y(distance, self.z - viewer.eye_z, vertical_fov, screen_h);
        let half_angle = (self.radius / distance).atan();
        let screen_radius = half_angle / (vertical_fov / 2.0) * (screen_h / 2.0);

        fill_circle_depth(buf, width, cx, cy, screen_radius, self.color, distance, depths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::pack_rgb;
    use std::f32::consts::FRAC_PI_2;

    const W: usize = 320;
    const H: usize = 240;

    fn viewer() -> Viewer {
        Viewer {
            pos: Vec2::ZERO,
            yaw: 0.0,
            eye_z: 2.0,
            fov: FRAC_PI_2,
            view_distance: 10_000.0,
        }
    }

    #[test]
    fn entity_ahead_draws_a_centred_disc() {
        let v = viewer();
        let frustum = v.frustum();
        let mut buf = vec![0u32; W * H];
        let mut depths = vec![0.0f32; W];
        let color = pack_rgb(255.0, 0.0, 0.0);
        let entity = Entity {
            pos: Vec2::new(6.0, 0.0),
            z: 2.0,
            radius: 0.5,
            color,
        };
        entity.render(&mut buf, W, H, &v, &frustum, &mut depths);
        assert_eq!(buf[(H / 2) * W + W / 2], color);
        // Passing the depth test records the entity's own distance.
        assert!((depths[W / 2] - 1.0 / 6.0).abs() < 1e-5);
    }

    #[test]
    fn entity_outside_the_frustum_is_skipped() {
        let v = viewer();
        let frustum = v.frustum();
        let mut buf = vec![0u32; W * H];
        let mut depths = vec![0.0f32; W];
        let entity = Entity {
            pos: Vec2::new(-6.0, 0.0), // behind the viewer
            z: 2.0,
            radius: 0.5,
            color: pack_rgb(255.0, 0.0, 0.0),
        };
        entity.render(&mut buf, W, H, &v, &frustum, &mut depths);
        assert!(buf.iter().all(|&px| px == 0));
    }

    #[test]
    fn entity_behind_recorded_walls_is_skipped() {
        let v = viewer();
        let frustum = v.frustum();
        let mut buf = vec![0u32; W * H];
        let mut depths = vec![1.0f32 / 3.0; W]; // walls at distance 3
        let entity = Entity {
            pos: Vec2::new(6.0, 0.0),
            z: 2.0,
            radius: 0.5,
            color: pack_rgb(255.0, 0.0, 0.0),
        };
        entity.render(&mut buf, W, H, &v, &frustum, &mut depths);
        assert!(buf.iter().all(|&px| px == 0));
    }
}
