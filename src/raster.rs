//! Scanline rasterizer over a packed row-major pixel buffer.
//!
//! One trapezoid primitive draws ceiling, wall, and floor spans: the fill
//! quad and an outer clip quad are each given as two 2-point edges, and each
//! screen column interpolates both pairs by per-column slope accumulation
//! rather than per-pixel division. Depth-aware variants keep a per-column
//! inverse-distance buffer so transient entities can be occlusion-tested
//! against finished wall geometry.

use glam::Vec2;

const BLACK: u32 = 0;

/// Pack a color into the `0x00RRGGBB` layout the surface presents.
/// Out-of-range channels are clamped, so shading formulas may overshoot.
#[inline]
pub fn pack_rgb(r: f32, g: f32, b: f32) -> u32 {
    let r = r.round().clamp(0.0, 255.0) as u32;
    let g = g.round().clamp(0.0, 255.0) as u32;
    let b = b.round().clamp(0.0, 255.0) as u32;
    (r << 16) | (g << 8) | b
}

/// How a depth-aware fill interacts with the per-column depth buffer.
#[derive(Clone, Copy)]
pub enum DepthMode {
    /// Opaque wall geometry: draw unconditionally, keep the nearest
    /// (largest) inverse distance per column.
    Write,
    /// Transient entities and effects: skip columns that are farther than
    /// the recorded wall.
    Test,
}

#[allow(clippy::too_many_arguments)]
pub fn fill_trapezoid(
    buf: &mut [u32],
    width: usize,
    top: [Vec2; 2],
    bottom: [Vec2; 2],
    clip_top: [Vec2; 2],
    clip_bottom: [Vec2; 2],
    color: u32,
    outline: bool,
) {
    trapezoid_impl(
        buf,
        width,
        top,
        bottom,
        clip_top,
        clip_bottom,
        color,
        outline,
        None,
    );
}

#[allow(clippy::too_many_arguments)]
pub fn fill_trapezoid_depth(
    buf: &mut [u32],
    width: usize,
    top: [Vec2; 2],
    bottom: [Vec2; 2],
    clip_top: [Vec2; 2],
    clip_bottom: [Vec2; 2],
    color: u32,
    outline: bool,
    left_dist: f32,
    right_dist: f32,
    mode: DepthMode,
    depths: &mut [f32],
) {
    trapezoid_impl(
        buf,
        width,
        top,
        bottom,
        clip_top,
        clip_bottom,
        color,
        outline,
        Some((1.0 / left_dist, 1.0 / right_dist, mode, depths)),
    );
}

#[allow(clippy::too_many_arguments)]
fn trapezoid_impl(
    buf: &mut [u32],
    width: usize,
    top: [Vec2; 2],
    bottom: [Vec2; 2],
    clip_top: [Vec2; 2],
    clip_bottom: [Vec2; 2],
    color: u32,
    outline: bool,
    mut depth: Option<(f32, f32, DepthMode, &mut [f32])>,
) {
    let height = (buf.len() / width) as i32;
    let fill_span = top[1].x - top[0].x;
    let clip_span = clip_top[1].x - clip_top[0].x;
    if fill_span <= f32::EPSILON || clip_span <= f32::EPSILON {
        return;
    }

    let x0 = top[0].x.round().max(clip_top[0].x.round()).max(0.0) as i32;
    let x1 = top[1].x.round().min(clip_top[1].x.round()).min(width as f32) as i32;
    if x1 <= x0 {
        return;
    }

    let top_slope = (top[1].y - top[0].y) / fill_span;
    let bottom_slope = (bottom[1].y - bottom[0].y) / fill_span;
    let clip_top_slope = (clip_top[1].y - clip_top[0].y) / clip_span;
    let clip_bottom_slope = (clip_bottom[1].y - clip_bottom[0].y) / clip_span;

    let mut fill_top_y = top[0].y + top_slope * (x0 as f32 - top[0].x);
    let mut fill_bottom_y = bottom[0].y + bottom_slope * (x0 as f32 - bottom[0].x);
    let mut clip_top_y = clip_top[0].y + clip_top_slope * (x0 as f32 - clip_top[0].x);
    let mut clip_bottom_y = clip_bottom[0].y + clip_bottom_slope * (x0 as f32 - clip_bottom[0].x);

    for x in x0..x1 {
        let y_start = fill_top_y.max(clip_top_y).round() as i32;
        let y_end = fill_bottom_y.min(clip_bottom_y).round() as i32;
        let ys = y_start.max(0);
        let ye = y_end.min(height);

        let mut skip = false;
        if let Some((inv_left, inv_right, mode, depths)) = depth.as_mut() {
            let lambda = (x as f32 - top[0].x) / fill_span;
            let inv = *inv_left + (*inv_right - *inv_left) * lambda;
            let cell = &mut depths[x as usize];
            match mode {
                DepthMode::Write => {
                    if inv > *cell {
                        *cell = inv;
                    }
                }
                DepthMode::Test => {
                    if inv < *cell {
                        skip = true;
                    }
                }
            }
        }

        if !skip {
            for y in ys..ye {
                let border = outline && (x == x0 || x == x1 - 1 || y == ys || y == ye - 1);
                buf[y as usize * width + x as usize] = if border { BLACK } else { color };
            }
        }

        fill_top_y += top_slope;
        fill_bottom_y += bottom_slope;
        clip_top_y += clip_top_slope;
        clip_bottom_y += clip_bottom_slope;
    }
}

pub fn fill_circle(buf: &mut [u32], width: usize, cx: f32, cy: f32, radius: f32, color: u32) {
    circle_impl(buf, width, cx, cy, radius, color, None);
}

/// Disc fill that is depth-tested per column against wall geometry and, when
/// it passes, records its own distance so later (farther) discs lose.
#[allow(clippy::too_many_arguments)]
pub fn fill_circle_depth(
    buf: &mut [u32],
    width: usize,
    cx: f32,
    cy: f32,
    radius: f32,
    color: u32,
    distance: f32,
    depths: &mut [f32],
) {
    circle_impl(buf, width, cx, cy, radius, color, Some((distance, depths)));
}

fn circle_impl(
    buf: &mut [u32],
    width: usize,
    cx: f32,
    cy: f32,
    radius: f32,
    color: u32,
    mut depth: Option<(f32, &mut [f32])>,
) {
    if radius <= 0.0 {
        return;
    }
    let height = (buf.len() / width) as i32;
    let x0 = ((cx - radius).round() as i32).max(0);
    let x1 = ((cx + radius).round() as i32).min(width as i32 - 1);
    for x in x0..=x1 {
        if let Some((distance, depths)) = depth.as_mut() {
            let inv = 1.0 / *distance;
            let cell = &mut depths[x as usize];
            if inv < *cell {
                continue;
            }
            *cell = inv;
        }
        let dx = x as f32 - cx;
        let half = (radius * radius - dx * dx).max(0.0).sqrt();
        let y0 = ((cy - half).round() as i32).max(0);
        let y1 = ((cy + half).round() as i32).min(height - 1);
        for y in y0..=y1 {
            buf[y as usize * width + x as usize] = color;
        }
    }
}

/// Unconditional rectangle fill, clamped to the buffer. HUD only.
pub fn fill_rect(buf: &mut [u32], width: usize, x: i32, y: i32, w: i32, h: i32, color: u32) {
    let height = (buf.len() / width) as i32;
    let x1 = (x + w).min(width as i32);
    let y1 = (y + h).min(height);
    for yy in y.max(0)..y1 {
        for xx in x.max(0)..x1 {
            buf[yy as usize * width + xx as usize] = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: usize = 64;
    const H: usize = 48;

    fn buffer() -> Vec<u32> {
        vec![0; W * H]
    }

    fn full_bounds() -> ([Vec2; 2], [Vec2; 2]) {
        (
            [Vec2::new(0.0, 0.0), Vec2::new(W as f32, 0.0)],
            [Vec2::new(0.0, H as f32), Vec2::new(W as f32, H as f32)],
        )
    }

    fn px(buf: &[u32], x: usize, y: usize) -> u32 {
        buf[y * W + x]
    }

    #[test]
    fn trapezoid_fills_between_its_edges() {
        let mut buf = buffer();
        let (bt, bb) = full_bounds();
        let color = pack_rgb(10.0, 20.0, 30.0);
        fill_trapezoid(
            &mut buf,
            W,
            [Vec2::new(8.0, 10.0), Vec2::new(24.0, 10.0)],
            [Vec2::new(8.0, 20.0), Vec2::new(24.0, 20.0)],
            bt,
            bb,
            color,
            false,
        );
        assert_eq!(px(&buf, 12, 15), color);
        assert_eq!(px(&buf, 12, 5), 0);
        assert_eq!(px(&buf, 12, 25), 0);
        assert_eq!(px(&buf, 30, 15), 0);
    }

    #[test]
    fn clip_quad_restricts_the_fill() {
        let mut buf = buffer();
        let color = pack_rgb(200.0, 200.0, 200.0);
        fill_trapezoid(
            &mut buf,
            W,
            [Vec2::new(0.0, 0.0), Vec2::new(W as f32, 0.0)],
            [Vec2::new(0.0, H as f32), Vec2::new(W as f32, H as f32)],
            [Vec2::new(10.0, 12.0), Vec2::new(20.0, 12.0)],
            [Vec2::new(10.0, 30.0), Vec2::new(20.0, 30.0)],
            color,
            false,
        );
        assert_eq!(px(&buf, 15, 20), color);
        // Outside the clip window in x and in y.
        assert_eq!(px(&buf, 5, 20), 0);
        assert_eq!(px(&buf, 15, 8), 0);
        assert_eq!(px(&buf, 15, 35), 0);
    }

    #[test]
    fn outline_blackens_the_borders() {
        let mut buf = buffer();
        let (bt, bb) = full_bounds();
        let color = pack_rgb(50.0, 100.0, 150.0);
        fill_trapezoid(
            &mut buf,
            W,
            [Vec2::new(10.0, 10.0), Vec2::new(20.0, 10.0)],
            [Vec2::new(10.0, 20.0), Vec2::new(20.0, 20.0)],
            bt,
            bb,
            color,
            true,
        );
        // First column, first and last row of a middle column, interior.
        assert_eq!(px(&buf, 10, 15), BLACK);
        assert_eq!(px(&buf, 15, 10), BLACK);
        assert_eq!(px(&buf, 15, 19), BLACK);
        assert_eq!(px(&buf, 15, 15), color);
    }

    #[test]
    fn offscreen_geometry_is_clamped_not_fatal() {
        let mut buf = buffer();
        let (bt, bb) = full_bounds();
        fill_trapezoid(
            &mut buf,
            W,
            [Vec2::new(-30.0, -20.0), Vec2::new(100.0, -10.0)],
            [Vec2::new(-30.0, 100.0), Vec2::new(100.0, 90.0)],
            bt,
            bb,
            pack_rgb(1.0, 2.0, 3.0),
            false,
        );
        assert_eq!(px(&buf, 0, 0), pack_rgb(1.0, 2.0, 3.0));
    }

    #[test]
    fn opaque_fill_records_the_nearest_wall() {
        let mut buf = buffer();
        let (bt, bb) = full_bounds();
        let mut depths = vec![0.0f32; W];
        fill_trapezoid_depth(
            &mut buf,
            W,
            [Vec2::new(0.0, 10.0), Vec2::new(W as f32, 10.0)],
            [Vec2::new(0.0, 20.0), Vec2::new(W as f32, 20.0)],
            bt,
            bb,
            pack_rgb(9.0, 9.0, 9.0),
            false,
            5.0,
            5.0,
            DepthMode::Write,
            &mut depths,
        );
        assert!((depths[W / 2] - 0.2).abs() < 1e-4);

        // A farther wall cannot displace the recorded value.
        fill_trapezoid_depth(
            &mut buf,
            W,
            [Vec2::new(0.0, 10.0), Vec2::new(W as f32, 10.0)],
            [Vec2::new(0.0, 20.0), Vec2::new(W as f32, 20.0)],
            bt,
            bb,
            pack_rgb(9.0, 9.0, 9.0),
            false,
            50.0,
            50.0,
            DepthMode::Write,
            &mut depths,
        );
        assert!((depths[W / 2] - 0.2).abs() < 1e-4);
    }

    #[test]
    fn depth_tested_fill_skips_columns_behind_walls() {
        let mut buf = buffer();
        let (bt, bb) = full_bounds();
        let mut depths = vec![0.0f32; W];
        depths.fill(1.0 / 5.0); // wall at distance 5 everywhere

        let near = pack_rgb(0.0, 255.0, 0.0);
        fill_trapezoid_depth(
            &mut buf,
            W,
            [Vec2::new(0.0, 10.0), Vec2::new(W as f32, 10.0)],
            [Vec2::new(0.0, 20.0), Vec2::new(W as f32, 20.0)],
            bt,
            bb,
            near,
            false,
            2.0,
            2.0,
            DepthMode::Test,
            &mut depths,
        );
        assert_eq!(px(&buf, 10, 15), near);

        let far = pack_rgb(255.0, 0.0, 0.0);
        fill_trapezoid_depth(
            &mut buf,
            W,
            [Vec2::new(0.0, 25.0), Vec2::new(W as f32, 25.0)],
            [Vec2::new(0.0, 35.0), Vec2::new(W as f32, 35.0)],
            bt,
            bb,
            far,
            false,
            10.0,
            10.0,
            DepthMode::Test,
            &mut depths,
        );
        assert_eq!(px(&buf, 10, 30), 0);
    }

    #[test]
    fn circle_fills_its_disc_only() {
        let mut buf = buffer();
        let color = pack_rgb(255.0, 255.0, 0.0);
        fill_circle(&mut buf, W, 20.0, 20.0, 4.0, color);
        assert_eq!(px(&buf, 20, 20), color);
        assert_eq!(px(&buf, 20, 23), color);
        assert_eq!(px(&buf, 20, 26), 0);
        assert_eq!(px(&buf, 26, 20), 0);
    }

    #[test]
    fn depth_clipped_circle_loses_to_a_nearer_wall_and_writes_when_it_wins() {
        let mut buf = buffer();
        let mut depths = vec![0.0f32; W];
        depths.fill(1.0 / 5.0);

        let color = pack_rgb(255.0, 0.0, 255.0);
        fill_circle_depth(&mut buf, W, 20.0, 20.0, 4.0, color, 10.0, &mut depths);
        assert_eq!(px(&buf, 20, 20), 0);

        fill_circle_depth(&mut buf, W, 20.0, 20.0, 4.0, color, 2.0, &mut depths);
        assert_eq!(px(&buf, 20, 20), color);
        assert!((depths[20] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn rect_fill_is_clamped_to_the_buffer() {
        let mut buf = buffer();
        let color = pack_rgb(255.0, 255.0, 255.0);
        fill_rect(&mut buf, W, -3, -3, 8, 8, color);
        assert_eq!(px(&buf, 0, 0), color);
        assert_eq!(px(&buf, 4, 4), color);
        assert_eq!(px(&buf, 5, 5), 0);
    }
}
