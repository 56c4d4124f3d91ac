//! Crosshair overlay, drawn over the finished frame.

use crate::raster::{fill_rect, pack_rgb};

const SIZE: i32 = 10;
const THICKNESS: i32 = 2;
const GAP: i32 = 6;

pub fn draw_crosshair(buf: &mut [u32], width: usize, height: usize) {
    let color = pack_rgb(255.0, 255.0, 255.0);
    let cx = width as i32 / 2;
    let cy = height as i32 / 2;

    fill_rect(buf, width, cx - SIZE - GAP, cy - THICKNESS / 2, SIZE, THICKNESS, color);
    fill_rect(buf, width, cx + GAP, cy - THICKNESS / 2, SIZE, THICKNESS, color);
    fill_rect(buf, width, cx - THICKNESS / 2, cy - SIZE - GAP, THICKNESS, SIZE, color);
    fill_rect(buf, width, cx - THICKNESS / 2, cy + GAP, THICKNESS, SIZE, color);
}
