//! Portal traversal: walks the visible sector graph through portal edges,
//! projecting and rasterizing every wall against the screen bound inherited
//! from the parent portal.
//!
//! Traversal is an explicit LIFO queue of job records rather than recursion,
//! so a cyclic portal graph can neither overflow the stack nor run away: a
//! hard cap on executed jobs bounds every frame.

use glam::Vec2;
use std::cmp::Ordering;
use std::f32::consts::FRAC_PI_2;

use crate::camera::{Frustum, Viewer, screen_x, screen_y};
use crate::entities::Entity;
use crate::map::{Map, SectorId};
use crate::math::vector_angle;
use crate::raster::{DepthMode, fill_trapezoid, fill_trapezoid_depth, pack_rgb};

/// Upper bound on portal jobs per frame. The back-portal guard below stops
/// simple cycles; this cap guarantees termination on any graph.
const MAX_PORTAL_JOBS: usize = 32;

/// One unit of traversal work: a sector to draw plus the frustum and screen
/// bound it inherited from the portal that exposed it.
struct PortalJob {
    sector: SectorId,
    previous_sector: Option<SectorId>,
    frustum: Frustum,
    bound_top: [Vec2; 2],
    bound_bottom: [Vec2; 2],
}

/// Render one frame of solid geometry, then the transient entities
/// depth-tested against it. `buf` is cleared first; the depth buffer is
/// frame-scoped and discarded on return.
pub fn render_frame(
    buf: &mut [u32],
    width: usize,
    height: usize,
    map: &Map,
    viewer: &Viewer,
    entities: &[Entity],
) {
    buf.fill(0);
    let mut depths = vec![0.0f32; width];

    let Some(start) = map.sector_containing(viewer.pos) else {
        log::debug!("viewer at {} is outside every sector", viewer.pos);
        return;
    };

    let mut queue = vec![PortalJob {
        sector: start.id,
        previous_sector: None,
        frustum: viewer.frustum(),
        bound_top: [Vec2::new(0.0, 0.0), Vec2::new(width as f32, 0.0)],
        bound_bottom: [
            Vec2::new(0.0, height as f32),
            Vec2::new(width as f32, height as f32),
        ],
    }];

    let mut executed = 0;
    while executed < MAX_PORTAL_JOBS {
        let Some(job) = queue.pop() else { break };
        render_portal(buf, width, height, map, viewer, &job, &mut queue, &mut depths);
        executed += 1;
    }

    // Solid geometry is final; entities draw nearest-first so closer discs
    // claim their columns before farther ones reach the depth test.
    let frustum = viewer.frustum();
    let mut order: Vec<usize> = (0..entities.len()).collect();
    order.sort_by(|&a, &b| {
        let da = entities[a].pos.distance(viewer.pos);
        let db = entities[b].pos.distance(viewer.pos);
        da.partial_cmp(&db).unwrap_or(Ordering::Equal)
    });
    for index in order {
        entities[index].render(buf, width, height, viewer, &frustum, &mut depths);
    }
}

#[allow(clippy::too_many_arguments)]
fn render_portal(
    buf: &mut [u32],
    width: usize,
    height: usize,
    map: &Map,
    viewer: &Viewer,
    job: &PortalJob,
    queue: &mut Vec<PortalJob>,
    depths: &mut [f32],
) {
    let sector = map.sector(job.sector);
    let frustum = &job.frustum;
    let fov = frustum.fov();
    if fov <= f32::EPSILON {
        return;
    }

    let bound_width = job.bound_bottom[1].x - job.bound_bottom[0].x;
    if bound_width <= f32::EPSILON {
        return;
    }
    // Vertical fov follows this job's slice of the screen, not the whole
    // screen, so portal columns keep their horizontal/vertical proportions.
    let screen_h = height as f32;
    let aspect = bound_width / screen_h;
    let vertical_fov = fov / aspect;
    let x_offset = job.bound_top[0].x;

    for wall_index in 0..sector.wall_count() {
        let (a, b) = sector.wall(wall_index);
        let Some((left_point, right_point)) =
            frustum.clip_segment(viewer.pos, a, b, viewer.view_distance)
        else {
            continue;
        };

        let left_x = x_offset + screen_x(viewer.pos, left_point, frustum, bound_width);
        let right_x = x_offset + screen_x(viewer.pos, right_point, frustum, bound_width);

        let left_dist = viewer.pos.distance(left_point);
        let right_dist = viewer.pos.distance(right_point);

        let left_top = screen_y(left_dist, sector.ceiling_z - viewer.eye_z, vertical_fov, screen_h);
        let left_bottom =
            screen_y(left_dist, sector.floor_z - viewer.eye_z, vertical_fov, screen_h);
        let right_top =
            screen_y(right_dist, sector.ceiling_z - viewer.eye_z, vertical_fov, screen_h);
        let right_bottom =
            screen_y(right_dist, sector.floor_z - viewer.eye_z, vertical_fov, screen_h);

        // A portal leading straight back to the sector we came from is
        // rendered as a solid wall instead of recursing; together with the
        // job cap this keeps cyclic portal graphs bounded.
        let mut solid = true;
        if let Some(next_id) = sector.neighbour_across(wall_index) {
            if Some(next_id) != job.previous_sector {
                solid = false;
                let next = map.sector(next_id);
                let next_left_top =
                    screen_y(left_dist, next.ceiling_z - viewer.eye_z, vertical_fov, screen_h);
                let next_left_bottom =
                    screen_y(left_dist, next.floor_z - viewer.eye_z, vertical_fov, screen_h);
                let next_right_top =
                    screen_y(right_dist, next.ceiling_z - viewer.eye_z, vertical_fov, screen_h);
                let next_right_bottom =
                    screen_y(right_dist, next.floor_z - viewer.eye_z, vertical_fov, screen_h);

                // The child may only draw inside the union of both sectors'
                // vertical openings at this wall.
                queue.push(PortalJob {
                    sector: next_id,
                    previous_sector: Some(sector.id),
                    frustum: frustum.narrowed(viewer.pos, left_point, right_point),
                    bound_top: [
                        Vec2::new(left_x, next_left_top.max(left_top)),
                        Vec2::new(right_x, next_right_top.max(right_top)),
                    ],
                    bound_bottom: [
                        Vec2::new(left_x, next_left_bottom.min(left_bottom)),
                        Vec2::new(right_x, next_right_bottom.min(right_bottom)),
                    ],
                });
            }
        }

        // Ceiling: screen top down to the wall top.
        let ceil_intensity = 120.0 + sector.floor_z * 10.0;
        fill_trapezoid(
            buf,
            width,
            [Vec2::new(left_x, 0.0), Vec2::new(right_x, 0.0)],
            [Vec2::new(left_x, left_top), Vec2::new(right_x, right_top)],
            job.bound_top,
            job.bound_bottom,
            pack_rgb(ceil_intensity, ceil_intensity, ceil_intensity),
            false,
        );

        // Wall face, shaded by the wall's angle so adjoining walls separate
        // visually. Only solid faces feed the depth buffer; portal rims and
        // flats must not occlude entities seen through the opening.
        let shade = 255.0 * (0.5 - vector_angle(a, b) / FRAC_PI_2);
        let wall_color = pack_rgb(shade, shade, 255.0);
        let wall_top = [Vec2::new(left_x, left_top), Vec2::new(right_x, right_top)];
        let wall_bottom = [
            Vec2::new(left_x, left_bottom),
            Vec2::new(right_x, right_bottom),
        ];
        if solid {
            fill_trapezoid_depth(
                buf,
                width,
                wall_top,
                wall_bottom,
                job.bound_top,
                job.bound_bottom,
                wall_color,
                true,
                left_dist,
                right_dist,
                DepthMode::Write,
                depths,
            );
        } else {
            fill_trapezoid(
                buf,
                width,
                wall_top,
                wall_bottom,
                job.bound_top,
                job.bound_bottom,
                wall_color,
                true,
            );
        }

        // Floor: wall bottom down to the screen bottom.
        let floor_intensity = 200.0 + sector.floor_z * 10.0;
        fill_trapezoid(
            buf,
            width,
            [
                Vec2::new(left_x, left_bottom),
                Vec2::new(right_x, right_bottom),
            ],
            [Vec2::new(left_x, screen_h), Vec2::new(right_x, screen_h)],
            job.bound_top,
            job.bound_bottom,
            pack_rgb(floor_intensity, floor_intensity, floor_intensity),
            false,
        );
    }
}
