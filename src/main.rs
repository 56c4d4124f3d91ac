use std::collections::HashSet;
use std::error::Error;
use std::num::NonZeroU32;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

use glam::Vec2;
use log::{debug, info};
use simplelog::TermLogger;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::camera::Viewer;
use crate::cli::Options;
use crate::entities::Entity;
use crate::map::Map;
use crate::raster::pack_rgb;
use crate::scaler::{ScaleLut, blit_scaled};

mod camera;
mod cli;
mod entities;
mod hud;
mod map;
mod math;
mod raster;
mod renderer;
mod scaler;

const EYE_HEIGHT: f32 = 2.0;
const VIEW_DISTANCE: f32 = 10_000.0;

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    map: Map,
    viewer: Viewer,
    entities: Vec<Entity>,

    frame_counter: u32,
    last_fps_log: Instant,

    // Internal fixed-height framebuffer, stretched to the window on present
    fb: Vec<u32>,
    fb_w: usize,
    fb_h: usize,
    scale_lut: ScaleLut,

    initial_size: LogicalSize<f64>,

    keys_down: HashSet<KeyCode>,
    last_tick: Instant,
    move_speed: f32,
    turn_speed: f32,
}

impl App {
    fn new(options: &Options, map: Map) -> Self {
        let viewer = Viewer {
            pos: Vec2::ZERO,
            yaw: (-90.0f32).to_radians(),
            eye_z: EYE_HEIGHT,
            fov: options.fov.to_radians(),
            view_distance: VIEW_DISTANCE,
        };

        let entities = vec![Entity {
            pos: Vec2::new(10.0, 10.0),
            z: EYE_HEIGHT,
            radius: 0.6,
            color: pack_rgb(255.0, 0.0, 0.0),
        }];

        Self {
            window: None,
            surface: None,
            map,
            viewer,
            entities,

            frame_counter: 0,
            last_fps_log: Instant::now(),

            fb: vec![0; 640 * 480],
            fb_w: 640,
            fb_h: 480,
            scale_lut: ScaleLut::empty(),

            initial_size: LogicalSize::new(options.width as f64, options.height as f64),

            keys_down: HashSet::new(),
            last_tick: Instant::now(),
            move_speed: 10.0,                 // units/s
            turn_speed: std::f32::consts::PI, // rad/s
        }
    }

    fn tick(&mut self) {
        // Cap dt so a paused app does not teleport the viewer
        let now = Instant::now();
        let mut dt = now.duration_since(self.last_tick);
        self.last_tick = now;
        if dt > Duration::from_millis(100) {
            dt = Duration::from_millis(100);
        }
        let dt_s = dt.as_secs_f32();

        let mut fwd = 0.0f32;
        let mut strafe = 0.0f32;
        if self.keys_down.contains(&KeyCode::KeyW) {
            fwd += 1.0;
        }
        if self.keys_down.contains(&KeyCode::KeyS) {
            fwd -= 1.0;
        }
        if self.keys_down.contains(&KeyCode::KeyD) {
            strafe += 1.0;
        }
        if self.keys_down.contains(&KeyCode::KeyA) {
            strafe -= 1.0;
        }

        let mut yaw_delta = 0.0f32;
        if self.keys_down.contains(&KeyCode::KeyQ) {
            yaw_delta -= 1.0;
        }
        if self.keys_down.contains(&KeyCode::KeyE) {
            yaw_delta += 1.0;
        }

        self.viewer.yaw += yaw_delta * self.turn_speed * dt_s;
        // Keep yaw in [-pi, pi] to avoid float drift
        if self.viewer.yaw > std::f32::consts::PI {
            self.viewer.yaw -= 2.0 * std::f32::consts::PI;
        }
        if self.viewer.yaw < -std::f32::consts::PI {
            self.viewer.yaw += 2.0 * std::f32::consts::PI;
        }

        if fwd != 0.0 || strafe != 0.0 {
            // Normalize diagonal speed
            let len = (fwd * fwd + strafe * strafe).sqrt();
            let fwd = fwd / len;
            let strafe = strafe / len;

            let dir = self.viewer.direction();
            let right = Vec2::new(-dir.y, dir.x);
            let step = (dir * fwd + right * strafe) * self.move_speed * dt_s;

            // Crude containment check in place of real collision: the move
            // only lands when it stays inside the sector graph.
            let next = self.viewer.pos + step;
            if self.map.sector_containing(next).is_some() {
                self.viewer.pos = next;
            }
        }

        // Eye height follows the floor of whatever sector we stand in
        if let Some(sector) = self.map.sector_containing(self.viewer.pos) {
            self.viewer.eye_z = sector.floor_z + EYE_HEIGHT;
        }
    }

    fn rebuild_internal_fb_and_lut(&mut self, dst_w: usize, dst_h: usize) {
        // Keep internal height fixed (controls pixel size look)
        let target_h = 480usize;
        let aspect = if dst_h > 0 {
            dst_w as f32 / dst_h as f32
        } else {
            1.0
        };

        // Derive width from aspect, kept even
        let mut target_w = (target_h as f32 * aspect).round() as usize;
        if target_w < 160 {
            target_w = 160;
        }
        if target_w % 2 != 0 {
            target_w += 1;
        }

        if target_w != self.fb_w || target_h != self.fb_h {
            self.fb_w = target_w;
            self.fb_h = target_h;
            self.fb = vec![0u32; self.fb_w * self.fb_h];
        }

        self.scale_lut = ScaleLut::build(dst_w, dst_h, self.fb_w, self.fb_h);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let attributes = Window::default_attributes()
            .with_title("Portal Engine")
            .with_inner_size(self.initial_size);

        let window = Rc::new(event_loop.create_window(attributes).expect("create window"));

        let context = softbuffer::Context::new(window.clone()).expect("softbuffer context");
        let surface =
            softbuffer::Surface::new(&context, window.clone()).expect("softbuffer surface");

        let size = window.inner_size();
        self.rebuild_internal_fb_and_lut(size.width as usize, size.height as usize);

        self.surface = Some(surface);
        self.window = Some(window);

        self.last_tick = Instant::now();
        self.window.as_ref().unwrap().request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("close requested, stopping");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        state,
                        ..
                    },
                ..
            } => {
                if let PhysicalKey::Code(code) = physical_key {
                    use winit::event::ElementState;
                    match state {
                        ElementState::Pressed => {
                            self.keys_down.insert(code);
                        }
                        ElementState::Released => {
                            self.keys_down.remove(&code);
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                self.tick();

                let (window, surface) = match (&self.window, &mut self.surface) {
                    (Some(w), Some(s)) if w.id() == id => (w, s),
                    _ => return,
                };

                let size = window.inner_size();
                let (dw, dh) = (size.width as usize, size.height as usize);
                if dw == 0 || dh == 0 {
                    return; // Minimized window, skip drawing
                }

                surface
                    .resize(
                        NonZeroU32::new(dw as u32).unwrap(),
                        NonZeroU32::new(dh as u32).unwrap(),
                    )
                    .unwrap();

                renderer::render_frame(
                    &mut self.fb,
                    self.fb_w,
                    self.fb_h,
                    &self.map,
                    &self.viewer,
                    &self.entities,
                );
                hud::draw_crosshair(&mut self.fb, self.fb_w, self.fb_h);

                let mut buf = surface.buffer_mut().expect("buffer_mut");
                blit_scaled(&mut buf, dw, &self.fb, self.fb_w, &self.scale_lut);
                buf.present().unwrap();

                self.frame_counter += 1;
                let now = Instant::now();
                if now.duration_since(self.last_fps_log).as_secs_f32() >= 1.0 {
                    let fps = self.frame_counter as f32
                        / now.duration_since(self.last_fps_log).as_secs_f32();
                    debug!("FPS: {fps:.1}");
                    self.frame_counter = 0;
                    self.last_fps_log = now;
                }

                self.window.as_ref().unwrap().request_redraw();
            }

            WindowEvent::Resized(new_size) => {
                let (dw, dh) = (new_size.width as usize, new_size.height as usize);
                self.rebuild_internal_fb_and_lut(dw, dh);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let options: Options = argh::from_env();

    TermLogger::init(
        options.verbose.unwrap_or(log::LevelFilter::Info),
        simplelog::ConfigBuilder::default().build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    // An inconsistent map must never reach the renderer, so loading and
    // validation happen before any window exists.
    let map = match &options.map {
        Some(path) => Map::load(Path::new(path))?,
        None => Map::default_map(),
    };
    info!("map loaded: {} sectors", map.sectors().len());

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(&options, map);
    event_loop.run_app(&mut app)?;
    Ok(())
}
