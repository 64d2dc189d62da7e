use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::controller::MapController;
use crate::projection::{MapCamera, WorldPoint, DEFAULT_ZOOM};
use crate::storage::{FileKeyValueStore, KeyValueStore};
use crate::{resolve_app_paths, AppPaths, StartupError};

use super::frontend::Frontend;
use super::input::InputCollector;
use super::rendering::Renderer;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_render_fps: Option<u32>,
    pub start_zoom: i32,
    /// Overrides `<root>/assets/tiles`.
    pub tiles_dir: Option<PathBuf>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Map Markers".to_string(),
            window_width: 1280,
            window_height: 720,
            max_render_fps: Some(60),
            start_zoom: DEFAULT_ZOOM,
            tiles_dir: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig) -> Result<(), AppError> {
    let app_paths = resolve_app_paths()?;
    run_app_with_paths(config, app_paths)
}

pub fn run_app_with_paths(config: LoopConfig, app_paths: AppPaths) -> Result<(), AppError> {
    let storage_file = app_paths.storage_file();
    let tiles_dir = config
        .tiles_dir
        .clone()
        .unwrap_or_else(|| app_paths.tiles_dir.clone());
    info!(
        root = %app_paths.root.display(),
        data_dir = %app_paths.data_dir.display(),
        storage_file = %storage_file.display(),
        tiles_dir = %tiles_dir.display(),
        "startup"
    );

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let window_for_loop = Arc::clone(&window);
    let mut renderer = Renderer::new(window, tiles_dir).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let viewport = renderer.viewport();
    let mut input_collector = InputCollector::default();
    let storage = FileKeyValueStore::open(storage_file);
    let camera = MapCamera::new(WorldPoint::default(), config.start_zoom);
    let controller = MapController::new(storage, camera, Instant::now());
    let mut frontend = Frontend::new(controller, viewport);

    info!(
        start_zoom = frontend.controller().layer().camera().zoom(),
        render_fps_cap = %format_render_cap(effective_render_cap),
        window_width = viewport.width,
        window_height = viewport.height,
        "loop_config"
    );

    let mut last_present_instant = Instant::now();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(error) = resize(&mut renderer, &mut frontend, new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        if let Err(error) = resize(&mut renderer, &mut frontend, size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        input_collector.set_cursor_position_px(position.x as f32, position.y as f32);
                    }
                    WindowEvent::CursorLeft { .. } => {
                        input_collector.clear_cursor_position();
                        frontend.clear_cursor();
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        input_collector.handle_mouse_input(button, state);
                    }
                    WindowEvent::Touch(touch) => {
                        input_collector.handle_touch(touch);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        input_collector.handle_mouse_wheel(delta);
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_keyboard_input(&event);
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        for input in input_collector.drain_events() {
                            frontend.handle(input, now);
                        }
                        frontend.tick(now);

                        // Single sleep point for render pacing.
                        let elapsed_since_last_present =
                            Instant::now().saturating_duration_since(last_present_instant);
                        let cap_sleep =
                            compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                        if cap_sleep > Duration::ZERO {
                            thread::sleep(cap_sleep);
                        }

                        if let Err(error) = renderer.render_frame(&frontend, now) {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        last_present_instant = Instant::now();
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                info!(
                    marker_count = frontend.controller().markers().len(),
                    "shutdown"
                );
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn resize<S: KeyValueStore>(
    renderer: &mut Renderer,
    frontend: &mut Frontend<S>,
    width: u32,
    height: u32,
) -> Result<(), PixelsError> {
    renderer.resize(width, height)?;
    frontend.set_viewport(renderer.viewport());
    Ok(())
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}
