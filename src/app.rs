//! The windowing shell: a winit `ApplicationHandler` wiring keyboard input
//! into [`KeyState`], driving [`Renderer`] off a per-frame snapshot of
//! [`Session`], and requesting simulation shutdown on window close.
//!
//! Grounded on the teacher's `render::app::App`/`run` (`src/render/app.rs`)
//! — generalized from its `GameLogic`/ECS-entity dispatch to this domain's
//! concrete `Session`/`KeyState` pair, since there is no generic game-logic
//! trait here, only the one arena simulation.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::input::{Control, KeyState};
use crate::renderer::{ActorSprite, PathOverlay, Renderer};
use crate::session::Session;
use crate::simulation::SimulationHandles;

const ACTOR_RADIUS: f32 = 6.0;

fn control_for(code: KeyCode) -> Option<Control> {
    match code {
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(Control::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(Control::Right),
        KeyCode::KeyW | KeyCode::ArrowUp => Some(Control::Up),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(Control::Down),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Control::Sprint),
        _ => None,
    }
}

/// Reads the current actor world into render-ready sprites and per-zombie
/// path overlays. Takes the actor lock once per frame.
fn snapshot_for_render(session: &Session, show_paths: bool) -> (Vec<ActorSprite>, Vec<PathOverlay>) {
    session.with_actor_world(|world| {
        let mut sprites = vec![ActorSprite::from_state(&world.player.state, ACTOR_RADIUS)];
        let mut overlays = Vec::new();

        if let Some(wave) = &world.wave {
            for (_, zombie, path) in wave.slots() {
                let Some(zombie) = zombie else { continue };
                if zombie.state.is_dead() {
                    continue;
                }
                sprites.push(ActorSprite::from_state(&zombie.state, ACTOR_RADIUS));
                if show_paths {
                    if let Some(path) = path {
                        let mut points = vec![zombie.state.position];
                        points.extend(path.points().iter().copied());
                        overlays.push(PathOverlay { points, color: zombie.state.color });
                    }
                }
            }
        }

        (sprites, overlays)
    })
}

pub struct App {
    session: Arc<Session>,
    keys: Arc<KeyState>,
    simulation: Option<SimulationHandles>,
    renderer: Option<Renderer>,
    show_paths: bool,
}

impl App {
    pub fn new(session: Arc<Session>, keys: Arc<KeyState>, simulation: SimulationHandles) -> App {
        App {
            session,
            keys,
            simulation: Some(simulation),
            renderer: None,
            show_paths: false,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let window_attributes = Window::default_attributes().with_title("survival arena");
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .expect("failed to create window"),
        );
        let map = self.session.map().clone();
        let renderer = pollster::block_on(Renderer::new(window, map.width(), map.height()))
            .expect("failed to initialize renderer");
        self.renderer = Some(renderer);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(renderer) = &mut self.renderer else { return };

        match event {
            WindowEvent::CloseRequested => {
                self.session.request_shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => renderer.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let (sprites, overlays) = snapshot_for_render(&self.session, self.show_paths);
                match renderer.render(&sprites, &overlays) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = renderer.window().inner_size();
                        renderer.resize(size.width, size.height);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("out of memory, shutting down");
                        self.session.request_shutdown();
                        event_loop.exit();
                    }
                    Err(e) => log::error!("render error: {e}"),
                }
                renderer.window().request_redraw();
            }
            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state, repeat: false, .. },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                if code == KeyCode::Escape && pressed {
                    self.session.request_shutdown();
                    event_loop.exit();
                    return;
                }
                if code == KeyCode::KeyP && pressed {
                    self.show_paths = !self.show_paths;
                    return;
                }
                if let Some(control) = control_for(code) {
                    self.keys.set(control, pressed);
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.session.request_shutdown();
        if let Some(simulation) = self.simulation.take() {
            simulation.join();
        }
    }
}

/// Builds the event loop and runs `app` to completion. Initializes
/// `env_logger` exactly once, matching the teacher's `render::app::run`.
pub fn run(session: Arc<Session>, keys: Arc<KeyState>, simulation: SimulationHandles) -> anyhow::Result<()> {
    env_logger::init();
    let event_loop = EventLoop::new()?;
    let mut app = App::new(session, keys, simulation);
    event_loop.run_app(&mut app)?;
    Ok(())
}
