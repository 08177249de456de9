//! Minimal winit wrapper (ApplicationHandler style) and the frame loop.
//!
//! The frame loop is redraw-driven: update the game, replay the draw queue
//! through the renderer's two passes, request the next redraw. Present and
//! event polling are the only points where the loop waits on anything, and
//! the exit conditions are checked once per iteration at the top.

use std::sync::Arc;
use std::time::Instant;

use crate::engine::EngineResult;
use crate::engine::game::Game;
use crate::engine::graphics::Renderer;
use crate::engine::user_input::UserInput;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

pub struct Windowing;

impl Windowing {
    pub fn run_app(
        game: Game,
        renderer: Renderer,
        user_input: UserInput,
        viewport: [u32; 2],
    ) -> EngineResult<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App {
            window: None,
            game,
            renderer,
            user_input,
            viewport,
            last_frame: None,
        };

        event_loop.run_app(&mut app)?;
        Ok(())
    }
}

struct App {
    window: Option<Arc<Window>>,
    game: Game,
    renderer: Renderer,
    user_input: UserInput,
    viewport: [u32; 2],
    last_frame: Option<Instant>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        // The viewport is a fixed configuration constant; the offscreen
        // target is sized to it, so the window must not resize either.
        let attrs: WindowAttributes = Window::default_attributes()
            .with_title("stipple")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.viewport[0],
                self.viewport[1],
            ))
            .with_resizable(false);

        let window = event_loop
            .create_window(attrs)
            .expect("failed to create window");
        let window = Arc::new(window);

        // A broken GPU context has no recovery path: abort here.
        self.renderer
            .init_for_window(&window)
            .expect("renderer init failed");

        self.window = Some(window);
        self.last_frame = Some(Instant::now());

        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::KeyboardInput { .. } => {
                self.user_input.handle_window_event(&event);
            }

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = self
                    .last_frame
                    .replace(now)
                    .map(|prev| (now - prev).as_secs_f32())
                    .unwrap_or(0.0);

                let input = self.user_input.state().clone();
                if input.key_pressed(&Key::Character("d".into())) {
                    self.renderer.toggle_debug_stream();
                }
                if input.key_pressed(&Key::Character("p".into())) {
                    if let Err(e) = self
                        .renderer
                        .capture_material_ids("stipple-material-ids.png".as_ref())
                    {
                        log::error!("material-id capture failed: {e}");
                    }
                }

                self.game.update(dt, &input);
                let to_draw = self.game.draw_queue();
                // GPU failures are fatal by design.
                self.renderer.draw_frame(&to_draw).expect("draw failed");

                self.user_input.begin_frame();

                if let Some(w) = &self.window {
                    w.pre_present_notify();
                    w.request_redraw();
                }
            }

            _ => {}
        }
    }
}
