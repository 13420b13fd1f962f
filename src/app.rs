use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};
use wgpu::SurfaceError;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, WindowEvent},
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes},
};

use self::viewport::{
    renderer::{scene::InputState, Renderer},
    Viewport,
};
use crate::wgpu_context::WgpuContext;

pub mod viewport;

#[derive(Debug)]
pub struct App {
    /// None when no usable adapter/device exists; the window then keeps a
    /// static background.
    pub ctx: Option<WgpuContext>,
    pub input: Arc<Mutex<InputState>>,

    pub window: Option<Arc<Window>>,
    pub viewport: Option<Viewport>,

    /// One-way flag: once the backdrop has failed it stays off, leaving a
    /// plain window background instead of a retry loop.
    pub backdrop_disabled: bool,
}

impl App {
    pub fn new(ctx: Option<WgpuContext>, input: Arc<Mutex<InputState>>) -> Self {
        Self {
            backdrop_disabled: ctx.is_none(),
            ctx,
            input,

            window: None,
            viewport: None,
        }
    }

    /// Tears the backdrop down without closing the window. Safe to call
    /// repeatedly; later calls find nothing to release.
    fn disable_backdrop(&mut self) {
        if let Some(mut viewport) = self.viewport.take() {
            viewport.renderer.teardown();
        }
        self.backdrop_disabled = true;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_none() {
            let window = match event_loop.create_window(
                WindowAttributes::default()
                    .with_title("ambient backdrop")
                    .with_inner_size(LogicalSize::new(1280.0, 800.0)),
            ) {
                Ok(window) => Arc::new(window),
                Err(err) => {
                    error!(?err, "failed to create window");
                    event_loop.exit();
                    return;
                }
            };

            if let Some(theme) = window.theme() {
                self.input.lock().unwrap().theme = theme.into();
            }

            self.window = Some(window);
        }

        if self.viewport.is_some() || self.backdrop_disabled {
            return;
        }

        let (Some(ctx), Some(window)) = (self.ctx.as_ref(), self.window.clone())
        else {
            return;
        };
        let input = self.input.clone();
        match Viewport::new(window.clone(), ctx, |ctx, surface, view, px| {
            Renderer::new(ctx, surface, input, view, px)
        }) {
            Ok(viewport) => {
                self.viewport = Some(viewport);
                window.request_redraw();
            }
            Err(err) => {
                // No usable render surface. The window keeps its static
                // background and the app stays up.
                error!(?err, "no usable render surface, backdrop disabled");
                self.backdrop_disabled = true;
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("WindowEvent::CloseRequested");
                self.disable_backdrop();
                self.window = None;
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                // Guarded no-op once the backdrop is torn down.
                if let (Some(ctx), Some(viewport)) =
                    (self.ctx.as_ref(), self.viewport.as_mut())
                {
                    viewport.resize(&ctx.device, new_size);
                    viewport.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                let (Some(ctx), Some(viewport)) =
                    (self.ctx.as_ref(), self.viewport.as_mut())
                else {
                    return;
                };

                let mut disable = false;
                viewport.renderer.update(ctx);
                match viewport.render(ctx) {
                    Ok(()) => {
                        viewport.guard.record_success();
                        viewport.window.request_redraw();
                    }
                    Err(SurfaceError::OutOfMemory) => {
                        error!("render surface out of memory, backdrop disabled");
                        disable = true;
                    }
                    Err(err) => {
                        warn!(?err, "frame skipped");
                        if matches!(
                            err,
                            SurfaceError::Lost | SurfaceError::Outdated
                        ) {
                            viewport.reconfigure(&ctx.device);
                        }
                        if viewport.guard.record_failure() {
                            warn!(
                                limit = viewport::MAX_FRAME_FAILURES,
                                "consecutive frame failures, backdrop disabled"
                            );
                            disable = true;
                        } else {
                            viewport.window.request_redraw();
                        }
                    }
                }

                if disable {
                    self.disable_backdrop();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(window) = self.window.as_ref() {
                    let size = window.inner_size();
                    self.input.lock().unwrap().pointer.set_target(
                        position.x,
                        position.y,
                        size.width as f64,
                        size.height as f64,
                    );
                }
            }
            WindowEvent::ThemeChanged(theme) => {
                self.input.lock().unwrap().theme = theme.into();
            }
            WindowEvent::KeyboardInput {
                event: keyboard_event,
                ..
            } if keyboard_event.state == ElementState::Released => {
                match keyboard_event.logical_key {
                    Key::Character(key) if key.as_str() == "t" => {
                        let mut input = self.input.lock().unwrap();
                        input.theme = input.theme.toggled();
                        info!(theme = ?input.theme, "theme toggled");
                    }
                    Key::Named(NamedKey::Escape) => {
                        self.disable_backdrop();
                        self.window = None;
                        event_loop.exit();
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> Arc<Mutex<InputState>> {
        Arc::new(Mutex::new(InputState::default()))
    }

    #[test]
    fn missing_context_disables_backdrop_up_front() {
        let app = App::new(None, input());

        assert!(app.backdrop_disabled);
        assert!(app.viewport.is_none());
        assert!(app.window.is_none());
    }

    #[test]
    fn disable_backdrop_is_idempotent_without_viewport() {
        let mut app = App::new(None, input());

        app.disable_backdrop();
        app.disable_backdrop();

        assert!(app.backdrop_disabled);
        assert!(app.viewport.is_none());
    }
}
