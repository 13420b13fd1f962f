use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::debug;
use wgpu::{
    Device, Surface, SurfaceConfiguration, SurfaceError, TextureViewDescriptor,
};
use winit::{dpi::PhysicalSize, window::Window};

use self::renderer::{scene, Renderer};
use crate::wgpu_context::WgpuContext;

pub mod renderer;

/// Consecutive frame failures tolerated before the backdrop gives up and
/// falls back to a static background.
pub const MAX_FRAME_FAILURES: u32 = 3;

#[derive(Debug)]
pub struct Viewport {
    pub window: Arc<Window>,
    pub surface: Surface<'static>,
    pub config: SurfaceConfiguration,
    pub renderer: Renderer,
    pub guard: FrameGuard,
}

impl Viewport {
    pub fn new(
        window: Arc<Window>,
        ctx: &WgpuContext,
        build_renderer: impl FnOnce(&WgpuContext, &Surface, scene::ViewState, (u32, u32)) -> Renderer,
    ) -> anyhow::Result<Self> {
        let surface = ctx
            .instance
            .create_surface(window.clone())
            .context("failed to create render surface")?;

        let physical = window.inner_size();
        let scale_factor = window.scale_factor();
        let surface_size =
            scene::surface_px((physical.width, physical.height), scale_factor);

        let config = surface
            .get_default_config(&ctx.adapter, surface_size.0, surface_size.1)
            .ok_or(anyhow!("failed to get default surface config"))?;

        surface.configure(&ctx.device, &config);

        let logical = physical.to_logical::<f32>(scale_factor);
        let view = scene::ViewState::new(logical.width, logical.height);
        let renderer = build_renderer(ctx, &surface, view, surface_size);

        Ok(Self {
            window,
            surface,
            config,
            renderer,
            guard: FrameGuard::new(MAX_FRAME_FAILURES),
        })
    }

    /// Reconfigures the surface for a new physical size and updates the
    /// camera. No-op when the resulting pixel dimensions are unchanged.
    pub fn resize(&mut self, device: &Device, size: PhysicalSize<u32>) {
        let scale_factor = self.window.scale_factor();
        let surface_size = scene::surface_px((size.width, size.height), scale_factor);

        if (self.config.width, self.config.height) == surface_size {
            return;
        }

        self.config.width = surface_size.0;
        self.config.height = surface_size.1;
        self.surface.configure(device, &self.config);

        let logical = size.to_logical::<f32>(scale_factor);
        self.renderer
            .resize((logical.width, logical.height), surface_size);

        debug!(
            width = surface_size.0,
            height = surface_size.1,
            "surface reconfigured"
        );
    }

    /// Re-applies the current configuration; used to recover a lost surface.
    pub fn reconfigure(&self, device: &Device) {
        self.surface.configure(device, &self.config);
    }

    pub fn render(&mut self, ctx: &WgpuContext) -> Result<(), SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        self.renderer.render(ctx, &view);
        frame.present();

        Ok(())
    }
}

/// Bounded retry policy for transient frame failures. A skipped frame is
/// tolerable; an unbounded retry loop against a dead surface is not.
#[derive(Debug)]
pub struct FrameGuard {
    consecutive_failures: u32,
    limit: u32,
}

impl FrameGuard {
    pub fn new(limit: u32) -> Self {
        Self {
            consecutive_failures: 0,
            limit,
        }
    }

    /// Records a failed frame; returns true once the failure budget is
    /// exhausted and the caller should tear down.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures += 1;
        self.consecutive_failures >= self.limit
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_after_limit_consecutive_failures() {
        let mut guard = FrameGuard::new(3);
        assert!(!guard.record_failure());
        assert!(!guard.record_failure());
        assert!(guard.record_failure());
    }

    #[test]
    fn success_resets_the_failure_streak() {
        let mut guard = FrameGuard::new(3);
        assert!(!guard.record_failure());
        assert!(!guard.record_failure());
        guard.record_success();
        assert!(!guard.record_failure());
        assert!(!guard.record_failure());
        assert!(guard.record_failure());
    }
}
