use cgmath::{perspective, Deg, Matrix4, Point3, Rad, Vector2, Vector3};

use super::palette::Theme;

pub const CAMERA_FOV_DEG: f32 = 75.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const CAMERA_Z: f32 = 350.0;

/// First-order low-pass factor applied to the pointer each tick.
pub const POINTER_SMOOTHING: f32 = 0.1;

/// Cap on the render-surface pixel scale (device pixel ratio clamp).
pub const MAX_PIXEL_SCALE: f64 = 2.0;

/// Signals written by the host's event callbacks and consumed on the next
/// frame tick. Last writer wins between ticks.
#[derive(Debug)]
pub struct InputState {
    pub pointer: PointerState,
    pub theme: Theme,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            pointer: PointerState::new(),
            theme: Theme::Dark,
        }
    }
}

/// Raw pointer target plus the smoothed position actually driving rotation,
/// both in [-1, 1] with y pointing up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub target: Vector2<f32>,
    pub smoothed: Vector2<f32>,
}

impl Default for PointerState {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerState {
    pub fn new() -> Self {
        Self {
            target: Vector2::new(0.0, 0.0),
            smoothed: Vector2::new(0.0, 0.0),
        }
    }

    /// Normalizes a pointer position in surface pixels into [-1, 1] on both
    /// axes, inverting y so "up" is positive.
    pub fn set_target(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let width = width.max(1.0);
        let height = height.max(1.0);
        self.target.x = (x / width) as f32 * 2.0 - 1.0;
        self.target.y = -((y / height) as f32 * 2.0 - 1.0);
    }

    /// One smoothing step toward the current target.
    pub fn tick(&mut self) {
        self.smoothed += (self.target - self.smoothed) * POINTER_SMOOTHING;
    }
}

/// Camera parameters. Mutated on resize only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub width: f32,
    pub height: f32,
}

impl ViewState {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Returns false when the dimensions are unchanged (resize no-op).
    pub fn set_viewport(&mut self, width: f32, height: f32) -> bool {
        let next = Self::new(width, height);
        if next == *self {
            return false;
        }
        *self = next;
        true
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Responsive point size: min viewport dimension / 500, floored at 2 so
    /// particles stay visible on small screens.
    pub fn point_size(&self) -> f32 {
        (self.width.min(self.height) / 500.0).max(2.0)
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        let proj =
            perspective(Deg(CAMERA_FOV_DEG), self.aspect(), CAMERA_NEAR, CAMERA_FAR);
        let view = Matrix4::look_at_rh(
            Point3::new(0.0, 0.0, CAMERA_Z),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_y(),
        );
        // cgmath emits OpenGL clip space; remap z from [-1, 1] to wgpu's [0, 1].
        #[rustfmt::skip]
        let correction = Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.5, 0.0,
            0.0, 0.0, 0.5, 1.0,
        );
        correction * proj * view
    }
}

/// Rotation of one particle layer for a given frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerMotion {
    pub yaw: f32,
    pub pitch: f32,
}

impl LayerMotion {
    /// Main cloud: slow time-driven yaw plus the smoothed pointer offset.
    pub fn cloud(elapsed: f32, pointer: Vector2<f32>) -> Self {
        Self {
            yaw: elapsed * 0.05 + pointer.x * 0.5,
            pitch: pointer.y * 0.5,
        }
    }

    /// Distant dust layer: counter-rotates at a lower rate for parallax.
    pub fn dust(elapsed: f32) -> Self {
        Self {
            yaw: -elapsed * 0.02,
            pitch: -elapsed * 0.01,
        }
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_angle_x(Rad(self.pitch)) * Matrix4::from_angle_y(Rad(self.yaw))
    }
}

/// Render-surface pixel dimensions for a physical window size, with the
/// effective pixel scale capped at [`MAX_PIXEL_SCALE`].
pub fn surface_px(physical: (u32, u32), scale_factor: f64) -> (u32, u32) {
    let scale_factor = scale_factor.max(0.1);
    let factor = scale_factor.min(MAX_PIXEL_SCALE) / scale_factor;
    (
        ((physical.0 as f64 * factor).round() as u32).max(1),
        ((physical.1 as f64 * factor).round() as u32).max(1),
    )
}

/// One-way latch guarding release of GPU resources. Fires exactly once.
#[derive(Debug, Default)]
pub struct ReleaseLatch {
    fired: bool,
}

impl ReleaseLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time, false on every later call.
    pub fn fire(&mut self) -> bool {
        !std::mem::replace(&mut self.fired, true)
    }

    pub fn is_fired(&self) -> bool {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pointer_rests_at_center() {
        assert_eq!(PointerState::default(), PointerState::new());
        assert_eq!(PointerState::default().target, Vector2::new(0.0, 0.0));
    }

    #[test]
    fn pointer_normalization_maps_corners() {
        let mut pointer = PointerState::new();

        pointer.set_target(0.0, 0.0, 1920.0, 1080.0);
        assert_eq!(pointer.target, Vector2::new(-1.0, 1.0));

        pointer.set_target(1920.0, 1080.0, 1920.0, 1080.0);
        assert_eq!(pointer.target, Vector2::new(1.0, -1.0));

        pointer.set_target(960.0, 540.0, 1920.0, 1080.0);
        assert_eq!(pointer.target, Vector2::new(0.0, 0.0));
    }

    #[test]
    fn last_pointer_target_wins_between_ticks() {
        let mut pointer = PointerState::new();
        pointer.set_target(100.0, 100.0, 1000.0, 1000.0);
        pointer.set_target(900.0, 900.0, 1000.0, 1000.0);
        pointer.set_target(500.0, 0.0, 1000.0, 1000.0);
        pointer.tick();

        // Only the last target (0.0, 1.0) contributes to the step.
        assert_eq!(pointer.smoothed, Vector2::new(0.0, POINTER_SMOOTHING));
    }

    #[test]
    fn smoothing_converges_monotonically() {
        let mut pointer = PointerState::new();
        pointer.set_target(1000.0, 0.0, 1000.0, 1000.0);
        let target = pointer.target;

        let mut prev_dist = (target - pointer.smoothed).x.abs();
        for _ in 0..44 {
            pointer.tick();
            let dist = (target - pointer.smoothed).x.abs();
            assert!(dist < prev_dist);
            prev_dist = dist;
        }
        // 0.9^44 ~ 0.0097, within 1% of the target.
        assert!(prev_dist < 0.01 * target.x.abs());
    }

    #[test]
    fn resize_updates_aspect_and_detects_noop() {
        let mut view = ViewState::new(1920.0, 1080.0);
        assert!((view.aspect() - 1920.0 / 1080.0).abs() < 1e-6);

        assert!(!view.set_viewport(1920.0, 1080.0));
        assert!(view.set_viewport(800.0, 600.0));
        assert!((view.aspect() - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn point_size_floors_and_scales() {
        assert_eq!(ViewState::new(400.0, 800.0).point_size(), 2.0);
        assert_eq!(ViewState::new(2000.0, 2000.0).point_size(), 4.0);
        assert_eq!(ViewState::new(1920.0, 1080.0).point_size(), 1080.0 / 500.0);
    }

    #[test]
    fn cloud_motion_combines_time_and_pointer() {
        let motion = LayerMotion::cloud(10.0, Vector2::new(0.4, -0.2));
        assert!((motion.yaw - (10.0 * 0.05 + 0.4 * 0.5)).abs() < 1e-6);
        assert!((motion.pitch - (-0.2 * 0.5)).abs() < 1e-6);
    }

    #[test]
    fn dust_motion_counter_rotates() {
        let motion = LayerMotion::dust(10.0);
        assert!((motion.yaw - (-0.2)).abs() < 1e-6);
        assert!((motion.pitch - (-0.1)).abs() < 1e-6);
    }

    #[test]
    fn surface_px_caps_pixel_scale_at_two() {
        // Scale factor below the cap passes through.
        assert_eq!(surface_px((1920, 1080), 1.0), (1920, 1080));
        assert_eq!(surface_px((3840, 2160), 2.0), (3840, 2160));
        // 3x display: logical 1280x720 renders at 2x, not 3x.
        assert_eq!(surface_px((3840, 2160), 3.0), (2560, 1440));
    }

    #[test]
    fn release_latch_fires_once() {
        let mut latch = ReleaseLatch::new();
        assert!(latch.fire());
        assert!(!latch.fire());
        assert!(latch.is_fired());
    }
}
