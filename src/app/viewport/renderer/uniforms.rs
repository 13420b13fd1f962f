use bytemuck::NoUninit;
use cgmath::{Matrix4, Vector2};

use super::{
    palette::Palette,
    scene::{LayerMotion, ViewState, CAMERA_Z},
};

/// Per-frame uniform block shared by both layers. Layout must match the
/// `Uniforms` struct in shader.wgsl (std140-compatible, 16-byte rows).
#[derive(Debug, Clone, Copy, PartialEq, NoUninit)]
#[repr(C)]
pub struct FrameUniforms {
    pub cloud_model: [[f32; 4]; 4],
    pub dust_model: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub color_a: [f32; 3],
    pub time: f32,
    pub color_b: [f32; 3],
    pub size: f32,
    pub dust_color: [f32; 3],
    pub dust_opacity: f32,
    pub viewport: [f32; 2],
    pub camera_z: f32,
    pub dust_size: f32,
}

impl FrameUniforms {
    pub fn compute(
        elapsed: f32,
        pointer: Vector2<f32>,
        view: &ViewState,
        palette: &Palette,
        surface_px: (u32, u32),
    ) -> Self {
        let cloud: Matrix4<f32> = LayerMotion::cloud(elapsed, pointer).model_matrix();
        let dust: Matrix4<f32> = LayerMotion::dust(elapsed).model_matrix();

        Self {
            cloud_model: cloud.into(),
            dust_model: dust.into(),
            view_proj: view.view_proj().into(),
            color_a: palette.primary,
            time: elapsed,
            color_b: palette.secondary,
            size: view.point_size(),
            dust_color: palette.dust_color,
            dust_opacity: palette.dust_opacity,
            viewport: [surface_px.0 as f32, surface_px.1 as f32],
            camera_z: CAMERA_Z,
            dust_size: 1.0,
        }
    }
}
