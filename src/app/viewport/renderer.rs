use std::{
    mem::size_of,
    sync::{Arc, Mutex},
    time::Instant,
};

use bytemuck::cast_slice;
use tracing::info;
use wgpu::{
    include_wgsl,
    util::{BufferInitDescriptor, DeviceExt},
    vertex_attr_array, BindGroup, BindGroupDescriptor, BindGroupEntry,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, BlendComponent,
    BlendFactor, BlendOperation, BlendState, Buffer, BufferAddress,
    BufferBindingType, BufferUsages, Color, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, LoadOp, Operations, PipelineLayoutDescriptor,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, ShaderStages,
    StoreOp, Surface, TextureFormat, TextureView, VertexBufferLayout,
    VertexStepMode,
};

use self::{
    field::{CloudPoint, DustPoint},
    palette::{Palette, Theme},
    scene::{InputState, ReleaseLatch, ViewState},
    uniforms::FrameUniforms,
};
use crate::wgpu_context::WgpuContext;

pub mod field;
pub mod palette;
pub mod scene;
pub mod uniforms;

/// Retained two-layer particle scene. Geometry is generated once and lives
/// on the GPU for the renderer's whole lifetime; per-frame work is limited
/// to one uniform write and two instanced draws.
#[derive(Debug)]
pub struct Renderer {
    started: Instant,
    input: Arc<Mutex<InputState>>,

    view: ViewState,
    surface_size: (u32, u32),
    theme: Theme,
    palette: Palette,

    cloud_count: u32,
    dust_count: u32,
    cloud_buffer: Buffer,
    dust_buffer: Buffer,
    uniform_buffer: Buffer,

    bind_group: BindGroup,
    cloud_pipeline: RenderPipeline,
    dust_pipeline: RenderPipeline,

    released: ReleaseLatch,
}

impl Renderer {
    pub fn new(
        ctx: &WgpuContext,
        surface: &Surface,
        input: Arc<Mutex<InputState>>,
        view: ViewState,
        surface_size: (u32, u32),
    ) -> Self {
        let WgpuContext {
            adapter, device, ..
        } = &ctx;

        let theme = input.lock().unwrap().theme;
        let palette = Palette::of(theme);

        // geometry, generated once
        let mut rng = rand::thread_rng();
        let cloud = CloudPoint::gen(&mut rng);
        let dust = DustPoint::gen(&mut rng);

        let cloud_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("cloud_points_buffer"),
            contents: cast_slice(&cloud),
            usage: BufferUsages::VERTEX,
        });

        let dust_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("dust_points_buffer"),
            contents: cast_slice(&dust),
            usage: BufferUsages::VERTEX,
        });

        let uniforms = FrameUniforms::compute(
            0.0,
            cgmath::Vector2::new(0.0, 0.0),
            &view,
            &palette,
            surface_size,
        );
        let uniform_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("frame_uniform_buffer"),
            contents: cast_slice(&[uniforms]),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                label: Some("frame_bind_group_layout"),
                entries: &[BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::VERTEX_FRAGMENT,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &bind_group_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        // pipeline
        let shader = device.create_shader_module(include_wgsl!("../../../shader.wgsl"));

        let swapchain_capabilities = surface.get_capabilities(adapter);
        let swapchain_format = swapchain_capabilities.formats[0];

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("backdrop layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let cloud_vertex_layout = VertexBufferLayout {
            array_stride: size_of::<CloudPoint>() as BufferAddress,
            step_mode: VertexStepMode::Instance,
            attributes: &vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32],
        };

        // glow layer composites additively over the dust layer
        let additive = BlendState {
            color: BlendComponent {
                src_factor: BlendFactor::SrcAlpha,
                dst_factor: BlendFactor::One,
                operation: BlendOperation::Add,
            },
            alpha: BlendComponent {
                src_factor: BlendFactor::One,
                dst_factor: BlendFactor::One,
                operation: BlendOperation::Add,
            },
        };

        let cloud_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "vs_cloud",
            "fs_cloud",
            cloud_vertex_layout,
            swapchain_format,
            additive,
            "cloud pipeline",
        );

        let dust_vertex_layout = VertexBufferLayout {
            array_stride: size_of::<DustPoint>() as BufferAddress,
            step_mode: VertexStepMode::Instance,
            attributes: &vertex_attr_array![0 => Float32x3],
        };

        let dust_pipeline = Self::create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "vs_dust",
            "fs_dust",
            dust_vertex_layout,
            swapchain_format,
            BlendState::ALPHA_BLENDING,
            "dust pipeline",
        );

        info!(
            cloud = cloud.len(),
            dust = dust.len(),
            ?theme,
            "backdrop renderer initialized"
        );

        Self {
            started: Instant::now(),
            input,

            view,
            surface_size,
            theme,
            palette,

            cloud_count: cloud.len() as u32,
            dust_count: dust.len() as u32,
            cloud_buffer,
            dust_buffer,
            uniform_buffer,

            bind_group,
            cloud_pipeline,
            dust_pipeline,

            released: ReleaseLatch::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        vs_entry: &str,
        fs_entry: &str,
        vertex_layout: VertexBufferLayout,
        format: TextureFormat,
        blend: BlendState,
        label: &str,
    ) -> RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: vs_entry,
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: fs_entry,
                compilation_options: Default::default(),
                targets: &[Some(ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: ColorWrites::COLOR,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    }

    /// Frame tick: advance elapsed time, smooth the pointer toward its
    /// latest target, refresh the palette if the theme flag changed, and
    /// rewrite the uniform block in place.
    pub fn update(&mut self, ctx: &WgpuContext) {
        if self.released.is_fired() {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f32();

        let (pointer, theme) = {
            let mut input = self.input.lock().unwrap();
            input.pointer.tick();
            (input.pointer.smoothed, input.theme)
        };

        if theme != self.theme {
            info!(?theme, "theme changed, updating palette");
            self.theme = theme;
            self.palette = Palette::of(theme);
        }

        let uniforms = FrameUniforms::compute(
            elapsed,
            pointer,
            &self.view,
            &self.palette,
            self.surface_size,
        );
        ctx.queue
            .write_buffer(&self.uniform_buffer, 0, cast_slice(&[uniforms]));
    }

    /// Camera/viewport follow-up to a surface resize. Touches plain state
    /// only; the new values reach the GPU with the next uniform write.
    pub fn resize(&mut self, logical: (f32, f32), surface_size: (u32, u32)) {
        self.view.set_viewport(logical.0, logical.1);
        self.surface_size = surface_size;
    }

    pub fn render(&self, ctx: &WgpuContext, view: &TextureView) {
        if self.released.is_fired() {
            return;
        }

        let [r, g, b] = self.palette.clear_color;

        let mut encoder = ctx
            .device
            .create_command_encoder(&CommandEncoderDescriptor { label: None });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color { r, g, b, a: 1.0 }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rpass.set_bind_group(0, &self.bind_group, &[]);

            rpass.set_pipeline(&self.cloud_pipeline);
            rpass.set_vertex_buffer(0, self.cloud_buffer.slice(..));
            rpass.draw(0..6, 0..self.cloud_count);

            rpass.set_pipeline(&self.dust_pipeline);
            rpass.set_vertex_buffer(0, self.dust_buffer.slice(..));
            rpass.draw(0..6, 0..self.dust_count);
        }

        ctx.queue.submit(Some(encoder.finish()));
    }

    /// Releases GPU buffers. One-way: the first call destroys, later calls
    /// are no-ops, and a released renderer skips all further frame work.
    pub fn teardown(&mut self) {
        if self.released.fire() {
            self.cloud_buffer.destroy();
            self.dust_buffer.destroy();
            self.uniform_buffer.destroy();
            info!("backdrop renderer resources released");
        }
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.teardown();
    }
}
