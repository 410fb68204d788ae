//! A line-list renderer.
//!
//! Draws the loaded document's segments with one pipeline and one draw call:
//! - vertex buffer: `LineVertex { position, color }`, `PrimitiveTopology::LineList`
//! - uniform buffer: `LineUniforms { projection, model }`
//! - viewport: the letterboxed region, anchored bottom-left inside the surface
//!
//! The `Renderer` calls made by the session only record state and upload buffers;
//! `draw()` replays that state inside the frame's render pass.
//!
//! Notes / current limitations:
//! - Lines are 1px wide (wgpu has no wide-line support).
//! - No MSAA.

use std::{borrow::Cow, mem};

use crate::render::Renderer;
use crate::render::gpu::Gpu;
use crate::render::primitives::{LineUniforms, LineVertex, build_line_vertices, srgb_to_linear};
use crate::scene::{Geometry, Mat4, Rgba};
use crate::view::Viewport;

fn round_up_to(v: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two());
    (v + (align - 1)) & !(align - 1)
}

/// Clamp a letterboxed viewport to the render target and convert it into wgpu's
/// top-left origin: `(x, y, width, height)`.
///
/// Returns `None` when nothing would be visible.
pub fn viewport_rect(
    viewport: &Viewport,
    target_width: u32,
    target_height: u32,
) -> Option<[f32; 4]> {
    let tw = target_width as f32;
    let th = target_height as f32;

    let w = viewport.width.min(tw);
    let h = viewport.height.min(th);
    if !(w >= 1.0 && h >= 1.0) {
        return None;
    }

    Some([0.0, (th - h).max(0.0), w, h])
}

/// Clip-space fixup for a viewport that `viewport_rect` had to shrink.
///
/// wgpu stretches clip space over whatever rect it is given. Rescaling about the
/// rect's bottom-left corner by `intended / clamped` keeps the letterboxed size, so the
/// overflow is cropped at the right and top edges instead of squeezed in.
pub fn clip_correction(viewport: &Viewport, rect: [f32; 4]) -> Mat4 {
    let [_, _, w, h] = rect;
    let sx = viewport.width / w;
    let sy = viewport.height / h;
    Mat4::translate(sx - 1.0, sy - 1.0, 0.0).mul(Mat4::scale(sx, sy, 1.0))
}

pub struct LineRenderer {
    pipeline: wgpu::RenderPipeline,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: LineUniforms,
    // Projection as set by the caller, before `clip_correction`.
    projection: Mat4,

    // Reusable vertex buffer; grown on demand.
    vertex_buffer: wgpu::Buffer,
    vertex_capacity_bytes: u64,
    uploaded_vertices: u32,

    viewport: Option<Viewport>,
    draw_count: u32,
    clear_color: wgpu::Color,
}

impl LineRenderer {
    /// Create the line pipeline targeting `gpu.surface_format.add_srgb_suffix()`.
    pub fn new(gpu: &Gpu, background: Rgba) -> anyhow::Result<Self> {
        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("LineRenderer Shader"),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                    "shaders/lines.wgsl"
                ))),
            });

        let uniform_size = mem::size_of::<LineUniforms>() as u64;

        let uniform_bind_group_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("LineRenderer Uniform BGL"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(uniform_size),
                        },
                        count: None,
                    }],
                });

        let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("LineRenderer Uniform Buffer"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("LineRenderer Uniform BG"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("LineRenderer Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                immediate_size: 0,
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("LineRenderer Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[LineVertex::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.surface_format.add_srgb_suffix(),
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::LineList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        let initial_vb = 1024u64;
        let vertex_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("LineRenderer Vertex Buffer"),
            size: initial_vb,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniforms = LineUniforms::default();
        gpu.queue
            .write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        Ok(Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            projection: Mat4::IDENTITY,
            vertex_buffer,
            vertex_capacity_bytes: initial_vb,
            uploaded_vertices: 0,
            viewport: None,
            draw_count: 0,
            clear_color: wgpu::Color {
                r: srgb_to_linear(background.r) as f64,
                g: srgb_to_linear(background.g) as f64,
                b: srgb_to_linear(background.b) as f64,
                a: background.a as f64,
            },
        })
    }

    /// Pair the renderer with the GPU context so it can serve `Renderer` calls.
    pub fn bind<'a>(&'a mut self, gpu: &'a Gpu) -> BoundLineRenderer<'a> {
        BoundLineRenderer {
            renderer: self,
            gpu,
        }
    }

    #[inline]
    pub fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    fn ensure_capacity(&mut self, gpu: &Gpu, vb_bytes: u64) {
        if vb_bytes > self.vertex_capacity_bytes {
            let new_size = vb_bytes.next_power_of_two().max(1024);
            self.vertex_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("LineRenderer Vertex Buffer (resized)"),
                size: new_size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.vertex_capacity_bytes = new_size;
        }
    }

    fn upload(&mut self, gpu: &Gpu, geometry: &Geometry) {
        let vertices = build_line_vertices(geometry);
        self.uploaded_vertices = vertices.len() as u32;
        self.draw_count = self.draw_count.min(self.uploaded_vertices);
        if vertices.is_empty() {
            return;
        }

        // `Queue::write_buffer` sizes must be a multiple of COPY_BUFFER_ALIGNMENT.
        let raw: &[u8] = bytemuck::cast_slice(&vertices);
        let vb_bytes = raw.len() as u64;
        let vb_upload = round_up_to(vb_bytes, wgpu::COPY_BUFFER_ALIGNMENT);

        self.ensure_capacity(gpu, vb_upload);

        if vb_upload == vb_bytes {
            gpu.queue.write_buffer(&self.vertex_buffer, 0, raw);
        } else {
            let mut padded = Vec::<u8>::with_capacity(vb_upload as usize);
            padded.extend_from_slice(raw);
            padded.resize(vb_upload as usize, 0);
            gpu.queue.write_buffer(&self.vertex_buffer, 0, &padded);
        }
    }

    /// Combine the caller's projection with the crop fixup for the current viewport.
    fn update_projection(&mut self, gpu: &Gpu) {
        let correction = self
            .viewport
            .and_then(|vp| {
                let rect = viewport_rect(
                    &vp,
                    vp.surface_width.round() as u32,
                    vp.surface_height.round() as u32,
                )?;
                Some(clip_correction(&vp, rect))
            })
            .unwrap_or(Mat4::IDENTITY);

        self.uniforms.projection = correction.mul(self.projection).to_cols_array_2d();
        self.write_uniforms(gpu);
    }

    fn write_uniforms(&self, gpu: &Gpu) {
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
    }

    /// Record the current line list into `pass`.
    ///
    /// The caller creates the pass (cleared to `clear_color()`) and sizes it to the
    /// full surface.
    pub fn draw<'pass>(
        &'pass self,
        pass: &mut wgpu::RenderPass<'pass>,
        target_width: u32,
        target_height: u32,
    ) {
        if self.draw_count == 0 {
            return;
        }
        let Some(viewport) = self.viewport else {
            return;
        };
        let Some([x, y, w, h]) = viewport_rect(&viewport, target_width, target_height) else {
            return;
        };

        pass.set_viewport(x, y, w, h, 0.0, 1.0);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);

        let vb_bytes = self.draw_count as u64 * mem::size_of::<LineVertex>() as u64;
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..vb_bytes));
        pass.draw(0..self.draw_count, 0..1);
    }
}

/// `LineRenderer` plus the GPU context it uploads through.
pub struct BoundLineRenderer<'a> {
    renderer: &'a mut LineRenderer,
    gpu: &'a Gpu,
}

impl Renderer for BoundLineRenderer<'_> {
    fn upload_geometry(&mut self, geometry: &Geometry) {
        self.renderer.upload(self.gpu, geometry);
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.renderer.projection = projection;
        self.renderer.update_projection(self.gpu);
    }

    fn set_model(&mut self, model: Mat4) {
        self.renderer.uniforms.model = model.to_cols_array_2d();
        self.renderer.write_uniforms(self.gpu);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.renderer.viewport = Some(viewport);
        self.renderer.update_projection(self.gpu);
    }

    fn clear(&mut self) {
        self.renderer.draw_count = 0;
    }

    fn draw_lines(&mut self, count: u32) {
        self.renderer.draw_count = count.min(self.renderer.uploaded_vertices);
    }
}
