//! GPU-side vertex and uniform layouts for line rendering.
//!
//! Coordinate convention:
//! - Vertex positions are in document units (the SVG user space).
//! - `LineUniforms` carries the projection (document -> clip) and the model
//!   transform (pan/zoom/rotate) separately; the shader applies `projection * model`.

use std::mem;

use crate::scene::{Geometry, Mat4, Rgba};

/// A 2D line vertex with a per-vertex color.
///
/// `color` is linear RGBA; the render target is an sRGB view, so colors authored in
/// sRGB are decoded once on upload.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl LineVertex {
    pub const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    #[inline]
    pub fn new(position: [f32; 2], color: Rgba) -> Self {
        Self {
            position,
            color: [
                srgb_to_linear(color.r),
                srgb_to_linear(color.g),
                srgb_to_linear(color.b),
                color.a,
            ],
        }
    }

    #[inline]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Interleave geometry into GPU vertices.
pub fn build_line_vertices(geometry: &Geometry) -> Vec<LineVertex> {
    geometry
        .vertices()
        .iter()
        .zip(geometry.colors())
        .map(|(&p, &c)| LineVertex::new(p, c))
        .collect()
}

/// Uniform block: two column-major matrices, matching WGSL `mat4x4<f32>`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineUniforms {
    pub projection: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

impl Default for LineUniforms {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }
}

/// sRGB transfer function, decode direction.
#[inline]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
