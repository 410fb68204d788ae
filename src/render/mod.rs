//! Rendering module root.
//!
//! The viewer core never touches the GPU directly; it talks to a `Renderer`.
//! This module provides that seam plus the winit/wgpu implementation behind it.
//!
//! Current entrypoint: `render::app::run()`.

pub mod app;

/// GPU context (instance/adapter/device/queue/surface).
pub mod gpu;

/// Vertex and uniform layouts shared by the line pipeline.
pub mod primitives;

/// wgpu line-list renderer implementing `Renderer`.
pub mod line_renderer;

/// Window-facing viewer state: winit events in, session calls out.
pub mod viewer;

use crate::scene::{Geometry, Mat4};
use crate::view::Viewport;

/// What the viewer core needs from a rasterizer.
///
/// Calls arrive synchronously from event handlers. Implementations may defer the
/// actual GPU work to the next frame; calling any method repeatedly with the same
/// arguments must be harmless.
pub trait Renderer {
    /// Replace all vertex/color data.
    fn upload_geometry(&mut self, geometry: &Geometry);

    fn set_projection(&mut self, projection: Mat4);

    fn set_model(&mut self, model: Mat4);

    /// Letterboxed drawing region inside the surface.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Clear the surface to the background color.
    fn clear(&mut self);

    /// Draw the first `count` uploaded vertices as a line list.
    fn draw_lines(&mut self, count: u32);
}
