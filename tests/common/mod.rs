#![allow(dead_code)]

use linescope::render::Renderer;
use linescope::scene::{Geometry, Mat4};
use linescope::session::{SessionConfig, ViewerSession};
use linescope::view::Viewport;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload { vertices: usize },
    Projection(Mat4),
    Model(Mat4),
    Viewport(Viewport),
    Clear,
    Draw(u32),
}

/// Records every call in order; no GPU involved.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<Call>,
}

impl RecordingRenderer {
    pub fn take(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn last_model(&self) -> Option<Mat4> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Model(m) => Some(*m),
            _ => None,
        })
    }
}

impl Renderer for RecordingRenderer {
    fn upload_geometry(&mut self, geometry: &Geometry) {
        self.calls.push(Call::Upload {
            vertices: geometry.vertex_count(),
        });
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.calls.push(Call::Projection(projection));
    }

    fn set_model(&mut self, model: Mat4) {
        self.calls.push(Call::Model(model));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(Call::Viewport(viewport));
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn draw_lines(&mut self, count: u32) {
        self.calls.push(Call::Draw(count));
    }
}

pub const SQUARE_WITH_LINE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
  <line x1="0" y1="0" x2="10" y2="0" stroke="#ff0000"/>
</svg>"##;

pub fn session(width: f32, height: f32) -> ViewerSession {
    ViewerSession::new(SessionConfig::default(), width, height)
}

pub fn close(a: (f32, f32), b: (f32, f32)) -> bool {
    (a.0 - b.0).abs() <= 1e-4 && (a.1 - b.1).abs() <= 1e-4
}
