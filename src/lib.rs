//! `linescope` library crate root.
//!
//! An interactive viewer for SVG line drawings: the document is flattened into line
//! segments once at load time, then panned, scaled and rotated around its viewbox
//! center by updating a single model matrix.
//!
//! The binary stays thin and calls `run_app`. Everything below `render` is free of
//! winit/wgpu, so the view math and the input state machine can be driven directly
//! (see `session::ViewerSession` and the `render::Renderer` seam).

pub mod input;
pub mod render;
pub mod scene;
pub mod session;
pub mod svg;
pub mod view;

pub use render::app::AppConfig;

/// Run the viewer with the default configuration.
///
/// Note: This function does **not** initialize logging; callers decide their own
/// logging setup.
pub fn run_app() -> anyhow::Result<()> {
    render::app::run()
}

/// Run the viewer with an explicit configuration.
pub fn run_app_with(config: AppConfig) -> anyhow::Result<()> {
    render::app::run_with_config(config)
}
