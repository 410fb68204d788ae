//! Window-facing viewer state.
//!
//! Translates winit events into `InputEvent`s for the session and replays the
//! recorded line state into a render pass on `RedrawRequested`.
//!
//! Bindings:
//! - left button press/release: start/end a drag, cursor moves pan while dragging
//! - wheel: rotate, or scale with Shift held
//! - `R`: reset the view, `O`: open a file
//! - dropping a file on the window loads it

use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};
use winit::{
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{Key, ModifiersState},
    window::Window,
};

use crate::input::InputEvent;
use crate::render::app::{AppConfig, AppState};
use crate::render::gpu::Gpu;
use crate::render::line_renderer::LineRenderer;
use crate::session::{LoadError, ViewerSession};

pub struct ViewerState {
    window: Arc<Window>,
    gpu: Gpu,
    lines: LineRenderer,
    session: ViewerSession,

    title: String,
    cursor: [f32; 2],
    modifiers: ModifiersState,
}

impl ViewerState {
    pub async fn new(window: Arc<Window>, config: AppConfig) -> anyhow::Result<Self> {
        let gpu = Gpu::new(window.clone()).await?;
        let lines = LineRenderer::new(&gpu, config.background)?;

        let size = window.inner_size();
        let session = ViewerSession::new(
            config.session_config(),
            size.width as f32,
            size.height as f32,
        );

        let mut state = Self {
            window,
            gpu,
            lines,
            session,
            title: config.title,
            cursor: [0.0, 0.0],
            modifiers: ModifiersState::empty(),
        };

        if let Some(path) = config.initial_file.as_deref() {
            state.open_path(path);
        }
        Ok(state)
    }

    fn open_path(&mut self, path: &Path) {
        let mut renderer = self.lines.bind(&self.gpu);
        match self.session.load_path(path, &mut renderer) {
            Ok(()) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.window.set_title(&format!("{} - {}", self.title, name));
                self.window.request_redraw();
            }
            Err(err) => {
                warn!("could not load {}: {}", path.display(), err);
                show_load_error(path, &err);
            }
        }
    }

    fn open_dialog(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Open SVG")
            .add_filter("SVG", &["svg"])
            .pick_file();

        match picked {
            Some(path) => self.open_path(&path),
            None => debug!("open dialog cancelled"),
        }
    }

    fn dispatch(&mut self, event: InputEvent) {
        let mut renderer = self.lines.bind(&self.gpu);
        let response = self.session.handle(&event, &mut renderer);
        if response.needs_redraw() {
            self.window.request_redraw();
        }
    }

    fn on_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        let Key::Character(text) = &event.logical_key else {
            return;
        };
        let Some(ch) = text.chars().next() else {
            return;
        };

        let config = self.session.input_config();
        let (reset_key, open_key) = (config.reset_key, config.open_key);
        if ch.eq_ignore_ascii_case(&reset_key) {
            self.dispatch(InputEvent::Reset);
        } else if ch.eq_ignore_ascii_case(&open_key) {
            self.open_dialog();
        }
    }
}

/// Wheel distance in DOM convention: positive is a wheel-down tick.
fn wheel_delta_y(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -*y,
        MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32),
    }
}

fn show_load_error(path: &Path, err: &LoadError) {
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("Could not open file")
        .set_description(format!("{}\n\n{}", path.display(), err))
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

impl AppState for ViewerState {
    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        info!("resized to {}x{}", new_size.width, new_size.height);

        let mut renderer = self.lines.bind(&self.gpu);
        self.session
            .resize(new_size.width as f32, new_size.height as f32, &mut renderer);
    }

    fn render(&mut self) -> anyhow::Result<()> {
        if !self.gpu.has_drawable_size() {
            return Ok(());
        }

        // Acquire frame (handle recoverable surface errors).
        let (surface_texture, view) = match self.gpu.acquire_frame() {
            Ok(v) => v,
            Err(wgpu::SurfaceError::Outdated)
            | Err(wgpu::SurfaceError::Lost)
            | Err(wgpu::SurfaceError::Other) => {
                self.gpu.resize(self.gpu.size);
                self.request_redraw();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                self.request_redraw();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(anyhow::anyhow!("wgpu SurfaceError::OutOfMemory"));
            }
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Viewer Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Viewer Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.lines.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            self.lines
                .draw(&mut pass, self.gpu.config.width, self.gpu.config.height);
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        surface_texture.present();

        Ok(())
    }

    fn request_redraw(&self) {
        self.window.request_redraw();
    }

    fn window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = [position.x as f32, position.y as f32];
                let [x, y] = self.cursor;
                self.dispatch(InputEvent::PointerMove { x, y });
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    let [x, y] = self.cursor;
                    self.dispatch(InputEvent::PointerDown { x, y });
                }
                ElementState::Released => self.dispatch(InputEvent::PointerUp),
            },
            // A release outside the window may never arrive.
            WindowEvent::Focused(false) => self.dispatch(InputEvent::PointerUp),
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = wheel_delta_y(delta);
                let modifier = self.modifiers.shift_key();
                self.dispatch(InputEvent::Wheel { delta_y, modifier });
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event),
            WindowEvent::DroppedFile(path) => self.open_path(path),
            _ => {}
        }
    }
}
