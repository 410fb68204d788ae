//! The viewer session: one loaded document plus everything derived from it.
//!
//! `ViewerSession` owns the document (viewbox + geometry), the view state and the
//! input controller. It is the only thing that mutates them, and it pushes every
//! change to a `Renderer` before returning.
//!
//! Until a document has loaded successfully the session is *not armed*: input events
//! are dropped and nothing is drawn.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::input::{InputConfig, InputContext, InputController, InputEvent, Response};
use crate::render::Renderer;
use crate::scene::{Document, Mat4, Viewbox};
use crate::svg::{self, ParseOptions, SvgError};
use crate::view::{ViewState, Viewport, compute_projection, compute_viewport, model_matrix};

/// Why a load was rejected. The previously loaded document (if any) stays active.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Svg(#[from] SvgError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub input: InputConfig,
    pub parse: ParseOptions,
}

#[derive(Debug)]
pub struct ViewerSession {
    document: Option<Document>,
    view: ViewState,
    controller: InputController,
    viewport: Option<Viewport>,
    surface: [f32; 2],
    parse: ParseOptions,
}

impl ViewerSession {
    pub fn new(config: SessionConfig, surface_width: f32, surface_height: f32) -> Self {
        Self {
            document: None,
            view: ViewState::IDENTITY,
            controller: InputController::new(config.input),
            viewport: None,
            surface: [surface_width, surface_height],
            parse: config.parse,
        }
    }

    #[inline]
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    #[inline]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    #[inline]
    pub fn controller(&self) -> &InputController {
        &self.controller
    }

    #[inline]
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    #[inline]
    pub fn input_config(&self) -> &InputConfig {
        self.controller.config()
    }

    /// Input is only handled once a document is loaded.
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.document.is_some() && self.viewport.is_some()
    }

    /// Viewbox used when a document has no `viewBox` of its own.
    #[inline]
    pub fn fallback_viewbox(&self) -> Viewbox {
        Viewbox::new(0.0, 0.0, self.surface[0], self.surface[1])
    }

    /// Model matrix for the current view, or `None` before the first load.
    pub fn model_matrix(&self) -> Option<Mat4> {
        let doc = self.document.as_ref()?;
        Some(model_matrix(&doc.viewbox, &self.view))
    }

    pub fn projection(&self) -> Option<Mat4> {
        let doc = self.document.as_ref()?;
        Some(compute_projection(&doc.viewbox))
    }

    /// Load a document from disk.
    ///
    /// The extension is checked before the file is read.
    pub fn load_path(&mut self, path: &Path, renderer: &mut dyn Renderer) -> Result<(), LoadError> {
        svg::check_extension(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_text(&text, renderer)?;
        info!("loaded {}", path.display());
        Ok(())
    }

    /// Parse `text` and, only if that succeeds, replace the current document.
    ///
    /// On success the view is reset to identity and the renderer receives the new
    /// geometry, viewport, projection and model matrix, followed by a clear and a draw.
    pub fn load_text(&mut self, text: &str, renderer: &mut dyn Renderer) -> Result<(), LoadError> {
        let document = svg::parse_document(text, self.fallback_viewbox(), &self.parse)?;

        let viewbox = document.viewbox;
        let viewport = compute_viewport(&viewbox, self.surface[0], self.surface[1]);
        info!(
            "document: {} segments, viewBox {:?}, viewport {}x{}",
            document.geometry.segment_count(),
            viewbox,
            viewport.width,
            viewport.height
        );

        renderer.upload_geometry(&document.geometry);
        renderer.set_viewport(viewport);
        renderer.set_projection(compute_projection(&viewbox));

        self.document = Some(document);
        self.viewport = Some(viewport);
        self.view.reset();
        self.controller.disarm();

        self.push_model(renderer);
        renderer.clear();
        self.draw(renderer);
        Ok(())
    }

    /// Feed one input event through the controller.
    pub fn handle(&mut self, event: &InputEvent, renderer: &mut dyn Renderer) -> Response {
        let (Some(doc), Some(viewport)) = (self.document.as_ref(), self.viewport.as_ref()) else {
            debug!("ignoring {:?}: no document loaded", event.kind());
            return Response::Ignored;
        };

        let mut ctx = InputContext {
            view: &mut self.view,
            viewbox: &doc.viewbox,
            viewport,
        };
        let response = self.controller.dispatch(&mut ctx, event);

        match response {
            Response::Ignored => {}
            Response::Redraw => {
                self.push_model(renderer);
                self.draw(renderer);
            }
            Response::ClearAndRedraw => {
                self.push_model(renderer);
                renderer.clear();
                self.draw(renderer);
            }
        }
        response
    }

    /// Restore the view shown right after the document loaded.
    pub fn reset(&mut self, renderer: &mut dyn Renderer) -> Response {
        self.handle(&InputEvent::Reset, renderer)
    }

    /// Track a new surface size. The projection depends only on the viewbox, so only
    /// the viewport is recomputed.
    pub fn resize(&mut self, width: f32, height: f32, renderer: &mut dyn Renderer) {
        self.surface = [width, height];

        let Some(doc) = self.document.as_ref() else {
            return;
        };
        let viewport = compute_viewport(&doc.viewbox, width, height);
        self.viewport = Some(viewport);

        renderer.set_viewport(viewport);
        renderer.clear();
        self.draw(renderer);
    }

    fn push_model(&self, renderer: &mut dyn Renderer) {
        if let Some(model) = self.model_matrix() {
            renderer.set_model(model);
        }
    }

    fn draw(&self, renderer: &mut dyn Renderer) {
        if let Some(doc) = self.document.as_ref() {
            renderer.draw_lines(doc.geometry.vertex_count() as u32);
        }
    }
}
