//! App entrypoint for the rendering layer.
//!
//! This module owns:
//! - the winit application lifecycle + event loop
//! - creating the window
//! - delegating to an injected async state builder
//!
//! Design:
//! - The app runner is generic over a state type `S: AppState`.
//! - The builder is async and receives the created window.
//! - A builder failure (no adapter, no device, no surface) ends the event loop and is
//!   returned from `run_with_builder`.

use std::{future::Future, path::PathBuf, pin::Pin, sync::Arc};

use anyhow::Context as _;
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

use crate::input::InputConfig;
use crate::render::viewer::ViewerState;
use crate::scene::Rgba;
use crate::session::SessionConfig;
use crate::svg::ParseOptions;

/// App-facing configuration for running the winit event loop.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Window title before a document is loaded.
    pub title: String,
    /// Frames are drawn on demand, so the default is `Wait`.
    pub control_flow: ControlFlow,
    /// Initial inner size of the window in logical pixels.
    pub initial_surface: [f64; 2],
    /// Clear color of the surface.
    pub background: Rgba,
    pub input: InputConfig,
    pub parse: ParseOptions,
    /// Document to open right after the window appears.
    pub initial_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "linescope".to_string(),
            control_flow: ControlFlow::Wait,
            initial_surface: [800.0, 600.0],
            background: Rgba::WHITE,
            input: InputConfig::default(),
            parse: ParseOptions::default(),
            initial_file: None,
        }
    }
}

impl AppConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            input: self.input.clone(),
            parse: self.parse,
        }
    }
}

/// Trait a state must implement to be driven by the app runner.
pub trait AppState: 'static {
    /// Handle window resize.
    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>);

    /// Render one frame.
    fn render(&mut self) -> anyhow::Result<()>;

    /// Request a redraw on the underlying window.
    fn request_redraw(&self);

    /// Any window event the runner does not handle itself (input, drops, focus).
    fn window_event(&mut self, _event: &WindowEvent) {}
}

/// Run the viewer with an explicit configuration.
pub fn run_with_config(config: AppConfig) -> anyhow::Result<()> {
    let state_config = config.clone();
    run_with_builder::<ViewerState, _, _>(config, move |window| async move {
        ViewerState::new(window, state_config).await
    })
}

/// Run the viewer using defaults.
pub fn run() -> anyhow::Result<()> {
    run_with_config(AppConfig::default())
}

/// Run the winit event loop with an injected async state builder.
///
/// Notes:
/// - The builder is called once when the app is resumed (after the window is created).
/// - The builder runs on the current thread using `pollster::block_on`.
/// - If window creation, the builder, or a frame fails fatally, the loop exits and the
///   error is returned here.
pub fn run_with_builder<S, B, Fut>(config: AppConfig, builder: B) -> anyhow::Result<()>
where
    S: AppState,
    B: FnOnce(Arc<Window>) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<S>> + 'static,
{
    let event_loop = EventLoop::new().context("winit: failed to create EventLoop")?;
    event_loop.set_control_flow(config.control_flow);

    let mut app = App::<S>::new_with_builder(config, builder);
    event_loop
        .run_app(&mut app)
        .context("winit: run_app failed")?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Type-erased async builder for creating a state `S` from a created window.
///
/// The future is pinned and boxed so `pollster::block_on(...)` can drive it.
type BoxedStateBuilder<S> = Box<
    dyn FnOnce(Arc<Window>) -> Pin<Box<dyn Future<Output = anyhow::Result<S>> + 'static>> + 'static,
>;

/// Application state used by winit.
struct App<S: AppState> {
    config: AppConfig,
    builder: Option<BoxedStateBuilder<S>>,
    state: Option<S>,
    fatal: Option<anyhow::Error>,
    exiting: bool,
}

impl<S: AppState> App<S> {
    fn new_with_builder<B, Fut>(config: AppConfig, builder: B) -> Self
    where
        B: FnOnce(Arc<Window>) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<S>> + 'static,
    {
        Self {
            config,
            builder: Some(Box::new(|window| Box::pin(builder(window)))),
            state: None,
            fatal: None,
            exiting: false,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{:#}", err);
        self.fatal = Some(err);
        self.exiting = true;
        self.state = None;
        event_loop.exit();
    }

    fn create_state(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<Option<S>> {
        // Resumed can fire again (mobile/web); only the first one builds the state.
        let Some(builder) = self.builder.take() else {
            return Ok(None);
        };

        let [w, h] = self.config.initial_surface;
        let attributes = WindowAttributes::default()
            .with_title(self.config.title.as_str())
            .with_inner_size(LogicalSize::new(w, h));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("winit: failed to create window")?,
        );

        let state = pollster::block_on(builder(window)).context("failed to initialize renderer")?;
        Ok(Some(state))
    }
}

impl<S: AppState> ApplicationHandler for App<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        match self.create_state(event_loop) {
            Ok(Some(state)) => {
                state.request_redraw();
                self.state = Some(state);
            }
            Ok(None) => {}
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.exiting {
            return;
        }
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested; exiting");
                self.exiting = true;
                self.state = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.resize(size);
                state.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = state.render() {
                    self.fail(event_loop, err);
                }
            }
            other => state.window_event(&other),
        }
    }
}
