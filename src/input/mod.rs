//! Pointer / wheel / key gestures and the state machine that turns them into
//! `ViewState` mutations.
//!
//! The controller knows nothing about winit: the app layer translates window events
//! into `InputEvent`s and feeds them through `InputController::dispatch`. Tests do the
//! same with synthetic events.
//!
//! States:
//! - `Idle`: pointer moves are ignored.
//! - `Dragging`: pointer moves pan the view by the document-space delta since the
//!   previous pointer position.
//!
//! Wheel and reset are handled in either state.

use log::debug;

use crate::scene::Viewbox;
use crate::view::{ViewState, Viewport, screen_to_world};

/// Tunables for gesture handling.
#[derive(Debug, Clone)]
pub struct InputConfig {
    /// Scale change per wheel tick (modifier held).
    pub scale_step: f32,
    /// Rotation change per wheel tick, in degrees (no modifier).
    pub rotate_step_degrees: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Key that restores the initial view (matched case-insensitively).
    pub reset_key: char,
    /// Key that opens the file chooser (matched case-insensitively).
    pub open_key: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            scale_step: 0.10,
            rotate_step_degrees: 2.0,
            min_scale: 0.1,
            max_scale: 10.0,
            reset_key: 'r',
            open_key: 'o',
        }
    }
}

/// Input events in window pixel coordinates (top-left origin).
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    /// Release anywhere; not limited to the drawing surface.
    PointerUp,
    /// `delta_y > 0` is a wheel-down tick, `< 0` a wheel-up tick.
    Wheel { delta_y: f32, modifier: bool },
    Reset,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    Wheel,
    Reset,
}

impl InputEvent {
    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::PointerDown { .. } => EventKind::PointerDown,
            InputEvent::PointerMove { .. } => EventKind::PointerMove,
            InputEvent::PointerUp => EventKind::PointerUp,
            InputEvent::Wheel { .. } => EventKind::Wheel,
            InputEvent::Reset => EventKind::Reset,
        }
    }
}

/// What the caller has to do after an event was handled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Response {
    /// Nothing changed.
    Ignored,
    /// The model matrix changed; redraw.
    Redraw,
    /// The model matrix changed; clear the surface, then redraw.
    ClearAndRedraw,
}

impl Response {
    #[inline]
    pub fn needs_redraw(self) -> bool {
        !matches!(self, Response::Ignored)
    }
}

/// Lives only between pointer-down and pointer-up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DragState {
    /// Previous pointer position, already mapped into document space.
    pub last_pointer: [f32; 2],
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    Dragging(DragState),
}

/// Everything a handler may read or mutate besides the controller itself.
pub struct InputContext<'a> {
    pub view: &'a mut ViewState,
    pub viewbox: &'a Viewbox,
    pub viewport: &'a Viewport,
}

impl InputContext<'_> {
    #[inline]
    fn to_world(&self, x: f32, y: f32) -> [f32; 2] {
        screen_to_world(self.viewbox, self.viewport, x, y)
    }
}

pub type Handler = fn(&mut InputController, &mut InputContext<'_>, &InputEvent) -> Response;

/// Event kind -> handler.
pub fn handler_for(kind: EventKind) -> Handler {
    match kind {
        EventKind::PointerDown => InputController::on_pointer_down,
        EventKind::PointerMove => InputController::on_pointer_move,
        EventKind::PointerUp => InputController::on_pointer_up,
        EventKind::Wheel => InputController::on_wheel,
        EventKind::Reset => InputController::on_reset,
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputController {
    state: ControllerState,
    config: InputConfig,
}

impl InputController {
    pub fn new(config: InputConfig) -> Self {
        Self {
            state: ControllerState::Idle,
            config,
        }
    }

    #[inline]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ControllerState::Dragging(_))
    }

    #[inline]
    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Drop any in-progress drag without touching the view.
    #[inline]
    pub fn disarm(&mut self) {
        self.state = ControllerState::Idle;
    }

    /// Route one event through the dispatch table.
    pub fn dispatch(&mut self, ctx: &mut InputContext<'_>, event: &InputEvent) -> Response {
        handler_for(event.kind())(self, ctx, event)
    }

    fn on_pointer_down(&mut self, ctx: &mut InputContext<'_>, event: &InputEvent) -> Response {
        let InputEvent::PointerDown { x, y } = *event else {
            return Response::Ignored;
        };

        let last_pointer = ctx.to_world(x, y);
        self.state = ControllerState::Dragging(DragState { last_pointer });
        Response::Ignored
    }

    fn on_pointer_move(&mut self, ctx: &mut InputContext<'_>, event: &InputEvent) -> Response {
        let InputEvent::PointerMove { x, y } = *event else {
            return Response::Ignored;
        };
        let ControllerState::Dragging(drag) = &mut self.state else {
            return Response::Ignored;
        };

        let current = ctx.to_world(x, y);
        let dx = current[0] - drag.last_pointer[0];
        let dy = current[1] - drag.last_pointer[1];

        ctx.view.translation[0] += dx;
        ctx.view.translation[1] += dy;
        drag.last_pointer = current;

        debug!(
            "pan by ({dx:.3}, {dy:.3}) -> translation {:?}",
            ctx.view.translation
        );
        Response::Redraw
    }

    fn on_pointer_up(&mut self, _ctx: &mut InputContext<'_>, _event: &InputEvent) -> Response {
        self.state = ControllerState::Idle;
        Response::Ignored
    }

    fn on_wheel(&mut self, ctx: &mut InputContext<'_>, event: &InputEvent) -> Response {
        let InputEvent::Wheel { delta_y, modifier } = *event else {
            return Response::Ignored;
        };
        if delta_y == 0.0 || delta_y.is_nan() {
            return Response::Ignored;
        }
        let sign = delta_y.signum();

        if modifier {
            let scale = ctx.view.scale + sign * self.config.scale_step;
            ctx.view.scale = scale.clamp(self.config.min_scale, self.config.max_scale);
            debug!("scale -> {:.2}", ctx.view.scale);
        } else {
            ctx.view.angle_degrees += sign * self.config.rotate_step_degrees;
            debug!("angle -> {:.1} deg", ctx.view.angle_degrees);
        }

        Response::ClearAndRedraw
    }

    fn on_reset(&mut self, ctx: &mut InputContext<'_>, _event: &InputEvent) -> Response {
        ctx.view.reset();
        self.state = ControllerState::Idle;
        debug!("view reset");
        Response::ClearAndRedraw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::compute_viewport;

    const EPS: f32 = 1e-4;

    struct Fixture {
        controller: InputController,
        view: ViewState,
        viewbox: Viewbox,
        viewport: Viewport,
    }

    impl Fixture {
        fn new(viewbox: Viewbox, surface: (f32, f32)) -> Self {
            Self {
                controller: InputController::default(),
                view: ViewState::IDENTITY,
                viewbox,
                viewport: compute_viewport(&viewbox, surface.0, surface.1),
            }
        }

        fn square() -> Self {
            Self::new(Viewbox::new(0.0, 0.0, 100.0, 100.0), (400.0, 400.0))
        }

        fn send(&mut self, event: InputEvent) -> Response {
            let mut ctx = InputContext {
                view: &mut self.view,
                viewbox: &self.viewbox,
                viewport: &self.viewport,
            };
            self.controller.dispatch(&mut ctx, &event)
        }

        fn wheel(&mut self, delta_y: f32, modifier: bool) -> Response {
            self.send(InputEvent::Wheel { delta_y, modifier })
        }
    }

    #[test]
    fn table_dispatch_matches_direct_handler_call() {
        let events = [
            InputEvent::PointerDown { x: 0.0, y: 0.0 },
            InputEvent::PointerMove { x: 20.0, y: 0.0 },
            InputEvent::Wheel {
                delta_y: 1.0,
                modifier: false,
            },
            InputEvent::PointerUp,
            InputEvent::Reset,
        ];

        let mut routed = Fixture::square();
        let mut direct = Fixture::square();
        for event in events {
            let a = routed.send(event);
            let b = {
                let mut ctx = InputContext {
                    view: &mut direct.view,
                    viewbox: &direct.viewbox,
                    viewport: &direct.viewport,
                };
                handler_for(event.kind())(&mut direct.controller, &mut ctx, &event)
            };
            assert_eq!(a, b);
            assert_eq!(routed.view, direct.view);
            assert_eq!(routed.controller.state(), direct.controller.state());
        }
    }

    #[test]
    fn pointer_down_enters_dragging_and_up_returns_to_idle() {
        let mut f = Fixture::square();
        assert_eq!(f.controller.state(), ControllerState::Idle);

        f.send(InputEvent::PointerDown { x: 40.0, y: 40.0 });
        let ControllerState::Dragging(drag) = f.controller.state() else {
            panic!("expected a drag after pointer-down");
        };
        assert!((drag.last_pointer[0] - 10.0).abs() <= EPS);
        assert!((drag.last_pointer[1] - 10.0).abs() <= EPS);

        f.send(InputEvent::PointerUp);
        assert_eq!(f.controller.state(), ControllerState::Idle);
    }

    #[test]
    fn move_without_press_is_ignored() {
        let mut f = Fixture::square();
        assert_eq!(
            f.send(InputEvent::PointerMove { x: 50.0, y: 50.0 }),
            Response::Ignored
        );
        assert!(f.view.is_identity());
    }

    #[test]
    fn drag_translates_by_document_delta_not_pixels() {
        let mut f = Fixture::square();
        f.send(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        assert_eq!(
            f.send(InputEvent::PointerMove { x: 10.0, y: 0.0 }),
            Response::Redraw
        );

        // 400px surface showing 100 document units: 10px == 2.5 units.
        assert!((f.view.translation[0] - 2.5).abs() <= EPS);
        assert!(f.view.translation[1].abs() <= EPS);
    }

    #[test]
    fn drag_down_moves_content_down() {
        let mut f = Fixture::square();
        f.send(InputEvent::PointerDown { x: 100.0, y: 100.0 });
        f.send(InputEvent::PointerMove { x: 100.0, y: 140.0 });
        assert!((f.view.translation[1] - 10.0).abs() <= EPS);
    }

    #[test]
    fn reversed_drag_cancels_out() {
        let mut f = Fixture::new(Viewbox::new(-3.0, 7.0, 120.0, 45.0), (640.0, 480.0));
        f.view.translation = [4.0, -2.0];

        f.send(InputEvent::PointerDown { x: 12.0, y: 300.0 });
        for step in 1..=10 {
            let t = step as f32;
            f.send(InputEvent::PointerMove {
                x: 12.0 + 17.0 * t,
                y: 300.0 + 9.0 * t,
            });
        }
        f.send(InputEvent::PointerUp);

        f.send(InputEvent::PointerDown { x: 182.0, y: 390.0 });
        f.send(InputEvent::PointerMove { x: 12.0, y: 300.0 });
        f.send(InputEvent::PointerUp);

        assert!((f.view.translation[0] - 4.0).abs() <= 1e-3);
        assert!((f.view.translation[1] + 2.0).abs() <= 1e-3);
    }

    #[test]
    fn modified_wheel_scales_in_tenth_steps() {
        let mut f = Fixture::square();
        assert_eq!(f.wheel(1.0, true), Response::ClearAndRedraw);
        assert_eq!(f.wheel(3.0, true), Response::ClearAndRedraw);
        assert!((f.view.scale - 1.2).abs() <= EPS);

        f.wheel(-1.0, true);
        assert!((f.view.scale - 1.1).abs() <= EPS);
        assert_eq!(f.view.angle_degrees, 0.0);
    }

    #[test]
    fn scale_is_clamped_on_both_ends() {
        let mut f = Fixture::square();
        for _ in 0..200 {
            f.wheel(1.0, true);
            assert!(f.view.scale <= 10.0);
        }
        assert_eq!(f.view.scale, 10.0);

        for _ in 0..200 {
            f.wheel(-1.0, true);
            assert!(f.view.scale >= 0.1);
        }
        assert_eq!(f.view.scale, 0.1);
    }

    #[test]
    fn scale_tracks_net_ticks_while_in_range() {
        let mut f = Fixture::square();
        let ticks = [1.0, 1.0, -1.0, 1.0, 1.0, 1.0, -1.0, 1.0];
        let mut net = 0i32;
        for d in ticks {
            f.wheel(d, true);
            net += d as i32;
        }
        let expected = (1.0 + 0.10 * net as f32).clamp(0.1, 10.0);
        assert!((f.view.scale - expected).abs() <= EPS);
    }

    #[test]
    fn plain_wheel_rotates_two_degrees_per_tick() {
        let mut f = Fixture::square();
        f.wheel(1.0, false);
        assert_eq!(f.view.angle_degrees, 2.0);
        f.wheel(-1.0, false);
        f.wheel(-1.0, false);
        assert_eq!(f.view.angle_degrees, -2.0);
        assert_eq!(f.view.scale, 1.0);
    }

    #[test]
    fn rotation_is_unbounded() {
        let mut f = Fixture::square();
        for _ in 0..500 {
            f.wheel(1.0, false);
        }
        assert!((f.view.angle_degrees - 1000.0).abs() <= EPS);
    }

    #[test]
    fn zero_wheel_delta_changes_nothing() {
        let mut f = Fixture::square();
        assert_eq!(f.wheel(0.0, true), Response::Ignored);
        assert_eq!(f.wheel(0.0, false), Response::Ignored);
        assert!(f.view.is_identity());
    }

    #[test]
    fn wheel_works_while_dragging() {
        let mut f = Fixture::square();
        f.send(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        f.wheel(1.0, false);
        assert!(f.controller.is_dragging());
        assert_eq!(f.view.angle_degrees, 2.0);
    }

    #[test]
    fn reset_restores_identity_from_any_state() {
        let mut f = Fixture::square();
        f.wheel(1.0, true);
        f.wheel(1.0, false);
        f.send(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        f.send(InputEvent::PointerMove { x: 30.0, y: 10.0 });

        assert_eq!(f.send(InputEvent::Reset), Response::ClearAndRedraw);
        assert!(f.view.is_identity());

        // Idempotent.
        f.send(InputEvent::Reset);
        assert!(f.view.is_identity());
    }

    #[test]
    fn reset_cancels_in_progress_drag() {
        let mut f = Fixture::square();
        f.send(InputEvent::PointerDown { x: 0.0, y: 0.0 });
        f.send(InputEvent::Reset);

        assert!(!f.controller.is_dragging());
        assert_eq!(
            f.send(InputEvent::PointerMove { x: 80.0, y: 80.0 }),
            Response::Ignored
        );
        assert!(f.view.is_identity());
    }

    #[test]
    fn custom_steps_are_honored() {
        let mut f = Fixture::square();
        f.controller = InputController::new(InputConfig {
            scale_step: 0.5,
            rotate_step_degrees: 15.0,
            max_scale: 2.0,
            ..Default::default()
        });
        f.wheel(1.0, true);
        f.wheel(1.0, true);
        f.wheel(1.0, true);
        f.wheel(1.0, false);
        assert_eq!(f.view.scale, 2.0);
        assert_eq!(f.view.angle_degrees, 15.0);
    }
}
