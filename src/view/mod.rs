//! View transforms: how the current pan/zoom/rotate state turns into matrices.
//!
//! Two independent pieces live here:
//! - the model transform (`model_matrix`), recomputed on every gesture
//! - the letterboxed viewport + orthographic projection, computed once per document
//!   load (and the viewport again on surface resize)
//!
//! Both are pure functions of their inputs; callers own the state.

use crate::scene::{Mat4, Viewbox};

/// Accumulated pan/zoom/rotate state for the loaded document.
///
/// - `scale` stays within the configured bounds (default `[0.1, 10.0]`)
/// - `angle_degrees` is unbounded; rotation is periodic through the trig functions
/// - `translation` is in document units and unbounded
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewState {
    pub scale: f32,
    pub angle_degrees: f32,
    pub translation: [f32; 2],
}

impl ViewState {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        angle_degrees: 0.0,
        translation: [0.0, 0.0],
    };

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::IDENTITY;
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// `T(c) * inner * T(-c)`: apply `inner` about the point `c`.
#[inline]
fn about_point(c: [f32; 2], inner: Mat4) -> Mat4 {
    Mat4::translate(c[0], c[1], 0.0)
        .mul(inner)
        .mul(Mat4::translate(-c[0], -c[1], 0.0))
}

/// Uniform scale about the viewbox center.
pub fn scale_matrix(viewbox: &Viewbox, scale: f32) -> Mat4 {
    about_point(viewbox.center(), Mat4::scale(scale, scale, scale))
}

/// Rotation about +Z around the viewbox center.
pub fn rotate_matrix(viewbox: &Viewbox, angle_degrees: f32) -> Mat4 {
    about_point(viewbox.center(), Mat4::rotate_z(angle_degrees))
}

#[inline]
pub fn translate_matrix(translation: [f32; 2]) -> Mat4 {
    Mat4::translate(translation[0], translation[1], 0.0)
}

/// Compose the model matrix as `Scale * Translate * Rotate`.
///
/// A vertex is rotated about the viewbox center first, then panned, then scaled about
/// the viewbox center. Pure: identical inputs give bit-identical output.
pub fn model_matrix(viewbox: &Viewbox, state: &ViewState) -> Mat4 {
    scale_matrix(viewbox, state.scale)
        .mul(translate_matrix(state.translation))
        .mul(rotate_matrix(viewbox, state.angle_degrees))
}

/// Letterboxed drawing region inside the surface, in physical pixels.
///
/// The region is anchored at the surface's bottom-left corner (GL convention), so in
/// top-left window coordinates it spans `y in [surface_height - height, surface_height]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub surface_width: f32,
    pub surface_height: f32,
}

impl Viewport {
    /// Top edge of the viewport in top-left window coordinates.
    #[inline]
    pub fn top(&self) -> f32 {
        self.surface_height - self.height
    }
}

/// Fit the viewbox aspect ratio into the surface without stretching.
///
/// - Taller than wide: height fills the surface, width shrinks by `width / height`.
/// - Otherwise: width fills the surface, height shrinks by `height / width`.
pub fn compute_viewport(viewbox: &Viewbox, surface_width: f32, surface_height: f32) -> Viewport {
    let (width, height) = if viewbox.width < viewbox.height {
        (surface_height * (viewbox.width / viewbox.height), surface_height)
    } else {
        (surface_width, surface_width * (viewbox.height / viewbox.width))
    };

    Viewport {
        width,
        height,
        surface_width,
        surface_height,
    }
}

/// Orthographic projection straight from the viewbox edges.
///
/// `bottom = max_y`, `top = min_y`: document Y grows downwards, clip Y grows upwards.
pub fn compute_projection(viewbox: &Viewbox) -> Mat4 {
    Mat4::ortho(
        viewbox.min_x,
        viewbox.max_x(),
        viewbox.max_y(),
        viewbox.min_y,
        -1.0,
        1.0,
    )
}

/// Map a pointer position (top-left window pixels) into document coordinates.
///
/// The pointer is first expressed relative to the viewport's bottom-left origin, then
/// normalized by the viewport size, scaled into the viewbox and flipped back into the
/// document's top-down Y convention. Pointer travel and the resulting document-space
/// delta always point the same way.
pub fn screen_to_world(viewbox: &Viewbox, viewport: &Viewport, px: f32, py: f32) -> [f32; 2] {
    let from_bottom = viewport.surface_height - py;

    let nx = px / viewport.width;
    let ny = from_bottom / viewport.height;

    [
        viewbox.min_x + nx * viewbox.width,
        viewbox.max_y() - ny * viewbox.height,
    ]
}
