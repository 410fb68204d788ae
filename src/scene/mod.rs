//! Document-space primitives shared by the viewer core and the renderer.
//!
//! Everything here is renderer-agnostic: no winit, no wgpu.
//!
//! - `Mat4`: immutable column-major 4x4 matrix used for both the model and the
//!   projection transforms.
//! - `Viewbox`: the rectangle of document space that maps onto the drawing surface.
//! - `Rgba` / `Geometry`: line-list vertices with a parallel per-vertex color list.

/// 4x4 transform stored column-major (`m[col][row]`).
///
/// Convention:
/// - Column vectors `(x, y, z, 1)`
/// - `a.mul(b)` applies `b` first, then `a`
///
/// The layout matches WGSL `mat4x4<f32>`, so `to_cols_array_2d()` can be uploaded
/// directly into a uniform buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    #[inline]
    pub fn translate(tx: f32, ty: f32, tz: f32) -> Self {
        let mut out = Self::IDENTITY;
        out.m[3] = [tx, ty, tz, 1.0];
        out
    }

    #[inline]
    pub fn scale(sx: f32, sy: f32, sz: f32) -> Self {
        let mut out = Self::IDENTITY;
        out.m[0][0] = sx;
        out.m[1][1] = sy;
        out.m[2][2] = sz;
        out
    }

    /// Counter-clockwise rotation about +Z, in degrees.
    #[inline]
    pub fn rotate_z(degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        let mut out = Self::IDENTITY;
        out.m[0] = [c, s, 0.0, 0.0];
        out.m[1] = [-s, c, 0.0, 0.0];
        out
    }

    /// OpenGL-style orthographic projection (clip z in `[-1, 1]`).
    ///
    /// Passing `bottom > top` flips the Y axis, which is how a top-left-origin
    /// document is mapped onto a bottom-left-origin surface.
    #[inline]
    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        glam::Mat4::orthographic_rh_gl(left, right, bottom, top, near, far).into()
    }

    /// Compose transforms: `self * rhs`.
    #[inline]
    pub fn mul(self, rhs: Self) -> Self {
        let a = self.m;
        let b = rhs.m;

        let mut out = [[0.0f32; 4]; 4];
        for col in 0..4 {
            for row in 0..4 {
                out[col][row] = a[0][row] * b[col][0]
                    + a[1][row] * b[col][1]
                    + a[2][row] * b[col][2]
                    + a[3][row] * b[col][3];
            }
        }
        Self { m: out }
    }

    /// Transform the point `(x, y, 0, 1)` and return its `(x, y)`.
    #[inline]
    pub fn transform_point(self, x: f32, y: f32) -> (f32, f32) {
        let m = self.m;
        let nx = m[0][0] * x + m[1][0] * y + m[3][0];
        let ny = m[0][1] * x + m[1][1] * y + m[3][1];
        (nx, ny)
    }

    #[inline]
    pub fn to_cols_array_2d(self) -> [[f32; 4]; 4] {
        self.m
    }

    /// Element-wise comparison with an absolute tolerance.
    pub fn abs_diff_eq(&self, other: &Self, eps: f32) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= eps)
    }
}

impl From<glam::Mat4> for Mat4 {
    fn from(value: glam::Mat4) -> Self {
        Self {
            m: value.to_cols_array_2d(),
        }
    }
}

impl From<Mat4> for glam::Mat4 {
    fn from(value: Mat4) -> Self {
        glam::Mat4::from_cols_array_2d(&value.m)
    }
}

/// The document's own coordinate rectangle: `(min_x, min_y, width, height)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewbox {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewbox {
    #[inline]
    pub fn new(min_x: f32, min_y: f32, width: f32, height: f32) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    /// Center of the box, `min + size / 2` on each axis.
    ///
    /// Both the scale and the rotation pivot use this point.
    #[inline]
    pub fn center(&self) -> [f32; 2] {
        [
            self.min_x + self.width * 0.5,
            self.min_y + self.height * 0.5,
        ]
    }

    #[inline]
    pub fn max_x(&self) -> f32 {
        self.min_x + self.width
    }

    #[inline]
    pub fn max_y(&self) -> f32 {
        self.min_y + self.height
    }
}

/// Simple RGBA color, components in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    #[inline]
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }
}

/// Line-list geometry: every two consecutive vertices form one segment.
///
/// `colors[i]` is the color of `vertices[i]`; both lists always have the same length
/// and an even number of entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    vertices: Vec<[f32; 2]>,
    colors: Vec<Rgba>,
}

impl Geometry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one segment `a -> b` drawn in `color`.
    #[inline]
    pub fn push_segment(&mut self, a: [f32; 2], b: [f32; 2], color: Rgba) {
        self.vertices.push(a);
        self.vertices.push(b);
        self.colors.push(color);
        self.colors.push(color);
    }

    #[inline]
    pub fn vertices(&self) -> &[[f32; 2]] {
        &self.vertices
    }

    #[inline]
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    /// Number of vertices (twice the number of segments).
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.vertices.len() / 2
    }
}

/// A loaded document: its viewbox plus the geometry extracted from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub viewbox: Viewbox,
    pub geometry: Geometry,
}
