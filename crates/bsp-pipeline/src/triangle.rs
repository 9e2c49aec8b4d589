//! Triangle faces: the unit of work of the polygon buffer.

use bitflags::bitflags;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;

use crate::{Rgb, Vertex};

/// Texture handle passed through to the rasterizer untouched.
pub type TextureId = u16;

/// Faces with a normal shorter than this are treated as zero-area.
pub const AREA_EPSILON: f32 = 1e-6;

bitflags! {
    /// Per-face state. The flags are independent of each other.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FaceState: u8 {
        const ACTIVE   = 0x01;
        const CLIPPED  = 0x02;
        const BACKFACE = 0x04;
        const LIT      = 0x08;
    }
}

impl FaceState {
    /// Flags that are recomputed every frame.
    pub const PER_FRAME: FaceState = FaceState::CLIPPED
        .union(FaceState::BACKFACE)
        .union(FaceState::LIT);
}

/// How a face is shaded. Exactly one mode applies to a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadeMode {
    /// Emissive: the base color is used verbatim.
    Constant,
    /// One color per face.
    #[default]
    Flat,
    /// One color per vertex.
    Gouraud,
    /// Texture mapped; lit like `Flat`.
    Textured,
}

/// Computes the winding-derived normal `(b - a) x (c - a)` and its length.
#[inline]
pub(crate) fn face_normal(a: &Point3<f32>, b: &Point3<f32>, c: &Point3<f32>) -> (Vector3<f32>, f32) {
    let n = (b - a).cross(&(c - a));
    let len = n.norm();
    (n, len)
}

/// A triangle with a rest-pose (`local`) and a working (`trans`) vertex list.
///
/// The cached normal always describes the current `trans` positions. Code
/// that moves those positions goes through [`Triangle::set_trans`] or calls
/// [`Triangle::recompute_normal`] afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub state: FaceState,
    pub mode: ShadeMode,
    /// Base (unlit) color.
    pub color: Rgb,
    /// Lit colors. `Flat`, `Constant` and `Textured` use slot 0 only.
    pub lit: [Rgb; 3],
    pub texture: Option<TextureId>,
    /// Identifies where the triangle came from (wall id for BSP output).
    pub tag: u32,
    pub(crate) local: [Vertex; 3],
    pub(crate) trans: [Vertex; 3],
    normal: Vector3<f32>,
    normal_length: f32,
}

impl Triangle {
    /// Creates an active, flat-shaded white triangle. Both vertex lists start
    /// out equal to `vertices`.
    pub fn new(vertices: [Vertex; 3]) -> Self {
        let mut tri = Self {
            state: FaceState::ACTIVE,
            mode: ShadeMode::Flat,
            color: Rgb::WHITE,
            lit: [Rgb::WHITE; 3],
            texture: None,
            tag: 0,
            local: vertices,
            trans: vertices,
            normal: Vector3::zeros(),
            normal_length: 0.0,
        };
        tri.recompute_normal();
        tri
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self.lit = [color; 3];
        self
    }

    pub fn with_mode(mut self, mode: ShadeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_tag(mut self, tag: u32) -> Self {
        self.tag = tag;
        self
    }

    #[inline]
    pub fn local(&self) -> &[Vertex; 3] {
        &self.local
    }

    #[inline]
    pub fn trans(&self) -> &[Vertex; 3] {
        &self.trans
    }

    /// Replaces the working vertices and refreshes the cached normal.
    pub fn set_trans(&mut self, vertices: [Vertex; 3]) {
        self.trans = vertices;
        self.recompute_normal();
    }

    /// Unnormalized face normal of the `trans` vertices.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Length of [`Triangle::normal`]; twice the triangle area.
    #[inline]
    pub fn normal_length(&self) -> f32 {
        self.normal_length
    }

    pub fn recompute_normal(&mut self) {
        let [a, b, c] = &self.trans;
        let (n, len) = face_normal(&a.position, &b.position, &c.position);
        self.normal = n;
        self.normal_length = len;
    }

    /// Area of the `trans` triangle.
    #[inline]
    pub fn area(&self) -> f32 {
        0.5 * self.normal_length
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.normal_length > AREA_EPSILON)
    }

    /// Active and neither clipped nor back-facing.
    #[inline]
    pub fn is_renderable(&self) -> bool {
        self.state.contains(FaceState::ACTIVE)
            && !self.state.intersects(FaceState::CLIPPED | FaceState::BACKFACE)
    }

    pub fn average_z(&self) -> f32 {
        self.trans.iter().map(|v| v.position.z).sum::<f32>() / 3.0
    }

    pub fn min_z(&self) -> f32 {
        self.trans.iter().map(|v| v.position.z).fold(f32::INFINITY, f32::min)
    }

    pub fn max_z(&self) -> f32 {
        self.trans.iter().map(|v| v.position.z).fold(f32::NEG_INFINITY, f32::max)
    }
}
