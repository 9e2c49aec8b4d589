//! Wall (quad) representation: the input geometry of the BSP tree.

use nalgebra::{Matrix4, Point2, Point3, Vector3};

use crate::triangle::{face_normal, AREA_EPSILON};
use crate::{FaceState, Rgb, ShadeMode, TextureId, Triangle, Vertex};

/// Added to a wall's id each time it is split, so fragments can be traced
/// back to the wall they came from.
pub const WALL_SPLIT_ID: u32 = 1000;

/// A planar quad standing on the ground plane.
///
/// The four vertices are ordered:
/// - `v0`: top of the leading edge start
/// - `v1`: top of the leading edge end
/// - `v2`: bottom below `v1`
/// - `v3`: bottom below `v0`
///
/// `v0 -> v1` is the leading edge that the BSP builder works with. Seen
/// from the side the normal points to, the vertices run clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    pub id: u32,
    pub state: FaceState,
    pub mode: ShadeMode,
    pub color: Rgb,
    pub texture: Option<TextureId>,
    vertices: [Vertex; 4],
    normal: Vector3<f32>,
    normal_length: f32,
}

impl Wall {
    /// Creates an active, flat-shaded white wall from four vertices.
    pub fn new(id: u32, vertices: [Vertex; 4]) -> Self {
        let mut wall = Self {
            id,
            state: FaceState::ACTIVE,
            mode: ShadeMode::Flat,
            color: Rgb::WHITE,
            texture: None,
            vertices,
            normal: Vector3::zeros(),
            normal_length: 0.0,
        };
        wall.recompute_normal();
        wall
    }

    /// Creates a wall from four corner points in `v0..v3` order.
    pub fn from_corners(
        id: u32,
        a: Point3<f32>,
        b: Point3<f32>,
        c: Point3<f32>,
        d: Point3<f32>,
    ) -> Self {
        Self::new(id, [a, b, c, d].map(Vertex::new))
    }

    /// Creates a vertical wall running from `start` to `end` on the (x, z)
    /// ground plane, spanning `bottom..top` in y.
    ///
    /// Texture coordinates cover the unit square: (0,0) at `v0`, (1,1) at `v2`.
    pub fn vertical(id: u32, start: Point2<f32>, end: Point2<f32>, bottom: f32, top: f32) -> Self {
        Self::new(
            id,
            [
                Vertex::at(start.x, top, start.y).with_texcoord(0.0, 0.0),
                Vertex::at(end.x, top, end.y).with_texcoord(1.0, 0.0),
                Vertex::at(end.x, bottom, end.y).with_texcoord(1.0, 1.0),
                Vertex::at(start.x, bottom, start.y).with_texcoord(0.0, 1.0),
            ],
        )
    }

    /// Copies every non-positional attribute of `self` onto new vertices.
    ///
    /// Used when a wall is split: the fragment keeps state, shading, color
    /// and texture, and gets a fresh normal for its own vertices.
    pub(crate) fn fragment(&self, id: u32, vertices: [Vertex; 4]) -> Self {
        let mut wall = Self {
            id,
            state: self.state,
            mode: self.mode,
            color: self.color,
            texture: self.texture,
            vertices,
            normal: self.normal,
            normal_length: self.normal_length,
        };
        wall.recompute_normal();
        wall
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
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

    /// Attaches `normal` to all four vertices, enabling Gouraud shading.
    pub fn with_vertex_normals(mut self, normal: Vector3<f32>) -> Self {
        for v in &mut self.vertices {
            *v = v.with_normal(normal);
        }
        self
    }

    /// Returns the four vertices in `v0..v3` order.
    #[inline]
    pub fn vertices(&self) -> &[Vertex; 4] {
        &self.vertices
    }

    /// Unnormalized normal `(v1 - v0) x (v3 - v0)`.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    #[inline]
    pub fn normal_length(&self) -> f32 {
        self.normal_length
    }

    /// Unit normal, or `None` for a zero-area wall.
    pub fn unit_normal(&self) -> Option<Vector3<f32>> {
        if self.normal_length > AREA_EPSILON {
            Some(self.normal / self.normal_length)
        } else {
            None
        }
    }

    fn recompute_normal(&mut self) {
        let [a, b, _, d] = &self.vertices;
        let (n, len) = face_normal(&a.position, &b.position, &d.position);
        self.normal = n;
        self.normal_length = len;
    }

    /// Area of the (planar) quad.
    pub fn area(&self) -> f32 {
        let [a, b, c, d] = &self.vertices;
        0.5 * (c.position - a.position)
            .cross(&(d.position - b.position))
            .norm()
    }

    /// Applies `m` to every vertex and refreshes the normal.
    pub fn transform(&mut self, m: &Matrix4<f32>) {
        self.vertices = self.vertices.map(|v| v.transformed(m));
        self.recompute_normal();
    }

    /// Moves the wall by `offset`.
    pub fn translate(&mut self, offset: &Vector3<f32>) {
        for v in &mut self.vertices {
            v.position += offset;
        }
    }

    /// Splits the quad into its two triangles, `{v0, v1, v3}` and
    /// `{v1, v2, v3}`, both carrying the wall's attributes and id.
    pub fn to_triangles(&self) -> [Triangle; 2] {
        let [v0, v1, v2, v3] = self.vertices;
        [[v0, v1, v3], [v1, v2, v3]].map(|verts| {
            let mut tri = Triangle::new(verts)
                .with_mode(self.mode)
                .with_color(self.color)
                .with_tag(self.id);
            tri.state = self.state;
            tri.texture = self.texture;
            tri
        })
    }
}
