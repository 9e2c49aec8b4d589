//! Vertex representation shared by walls, triangles and scene objects.

use bitflags::bitflags;
use nalgebra::{Matrix4, Point2, Point3, Vector3};

bitflags! {
    /// Which attributes of a [`Vertex`] carry meaningful data.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VertexAttrs: u8 {
        const POINT   = 0x01;
        const NORMAL  = 0x02;
        const TEXTURE = 0x04;
    }
}

/// A single vertex. Positions are homogeneous points with an implicit `w = 1`.
///
/// Vertices are plain values: once a triangle is formed it owns copies of
/// its three vertices and nothing is shared between faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    /// Unit vertex normal, valid when `attrs` contains `NORMAL`.
    pub normal: Vector3<f32>,
    /// Texture coordinate, valid when `attrs` contains `TEXTURE`.
    pub texcoord: Point2<f32>,
    pub attrs: VertexAttrs,
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}

impl Vertex {
    /// Creates a position-only vertex.
    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position,
            normal: Vector3::zeros(),
            texcoord: Point2::origin(),
            attrs: VertexAttrs::POINT,
        }
    }

    /// Shorthand for `Vertex::new(Point3::new(x, y, z))`.
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Attaches a normal (normalized here) and sets the `NORMAL` attribute.
    pub fn with_normal(mut self, normal: Vector3<f32>) -> Self {
        self.normal = normal.try_normalize(f32::EPSILON).unwrap_or(normal);
        self.attrs |= VertexAttrs::NORMAL;
        self
    }

    /// Attaches a texture coordinate and sets the `TEXTURE` attribute.
    pub fn with_texcoord(mut self, u: f32, v: f32) -> Self {
        self.texcoord = Point2::new(u, v);
        self.attrs |= VertexAttrs::TEXTURE;
        self
    }

    #[inline]
    pub fn has_normal(&self) -> bool {
        self.attrs.contains(VertexAttrs::NORMAL)
    }

    #[inline]
    pub fn has_texture(&self) -> bool {
        self.attrs.contains(VertexAttrs::TEXTURE)
    }

    /// Returns this vertex with the matrix applied to its position and,
    /// when present, its normal.
    pub fn transformed(&self, m: &Matrix4<f32>) -> Self {
        let mut out = *self;
        out.position = m.transform_point(&self.position);
        if self.has_normal() {
            let n = m.transform_vector(&self.normal);
            out.normal = n.try_normalize(f32::EPSILON).unwrap_or(n);
        }
        out
    }

    /// Linear interpolation towards `other` at parameter `t`.
    ///
    /// Positions and texture coordinates interpolate linearly; normals are
    /// interpolated and renormalized. Attributes are the intersection of both
    /// inputs.
    pub fn lerp(&self, other: &Vertex, t: f32) -> Self {
        let attrs = self.attrs & other.attrs;
        let mut normal = self.normal + (other.normal - self.normal) * t;
        if attrs.contains(VertexAttrs::NORMAL) {
            normal = normal.try_normalize(f32::EPSILON).unwrap_or(self.normal);
        }
        Self {
            position: self.position + (other.position - self.position) * t,
            normal,
            texcoord: self.texcoord + (other.texcoord - self.texcoord) * t,
            attrs,
        }
    }

    /// True if every coordinate of the position is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite())
    }
}
