//! Movable scene objects: indexed meshes that are fed into the render list
//! alongside the BSP level.

use bitflags::bitflags;
use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::{RenderError, Result};
use crate::triangle::face_normal;
use crate::{Camera, ClipPlanes, FaceState, Rgb, ShadeMode, TextureId, TransformMode, Vertex};

bitflags! {
    /// Per-object state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectState: u8 {
        const ACTIVE  = 0x01;
        const VISIBLE = 0x02;
        /// Set by [`Object::cull`] for the current frame.
        const CULLED  = 0x04;
    }
}

/// A face of an [`Object`], referring to its vertices by index.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPoly {
    pub state: FaceState,
    pub mode: ShadeMode,
    pub color: Rgb,
    pub texture: Option<TextureId>,
    pub indices: [usize; 3],
}

impl ObjectPoly {
    pub fn new(indices: [usize; 3]) -> Self {
        Self {
            state: FaceState::ACTIVE,
            mode: ShadeMode::Flat,
            color: Rgb::WHITE,
            texture: None,
            indices,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_mode(mut self, mode: ShadeMode) -> Self {
        self.mode = mode;
        self
    }
}

/// An indexed triangle mesh with a model-space rest pose (`local`) and a
/// working copy (`trans`).
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub id: u32,
    pub name: String,
    pub state: ObjectState,
    pub world_pos: Point3<f32>,
    local: Vec<Vertex>,
    trans: Vec<Vertex>,
    polys: Vec<ObjectPoly>,
    /// Bounding sphere radius around the model origin.
    radius: f32,
}

impl Object {
    /// Creates an active, visible object.
    ///
    /// Fails with `DegenerateGeometry` if a polygon refers to a vertex that
    /// does not exist.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        polys: Vec<ObjectPoly>,
    ) -> Result<Self> {
        let count = vertices.len();
        if polys.iter().flat_map(|p| p.indices).any(|i| i >= count) {
            return Err(RenderError::DegenerateGeometry(
                "object polygon refers to a missing vertex",
            ));
        }

        let radius = vertices
            .iter()
            .map(|v| v.position.coords.norm())
            .fold(0.0, f32::max);

        Ok(Self {
            id,
            name: name.into(),
            state: ObjectState::ACTIVE | ObjectState::VISIBLE,
            world_pos: Point3::origin(),
            trans: vertices.clone(),
            local: vertices,
            polys,
            radius,
        })
    }

    /// An axis-aligned cube of edge `size` centered on the model origin,
    /// faces wound to point outward.
    pub fn cube(id: u32, name: impl Into<String>, size: f32, color: Rgb) -> Self {
        let h = 0.5 * size;
        let vertices = [
            [-h, -h, -h],
            [h, -h, -h],
            [h, h, -h],
            [-h, h, -h],
            [-h, -h, h],
            [h, -h, h],
            [h, h, h],
            [-h, h, h],
        ]
        .into_iter()
        .map(|[x, y, z]| Vertex::at(x, y, z))
        .collect::<Vec<_>>();

        // Each quad is listed clockwise as seen from outside
        let quads = [
            [3, 2, 1, 0],
            [6, 7, 4, 5],
            [7, 3, 0, 4],
            [2, 6, 5, 1],
            [7, 6, 2, 3],
            [0, 1, 5, 4],
        ];
        let polys = quads
            .iter()
            .flat_map(|&[a, b, c, d]| [[a, b, d], [b, c, d]])
            .map(|indices| ObjectPoly::new(indices).with_color(color))
            .collect();

        Self {
            id,
            name: name.into(),
            state: ObjectState::ACTIVE | ObjectState::VISIBLE,
            world_pos: Point3::origin(),
            trans: vertices.clone(),
            local: vertices,
            polys,
            radius: h * 3f32.sqrt(),
        }
    }

    pub fn at(mut self, world_pos: Point3<f32>) -> Self {
        self.world_pos = world_pos;
        self
    }

    #[inline]
    pub fn local(&self) -> &[Vertex] {
        &self.local
    }

    #[inline]
    pub fn trans(&self) -> &[Vertex] {
        &self.trans
    }

    #[inline]
    pub fn polys(&self) -> &[ObjectPoly] {
        &self.polys
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// True if the object should go into the render list this frame.
    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.state.contains(ObjectState::ACTIVE | ObjectState::VISIBLE)
            && !self.state.contains(ObjectState::CULLED)
    }

    /// Switches every face to `mode`.
    pub fn set_shade_mode(&mut self, mode: ShadeMode) {
        for poly in &mut self.polys {
            poly.mode = mode;
        }
    }

    /// Clears the per-frame state of the object and its polygons.
    pub fn reset(&mut self) {
        self.state.remove(ObjectState::CULLED);
        for poly in &mut self.polys {
            poly.state.remove(FaceState::PER_FRAME);
        }
    }

    /// Applies `m` to the vertex lists selected by `mode`.
    ///
    /// Transforming `local` in place changes the rest pose, so the bounding
    /// radius is refreshed.
    pub fn transform(&mut self, m: &Matrix4<f32>, mode: TransformMode) {
        mode.apply_to_vertices(m, &mut self.local, &mut self.trans);
        if mode == TransformMode::LocalInPlace {
            self.radius = self
                .local
                .iter()
                .map(|v| v.position.coords.norm())
                .fold(0.0, f32::max);
        }
    }

    /// Moves the model into world space at `world_pos`.
    pub fn model_to_world(&mut self, mode: TransformMode) {
        let m = Matrix4::new_translation(&self.world_pos.coords);
        self.transform(&m, mode);
    }

    /// Averages the face normals around each vertex and stores the result
    /// on both vertex lists, enabling Gouraud shading.
    pub fn compute_vertex_normals(&mut self) {
        let mut sums = vec![Vector3::zeros(); self.local.len()];
        for poly in &self.polys {
            let [a, b, c] = poly.indices.map(|i| self.local[i].position);
            let (n, len) = face_normal(&a, &b, &c);
            if len > 0.0 {
                for i in poly.indices {
                    sums[i] += n / len;
                }
            }
        }

        for (i, sum) in sums.into_iter().enumerate() {
            if sum.norm() > 0.0 {
                self.local[i] = self.local[i].with_normal(sum);
                let normal = self.local[i].normal;
                self.trans[i] = self.trans[i].with_normal(normal);
            }
        }
    }

    /// Tests the bounding sphere against the camera frustum, marking the
    /// object CULLED when it lies wholly outside one of the `planes`.
    pub fn cull(&mut self, camera: &Camera, planes: ClipPlanes) -> bool {
        let c = camera.to_camera(&self.world_pos);
        let r = self.radius;

        let outside_z = planes.contains(ClipPlanes::Z)
            && (c.z - r > camera.far_z() || c.z + r < camera.near_z());
        let outside_x = planes.contains(ClipPlanes::X) && {
            let limit = camera.x_slope() * c.z;
            c.x - r > limit || c.x + r < -limit
        };
        let outside_y = planes.contains(ClipPlanes::Y) && {
            let limit = camera.y_slope() * c.z;
            c.y - r > limit || c.y + r < -limit
        };

        let culled = outside_z || outside_x || outside_y;
        if culled {
            self.state |= ObjectState::CULLED;
        }
        culled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit quad in the z = 0 plane, two triangles facing -z.
    fn quad() -> Object {
        let vertices = vec![
            Vertex::at(-0.5, 0.5, 0.0),
            Vertex::at(0.5, 0.5, 0.0),
            Vertex::at(0.5, -0.5, 0.0),
            Vertex::at(-0.5, -0.5, 0.0),
        ];
        let polys = vec![ObjectPoly::new([0, 1, 3]), ObjectPoly::new([1, 2, 3])];
        Object::new(1, "quad", vertices, polys).unwrap()
    }

    fn camera() -> Camera {
        Camera::look_at(
            Point3::new(0.0, 0.0, -10.0),
            Point3::origin(),
            90.0,
            1.0,
            100.0,
            (400, 400),
        )
    }

    #[test]
    fn bad_index_is_rejected() {
        let result = Object::new(1, "bad", vec![Vertex::default()], vec![ObjectPoly::new([0, 0, 1])]);
        assert!(matches!(result, Err(RenderError::DegenerateGeometry(_))));
    }

    #[test]
    fn radius_covers_vertices() {
        assert!((quad().radius() - 0.5f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn model_to_world_keeps_rest_pose() {
        let mut obj = quad().at(Point3::new(0.0, 0.0, 5.0));
        obj.model_to_world(TransformMode::LocalToTrans);
        obj.model_to_world(TransformMode::LocalToTrans);
        assert_eq!(obj.trans()[0].position, Point3::new(-0.5, 0.5, 5.0));
        assert_eq!(obj.local()[0].position, Point3::new(-0.5, 0.5, 0.0));
    }

    #[test]
    fn vertex_normals_average_faces() {
        let mut obj = quad();
        obj.compute_vertex_normals();
        for v in obj.local().iter().chain(obj.trans()) {
            assert!(v.has_normal());
            assert!((v.normal.z + 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn cull_against_frustum() {
        let cam = camera();

        let mut visible = quad();
        assert!(!visible.cull(&cam, ClipPlanes::all()));
        assert!(visible.is_drawable());

        let mut behind = quad().at(Point3::new(0.0, 0.0, -20.0));
        assert!(behind.cull(&cam, ClipPlanes::Z));
        assert!(!behind.is_drawable());

        let mut aside = quad().at(Point3::new(50.0, 0.0, 0.0));
        assert!(!aside.cull(&cam, ClipPlanes::Z));
        assert!(aside.cull(&cam, ClipPlanes::X));

        behind.reset();
        assert!(behind.is_drawable());
    }

    #[test]
    fn cube_faces_point_outward() {
        let cube = Object::cube(2, "cube", 2.0, Rgb::WHITE);
        assert_eq!(cube.polys().len(), 12);
        assert!((cube.radius() - 3f32.sqrt()).abs() < 1e-6);

        for poly in cube.polys() {
            let [a, b, c] = poly.indices.map(|i| cube.local()[i].position);
            let (n, _) = face_normal(&a, &b, &c);
            let center = (a.coords + b.coords + c.coords) / 3.0;
            assert!(n.dot(&center) > 0.0);
        }
    }

    #[test]
    fn reset_clears_face_flags() {
        let mut obj = quad();
        obj.polys[0].state |= FaceState::BACKFACE | FaceState::LIT;
        obj.reset();
        assert_eq!(obj.polys()[0].state, FaceState::ACTIVE);
    }
}
