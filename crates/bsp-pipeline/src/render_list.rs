//! The per-frame render list.

use log::warn;
use nalgebra::{Matrix4, Point3};

use crate::bsp::TriangleSink;
use crate::clip::{clip_polys, ClipPlanes, ClipStats};
use crate::error::{RenderError, Result};
use crate::lighting::{light_triangle, LightSpace};
use crate::raster::Rasterizer;
use crate::sort::{sort_order, SortMode};
use crate::{Camera, FaceState, Lights, Object, TransformMode, Triangle, Wall};

/// Default number of triangle slots.
pub const DEFAULT_CAPACITY: usize = 32_768;

/// Which vertex list of an [`Object`] is copied into the render list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VertexSource {
    Local,
    #[default]
    Trans,
}

/// A fixed-capacity list of triangles plus the order they are drawn in.
///
/// Storage is allocated once and reused across frames: [`reset`] only
/// forgets the live triangles. Stages run over the buffer in place; the
/// sorter permutes the order array and never moves triangles.
///
/// [`reset`]: PolygonBuffer::reset
#[derive(Debug, Clone)]
pub struct PolygonBuffer {
    polys: Vec<Triangle>,
    order: Vec<usize>,
    capacity: usize,
}

impl Default for PolygonBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PolygonBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            polys: Vec::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live triangles.
    #[inline]
    pub fn len(&self) -> usize {
        self.polys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.polys.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Triangle> {
        self.polys.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Triangle> {
        self.polys.get_mut(index)
    }

    /// Indices into the buffer in draw order.
    #[inline]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// All live triangles in draw order.
    pub fn iter(&self) -> impl Iterator<Item = &Triangle> {
        self.order.iter().filter_map(|&i| self.polys.get(i))
    }

    /// Renderable triangles in draw order.
    pub fn visible(&self) -> impl Iterator<Item = &Triangle> {
        self.iter().filter(|t| t.is_renderable())
    }

    /// Forgets every triangle, keeping the storage.
    pub fn reset(&mut self) {
        self.polys.clear();
        self.order.clear();
    }

    /// Copies `triangle` into the next free slot.
    ///
    /// Fails with `CapacityExceeded`, leaving the buffer untouched, when it
    /// is full.
    pub fn insert(&mut self, triangle: Triangle) -> Result<()> {
        self.reserve(1)?;
        self.order.push(self.polys.len());
        self.polys.push(triangle);
        Ok(())
    }

    fn reserve(&self, count: usize) -> Result<()> {
        if self.polys.len() + count > self.capacity {
            Err(RenderError::CapacityExceeded {
                capacity: self.capacity,
            })
        } else {
            Ok(())
        }
    }

    /// Inserts both triangles of `wall`, or neither if only one would fit.
    pub fn insert_wall(&mut self, wall: &Wall) -> Result<()> {
        self.reserve(2)?;
        for tri in wall.to_triangles() {
            self.insert(tri)?;
        }
        Ok(())
    }

    /// Inserts the drawable faces of `object`, returning how many were added.
    ///
    /// Objects that are inactive, invisible or culled are skipped, as are
    /// faces that are inactive, clipped or back-facing. The chosen vertex
    /// list is copied into both lists of each new triangle.
    pub fn insert_object(&mut self, object: &Object, source: VertexSource) -> Result<usize> {
        if !object.is_drawable() {
            return Ok(0);
        }
        let vertices = match source {
            VertexSource::Local => object.local(),
            VertexSource::Trans => object.trans(),
        };

        let mut inserted = 0;
        for poly in object.polys() {
            if !poly.state.contains(FaceState::ACTIVE)
                || poly.state.intersects(FaceState::CLIPPED | FaceState::BACKFACE)
            {
                continue;
            }

            let mut tri = Triangle::new(poly.indices.map(|i| vertices[i]))
                .with_mode(poly.mode)
                .with_color(poly.color)
                .with_tag(object.id);
            tri.state = poly.state;
            tri.texture = poly.texture;
            self.insert(tri)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Triangles that later stages still care about.
    fn renderable_mut(&mut self) -> impl Iterator<Item = &mut Triangle> {
        self.polys.iter_mut().filter(|t| t.is_renderable())
    }

    /// Applies `m` to every renderable triangle, choosing the source and
    /// destination vertex lists by `mode`.
    pub fn transform(&mut self, m: &Matrix4<f32>, mode: TransformMode) {
        for tri in self.renderable_mut() {
            mode.apply_to_vertices(m, &mut tri.local, &mut tri.trans);
            if mode.writes_trans() {
                tri.recompute_normal();
            }
        }
    }

    /// Moves model-space triangles to `world_pos`.
    pub fn model_to_world(&mut self, world_pos: Point3<f32>, mode: TransformMode) {
        self.transform(&Matrix4::new_translation(&world_pos.coords), mode);
    }

    /// Transforms the working vertices from world into camera space.
    pub fn world_to_camera(&mut self, camera: &Camera) {
        self.transform(camera.world_to_camera(), TransformMode::TransInPlace);
    }

    /// Marks triangles facing away from the camera as BACKFACE. Works on
    /// world-space vertices. Returns how many were marked.
    pub fn remove_backfaces(&mut self, camera: &Camera) -> usize {
        let eye = camera.position();
        let mut removed = 0;
        for tri in self.renderable_mut() {
            let view = eye - tri.trans[0].position;
            if tri.normal().dot(&view) <= 0.0 {
                tri.state |= FaceState::BACKFACE;
                removed += 1;
            }
        }
        removed
    }

    /// Lights every renderable, not yet lit triangle. Returns how many were lit.
    pub fn light(&mut self, lights: &Lights, space: LightSpace) -> usize {
        self.polys
            .iter_mut()
            .map(|tri| light_triangle(tri, lights, space))
            .filter(|&lit| lit)
            .count()
    }

    /// Lights world-space triangles with the lights' world-space values.
    pub fn light_world(&mut self, lights: &Lights) -> usize {
        self.light(lights, LightSpace::World)
    }

    /// Lights camera-space triangles with the lights' transformed values.
    pub fn light_camera(&mut self, lights: &Lights) -> usize {
        self.light(lights, LightSpace::Camera)
    }

    /// Clips camera-space triangles against the view frustum.
    ///
    /// See [`clip_polys`] for error semantics.
    pub fn clip_polys(&mut self, camera: &Camera, planes: ClipPlanes) -> (ClipStats, Result<()>) {
        clip_polys(self, camera, planes)
    }

    /// Sorts the draw order by depth, farthest first.
    pub fn sort(&mut self, mode: SortMode) {
        sort_order(&mut self.order, &self.polys, mode);
    }

    /// Projects camera-space vertices onto the view plane.
    ///
    /// x ends up in `[-1, 1]` across the field of view and y is scaled by
    /// the aspect ratio to the same range; z is kept for depth. Triangles
    /// with a vertex at or behind the eye are marked CLIPPED.
    pub fn camera_to_perspective(&mut self, camera: &Camera) {
        let d = camera.view_dist();
        let aspect = camera.aspect_ratio();

        for tri in self.renderable_mut() {
            if tri.trans.iter().any(|v| v.position.z <= 0.0) {
                warn!("triangle {} reached projection behind the eye", tri.tag);
                tri.state |= FaceState::CLIPPED;
                continue;
            }
            for v in &mut tri.trans {
                let z = v.position.z;
                v.position.x = d * v.position.x / z;
                v.position.y = d * v.position.y * aspect / z;
            }
            tri.recompute_normal();
        }
    }

    /// Maps perspective coordinates to pixel coordinates, y pointing down.
    pub fn perspective_to_screen(&mut self, camera: &Camera) {
        let alpha = 0.5 * camera.viewport_width() - 0.5;
        let beta = 0.5 * camera.viewport_height() - 0.5;

        for tri in self.renderable_mut() {
            for v in &mut tri.trans {
                v.position.x = alpha + alpha * v.position.x;
                v.position.y = beta - beta * v.position.y;
            }
            tri.recompute_normal();
        }
    }

    /// Hands the visible triangles to `rasterizer` in draw order.
    pub fn render<R: Rasterizer>(&self, rasterizer: &mut R, target: &mut R::Target) -> usize {
        rasterizer.draw_list(self.visible(), target)
    }
}

impl TriangleSink for PolygonBuffer {
    fn push_triangle(&mut self, triangle: Triangle) -> Result<()> {
        self.insert(triangle)
    }
}
