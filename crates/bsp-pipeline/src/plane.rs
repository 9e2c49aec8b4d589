//! Plane representation and the partition planes used by the BSP builder.

use nalgebra::{Point2, Point3, Vector2, Vector3};

use crate::error::{RenderError, Result};
use crate::Wall;

/// Default epsilon for plane classification.
/// Points within this distance of the plane are considered "on" the plane.
pub const PLANE_EPSILON: f32 = 1e-4;

/// A plane in 3D space, represented as `normal · point = offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane3D {
    normal: Vector3<f32>,
    offset: f32,
}

impl Plane3D {
    /// Creates a plane from a point on the plane and a normal vector.
    /// The normal is normalized; returns `None` if it has zero length.
    pub fn from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Option<Self> {
        let unit_normal = normal.try_normalize(f32::EPSILON)?;
        Some(Self {
            normal: unit_normal,
            offset: unit_normal.dot(&point.coords),
        })
    }

    /// The plane a wall lies on, anchored at its `v0`.
    pub fn from_wall(wall: &Wall) -> Result<Self> {
        Self::from_point_and_normal(wall.vertices()[0].position, wall.normal())
            .ok_or(RenderError::DegenerateGeometry("wall has zero area"))
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Signed distance from a point to the plane.
    /// - Positive: point is in front (same side as normal)
    /// - Negative: point is behind
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }
}

/// Where a wall ends up relative to a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallSide {
    Front,
    Back,
    Spanning,
}

/// A BSP partition: the plane of a wall together with its leading edge
/// projected onto the (x, z) ground plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    plane: Plane3D,
    origin: Point2<f32>,
    direction: Vector2<f32>,
}

impl Partition {
    /// Builds the partition defined by `wall`.
    ///
    /// Fails with `DegenerateGeometry` if the wall has zero area or its
    /// leading edge has zero length on the ground plane.
    pub fn from_wall(wall: &Wall) -> Result<Self> {
        let plane = Plane3D::from_wall(wall)?;
        let [v0, v1, ..] = wall.vertices();
        let origin = ground(&v0.position);
        let direction = ground(&v1.position) - origin;
        if direction.norm() <= PLANE_EPSILON {
            return Err(RenderError::DegenerateGeometry(
                "partition wall has a zero-length leading edge",
            ));
        }
        Ok(Self {
            plane,
            origin,
            direction,
        })
    }

    #[inline]
    pub fn plane(&self) -> &Plane3D {
        &self.plane
    }

    /// Signed distances of `wall`'s two leading vertices to the plane.
    ///
    /// A vertex lying on the plane (e.g. an endpoint shared with the
    /// partition wall) takes the sign of the other vertex, so only the other
    /// endpoint decides the side. If both lie on the plane the wall counts
    /// as front.
    pub fn leading_distances(&self, wall: &Wall) -> (f32, f32) {
        let [v0, v1, ..] = wall.vertices();
        let d0 = self.plane.signed_distance(v0.position);
        let d1 = self.plane.signed_distance(v1.position);
        let on0 = d0.abs() <= PLANE_EPSILON;
        let on1 = d1.abs() <= PLANE_EPSILON;

        match (on0, on1) {
            (true, true) => (0.0, 0.0),
            (true, false) => (d1, d1),
            (false, true) => (d0, d0),
            (false, false) => (d0, d1),
        }
    }

    /// Classifies a wall against the partition.
    pub fn classify(&self, wall: &Wall) -> WallSide {
        match self.leading_distances(wall) {
            (d0, d1) if d0 >= 0.0 && d1 >= 0.0 => WallSide::Front,
            (d0, d1) if d0 < 0.0 && d1 < 0.0 => WallSide::Back,
            _ => WallSide::Spanning,
        }
    }

    /// Parameter `t` along `wall`'s leading edge where it crosses the
    /// partition line, computed on the (x, z) ground plane.
    ///
    /// Fails if the lines are parallel or the result is not finite.
    pub fn intersect_leading_edge(&self, wall: &Wall) -> Result<f32> {
        let [v0, v1, ..] = wall.vertices();
        let p = ground(&v0.position);
        let r = ground(&v1.position) - p;
        let denom = cross2(&r, &self.direction);
        if denom.abs() <= f32::EPSILON * r.norm() * self.direction.norm() {
            return Err(RenderError::DegenerateGeometry(
                "wall is parallel to the partition line",
            ));
        }

        let t = cross2(&(self.origin - p), &self.direction) / denom;
        if !t.is_finite() {
            return Err(RenderError::DegenerateGeometry(
                "partition intersection is not finite",
            ));
        }
        Ok(t.clamp(0.0, 1.0))
    }
}

/// Projects a point onto the (x, z) ground plane.
#[inline]
fn ground(p: &Point3<f32>) -> Point2<f32> {
    Point2::new(p.x, p.z)
}

#[inline]
fn cross2(a: &Vector2<f32>, b: &Vector2<f32>) -> f32 {
    a.x * b.y - a.y * b.x
}
