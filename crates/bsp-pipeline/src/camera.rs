//! Viewer description consumed by traversal, culling, clipping and projection.

use nalgebra::{Matrix4, Point3, Vector3};

/// A perspective camera looking down its own +z axis (left-handed camera
/// space: x right, y up, z forward).
///
/// The view plane is 2 units wide and `2 / aspect_ratio` units high; the
/// view distance is chosen so that the plane spans the horizontal field of
/// view. Treated as an immutable value for the duration of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Point3<f32>,
    forward: Vector3<f32>,
    world_to_camera: Matrix4<f32>,
    near_z: f32,
    far_z: f32,
    /// Horizontal field of view in degrees.
    fov: f32,
    view_dist: f32,
    viewplane_width: f32,
    viewplane_height: f32,
    viewport_width: f32,
    viewport_height: f32,
    aspect_ratio: f32,
}

impl Camera {
    /// Creates a camera at `position` looking at `target`.
    ///
    /// `fov` is the horizontal field of view in degrees.
    pub fn look_at(
        position: Point3<f32>,
        target: Point3<f32>,
        fov: f32,
        near_z: f32,
        far_z: f32,
        viewport: (u32, u32),
    ) -> Self {
        let forward = (target - position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);
        Self::looking(position, forward, fov, near_z, far_z, viewport)
    }

    /// Creates a camera at `position` looking along `direction`.
    pub fn looking(
        position: Point3<f32>,
        direction: Vector3<f32>,
        fov: f32,
        near_z: f32,
        far_z: f32,
        (width, height): (u32, u32),
    ) -> Self {
        let forward = direction
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::z);
        // Looking straight up or down leaves y unusable as the up hint
        let up = if forward.y.abs() > 0.999 {
            Vector3::z()
        } else {
            Vector3::y()
        };
        let world_to_camera = Matrix4::look_at_lh(&position, &(position + forward), &up);

        let viewport_width = width.max(1) as f32;
        let viewport_height = height.max(1) as f32;
        let aspect_ratio = viewport_width / viewport_height;
        let viewplane_width = 2.0;
        let view_dist = 0.5 * viewplane_width / (fov.to_radians() * 0.5).tan();

        Self {
            position,
            forward,
            world_to_camera,
            near_z,
            far_z,
            fov,
            view_dist,
            viewplane_width,
            viewplane_height: 2.0 / aspect_ratio,
            viewport_width,
            viewport_height,
            aspect_ratio,
        }
    }

    #[inline]
    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    /// Unit viewing direction in world space.
    #[inline]
    pub fn forward(&self) -> Vector3<f32> {
        self.forward
    }

    #[inline]
    pub fn world_to_camera(&self) -> &Matrix4<f32> {
        &self.world_to_camera
    }

    #[inline]
    pub fn near_z(&self) -> f32 {
        self.near_z
    }

    #[inline]
    pub fn far_z(&self) -> f32 {
        self.far_z
    }

    /// Horizontal field of view in degrees.
    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    #[inline]
    pub fn view_dist(&self) -> f32 {
        self.view_dist
    }

    #[inline]
    pub fn viewplane_width(&self) -> f32 {
        self.viewplane_width
    }

    #[inline]
    pub fn viewplane_height(&self) -> f32 {
        self.viewplane_height
    }

    #[inline]
    pub fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    #[inline]
    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Slope of the left/right frustum planes: a camera-space point is
    /// inside horizontally when `|x| <= x_slope() * z`.
    #[inline]
    pub fn x_slope(&self) -> f32 {
        0.5 * self.viewplane_width / self.view_dist
    }

    /// Slope of the top/bottom frustum planes.
    #[inline]
    pub fn y_slope(&self) -> f32 {
        0.5 * self.viewplane_height / self.view_dist
    }

    /// Transforms a world-space point into camera space.
    #[inline]
    pub fn to_camera(&self, p: &Point3<f32>) -> Point3<f32> {
        self.world_to_camera.transform_point(p)
    }
}
