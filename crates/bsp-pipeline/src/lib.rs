//! Geometry stage of a software renderer.
//!
//! Walls are partitioned into a BSP tree once per level and walked
//! back-to-front every frame into a fixed-capacity [`PolygonBuffer`].
//! Movable [`Object`]s are appended to the same buffer, which is then run
//! through backface removal, lighting, frustum clipping, depth sorting and
//! projection before being handed to a [`Rasterizer`].
//!
//! [`Pipeline`] strings the stages together; each stage is also available
//! on its own as a [`PolygonBuffer`] method.

pub mod bsp;
mod camera;
mod clip;
mod color;
pub mod config;
mod cuttable;
mod error;
mod light;
mod lighting;
mod object;
mod pipeline;
mod plane;
mod raster;
mod render_list;
mod sort;
mod transform;
mod triangle;
mod vertex;
mod wall;

pub use camera::Camera;
pub use clip::{clip_near, clip_polys, ClipPlanes, ClipStats, NearClip};
pub use color::Rgb;
pub use cuttable::{Cuttable, SplitResult};
pub use error::{RenderError, Result};
pub use light::{Light, LightKind, Lights, MAX_LIGHTS};
pub use lighting::{light_triangle, shade_point, LightSpace};
pub use object::{Object, ObjectPoly, ObjectState};
pub use pipeline::{FrameStats, Pipeline, Scene};
pub use plane::{Partition, Plane3D, WallSide, PLANE_EPSILON};
pub use raster::{FrameTarget, Rasterizer, SoftRasterizer, ZBuffer};
pub use render_list::{PolygonBuffer, VertexSource, DEFAULT_CAPACITY};
pub use sort::{sort_order, SortMode};
pub use transform::TransformMode;
pub use triangle::{FaceState, ShadeMode, TextureId, Triangle, AREA_EPSILON};
pub use vertex::{Vertex, VertexAttrs};
pub use wall::{Wall, WALL_SPLIT_ID};
