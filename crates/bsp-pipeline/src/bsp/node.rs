//! BSP tree node implementation.

use std::fmt;

use log::warn;
use nalgebra::{Matrix4, Vector3};

use crate::{Plane3D, Wall};

/// Index of a node inside a [`BspTree`](super::BspTree) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node in the BSP tree.
///
/// Each node owns the wall whose plane partitions its subtree. Walls in
/// front of that plane live in the `front` subtree, walls behind it in the
/// `back` subtree. Children are arena indices; every index has exactly one
/// parent.
#[derive(Debug, Clone, PartialEq)]
pub struct BspNode {
    wall: Wall,

    /// The plane of `wall`, kept in sync by [`BspNode::transform`].
    plane: Plane3D,

    front: Option<NodeId>,
    back: Option<NodeId>,
}

impl BspNode {
    pub(crate) fn new(wall: Wall, plane: Plane3D) -> Self {
        Self {
            wall,
            plane,
            front: None,
            back: None,
        }
    }

    /// Returns the partition wall stored at this node.
    #[inline]
    pub fn wall(&self) -> &Wall {
        &self.wall
    }

    /// Returns a reference to the splitting plane.
    #[inline]
    pub fn plane(&self) -> &Plane3D {
        &self.plane
    }

    /// Subtree in FRONT of the splitting plane.
    #[inline]
    pub fn front(&self) -> Option<NodeId> {
        self.front
    }

    /// Subtree BEHIND the splitting plane.
    #[inline]
    pub fn back(&self) -> Option<NodeId> {
        self.back
    }

    #[inline]
    pub(crate) fn set_children(&mut self, front: Option<NodeId>, back: Option<NodeId>) {
        self.front = front;
        self.back = back;
    }

    /// Checks if this node has any children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }

    /// Applies `m` to the wall and refreshes the plane.
    ///
    /// A transform that collapses the wall keeps the previous plane so the
    /// tree stays traversable.
    pub(crate) fn transform(&mut self, m: &Matrix4<f32>) {
        self.wall.transform(m);
        self.refresh_plane();
    }

    pub(crate) fn translate(&mut self, offset: &Vector3<f32>) {
        self.wall.translate(offset);
        self.refresh_plane();
    }

    fn refresh_plane(&mut self) {
        match Plane3D::from_wall(&self.wall) {
            Ok(plane) => self.plane = plane,
            Err(err) => warn!("wall {} keeps its old plane: {err}", self.wall.id),
        }
    }
}
