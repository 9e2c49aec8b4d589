//! BSP tree container, construction and traversal.

use log::debug;
use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::Result;
use crate::plane::Partition;
use crate::{Camera, Cuttable, SplitResult, Wall};

use super::node::{BspNode, NodeId};
use super::selector::{FirstWall, PartitionSelector};
use super::visitor::TriangleSink;
use super::TraversalMode;

/// A Binary Space Partitioning tree over vertical walls.
///
/// Nodes live in a flat arena and refer to their children by [`NodeId`].
/// Each node owns exactly one wall; walls that straddle a partition are
/// split during construction so every wall ends up wholly in front of or
/// behind every ancestor's plane.
///
/// The tree is read-only after [`BspTree::build`] apart from rigid
/// [`translate`](BspTree::translate)/[`transform`](BspTree::transform).
#[derive(Debug, Clone, Default)]
pub struct BspTree {
    nodes: Vec<BspNode>,
    root: Option<NodeId>,
}

/// Counters reported by a traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub nodes_visited: usize,
    pub walls_emitted: usize,
    pub triangles_emitted: usize,
}

impl BspTree {
    /// Creates an empty BSP tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a BSP tree from a flat list of walls.
    ///
    /// The `selector` picks the partition wall at every level. Walls that
    /// span a partition are cut in two and the fragments are handed whole
    /// to the recursive call on their side.
    ///
    /// Fails with `DegenerateGeometry` if a partition wall has zero area or
    /// a zero-length leading edge, or a split has no valid intersection.
    pub fn build<S: PartitionSelector>(walls: Vec<Wall>, selector: &S) -> Result<Self> {
        let input = walls.len();
        let mut tree = Self::new();
        tree.root = build_node(&mut tree.nodes, walls, selector)?;

        debug!(
            "built bsp tree: {} walls in, {} nodes, depth {}",
            input,
            tree.len(),
            tree.depth()
        );
        Ok(tree)
    }

    /// Builds a BSP tree using the default selector ([`FirstWall`]).
    pub fn from_walls(walls: Vec<Wall>) -> Result<Self> {
        Self::build(walls, &FirstWall)
    }

    /// Returns `true` if the tree contains no walls.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of nodes, which equals the number of walls after splitting.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the node behind `id`, if it belongs to this tree.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&BspNode> {
        self.nodes.get(id.0)
    }

    /// Returns the maximum depth of the tree (0 for empty tree).
    pub fn depth(&self) -> usize {
        self.subtree_depth(self.root)
    }

    fn subtree_depth(&self, id: Option<NodeId>) -> usize {
        match id.and_then(|id| self.node(id)) {
            Some(node) => {
                1 + self
                    .subtree_depth(node.front())
                    .max(self.subtree_depth(node.back()))
            }
            None => 0,
        }
    }

    /// Number of nodes in the subtree rooted at `id`.
    pub fn subtree_len(&self, id: NodeId) -> usize {
        match self.node(id) {
            Some(node) => {
                1 + node.front().map_or(0, |f| self.subtree_len(f))
                    + node.back().map_or(0, |b| self.subtree_len(b))
            }
            None => 0,
        }
    }

    /// All walls in arena order.
    pub fn walls(&self) -> impl Iterator<Item = &Wall> {
        self.nodes.iter().map(BspNode::wall)
    }

    /// Node ids in post-order: back subtree, self, front subtree.
    fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        self.collect_post_order(self.root, &mut order);
        order
    }

    fn collect_post_order(&self, id: Option<NodeId>, out: &mut Vec<NodeId>) {
        let Some((id, node)) = id.and_then(|id| Some((id, self.node(id)?))) else {
            return;
        };
        self.collect_post_order(node.back(), out);
        out.push(id);
        self.collect_post_order(node.front(), out);
    }

    /// Moves every wall by `offset`.
    pub fn translate(&mut self, offset: Vector3<f32>) {
        for id in self.post_order() {
            self.nodes[id.0].translate(&offset);
        }
    }

    /// Applies `m` to every wall, refreshing normals and planes.
    pub fn transform(&mut self, m: &Matrix4<f32>) {
        for id in self.post_order() {
            self.nodes[id.0].transform(m);
        }
    }

    /// Releases every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Emits every wall back-to-front relative to `eye`.
    ///
    /// At each node the subtree on the far side of the plane is emitted
    /// first, then the node's own wall, then the near subtree.
    pub fn traverse<T: TriangleSink>(&self, eye: Point3<f32>, sink: &mut T) -> Result<TraversalStats> {
        let mut stats = TraversalStats::default();
        self.walk(self.root, &Walk::ordered(eye), sink, &mut stats)?;
        Ok(stats)
    }

    /// Back-to-front traversal that skips walls whose front face cannot be
    /// seen by any ray of the horizontal view cone.
    pub fn traverse_skip_backfaces<T: TriangleSink>(
        &self,
        camera: &Camera,
        sink: &mut T,
    ) -> Result<TraversalStats> {
        self.traverse_with(TraversalMode::SkipBackfaces, camera, sink)
    }

    /// Like [`traverse_skip_backfaces`](Self::traverse_skip_backfaces), and
    /// also prunes the far subtree whenever the view cone cannot reach a
    /// node's plane.
    pub fn traverse_frustum_cull<T: TriangleSink>(
        &self,
        camera: &Camera,
        sink: &mut T,
    ) -> Result<TraversalStats> {
        self.traverse_with(TraversalMode::FrustumCull, camera, sink)
    }

    /// Traverses with the given mode.
    pub fn traverse_with<T: TriangleSink>(
        &self,
        mode: TraversalMode,
        camera: &Camera,
        sink: &mut T,
    ) -> Result<TraversalStats> {
        let walk = match mode {
            TraversalMode::Ordered => Walk::ordered(camera.position()),
            TraversalMode::SkipBackfaces => Walk::cone(camera, false),
            TraversalMode::FrustumCull => Walk::cone(camera, true),
        };

        let mut stats = TraversalStats::default();
        self.walk(self.root, &walk, sink, &mut stats)?;
        debug!(
            "{mode:?} traversal: {} of {} nodes visited, {} walls emitted",
            stats.nodes_visited,
            self.len(),
            stats.walls_emitted
        );
        Ok(stats)
    }

    fn walk<T: TriangleSink>(
        &self,
        id: Option<NodeId>,
        walk: &Walk,
        sink: &mut T,
        stats: &mut TraversalStats,
    ) -> Result<()> {
        let Some(node) = id.and_then(|id| self.node(id)) else {
            return Ok(());
        };
        stats.nodes_visited += 1;

        let viewer_in_front = node.plane().signed_distance(walk.eye) > 0.0;
        let (far, near) = if viewer_in_front {
            (node.back(), node.front())
        } else {
            (node.front(), node.back())
        };

        let (emit, reach_far) = match walk.cone {
            None => (true, true),
            Some(cone) => {
                let theta = cone.angle_to(node);
                let emit = theta > 90.0 - cone.half_fov;
                let reach = if viewer_in_front {
                    theta > 90.0 - cone.half_fov
                } else {
                    theta < 90.0 + cone.half_fov
                };
                (emit, reach || !cone.prune)
            }
        };

        if reach_far {
            self.walk(far, walk, sink, stats)?;
            if emit {
                emit_wall(node.wall(), sink, stats)?;
            }
        }
        self.walk(near, walk, sink, stats)
    }
}

/// Per-traversal parameters.
struct Walk {
    eye: Point3<f32>,
    cone: Option<ViewCone>,
}

#[derive(Clone, Copy)]
struct ViewCone {
    forward: Vector3<f32>,
    half_fov: f32,
    prune: bool,
}

impl Walk {
    fn ordered(eye: Point3<f32>) -> Self {
        Self { eye, cone: None }
    }

    fn cone(camera: &Camera, prune: bool) -> Self {
        Self {
            eye: camera.position(),
            cone: Some(ViewCone {
                forward: camera.forward(),
                half_fov: camera.fov() * 0.5,
                prune,
            }),
        }
    }
}

impl ViewCone {
    /// Angle in degrees between the view direction and the wall's normal.
    fn angle_to(&self, node: &BspNode) -> f32 {
        let normal = node.wall().unit_normal().unwrap_or_else(|| node.plane().normal());
        self.forward.dot(&normal).clamp(-1.0, 1.0).acos().to_degrees()
    }
}

fn emit_wall<T: TriangleSink>(wall: &Wall, sink: &mut T, stats: &mut TraversalStats) -> Result<()> {
    for tri in wall.to_triangles() {
        sink.push_triangle(tri)?;
        stats.triangles_emitted += 1;
    }
    stats.walls_emitted += 1;
    Ok(())
}

/// Recursively builds the subtree for `walls`, pushing nodes into the arena.
fn build_node<S: PartitionSelector>(
    nodes: &mut Vec<BspNode>,
    mut walls: Vec<Wall>,
    selector: &S,
) -> Result<Option<NodeId>> {
    let Some(index) = selector.select(&walls) else {
        return Ok(None);
    };
    let splitter = walls.remove(index);
    let partition = Partition::from_wall(&splitter)?;

    let mut front_list = Vec::new();
    let mut back_list = Vec::new();
    for wall in walls {
        match wall.cut(&partition)? {
            SplitResult::Front(w) => front_list.push(w),
            SplitResult::Back(w) => back_list.push(w),
            SplitResult::Spanning { front, back } => {
                front_list.push(front);
                back_list.push(back);
            }
        }
    }

    let id = NodeId(nodes.len());
    nodes.push(BspNode::new(splitter, partition.plane().clone()));

    let front = build_node(nodes, front_list, selector)?;
    let back = build_node(nodes, back_list, selector)?;
    nodes[id.0].set_children(front, back);

    Ok(Some(id))
}
