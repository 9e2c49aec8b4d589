//! Binary Space Partitioning tree over static level walls.
//!
//! The tree recursively partitions the level using the planes of its own
//! walls. Because every wall is vertical, partitioning happens on the
//! (x, z) ground plane and each node owns exactly one wall.
//!
//! # Example
//!
//! ```ignore
//! use bsp_pipeline::bsp::{BspTree, CollectingSink, TraversalMode};
//!
//! let tree = BspTree::from_walls(walls)?;
//!
//! // Back-to-front for the painter's algorithm
//! let mut sink = CollectingSink::new();
//! tree.traverse_with(TraversalMode::FrustumCull, &camera, &mut sink)?;
//! let triangles = sink.into_triangles();
//! ```
//!
//! # Architecture
//!
//! - [`BspTree`]: arena of nodes plus the root index
//! - [`BspNode`]: one partition wall, its plane and two child indices
//! - [`PartitionSelector`]: strategy trait for choosing partition walls
//! - [`TriangleSink`]: receiver of the emitted triangles

use serde::Deserialize;

mod node;
mod selector;
mod tree;
mod visitor;

pub use node::{BspNode, NodeId};
pub use selector::{FewestSplits, FirstWall, PartitionSelector};
pub use tree::{BspTree, TraversalStats};
pub use visitor::{CollectingSink, TriangleSink};

/// Which walls a traversal emits and which subtrees it enters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    /// Every wall, back-to-front.
    Ordered,
    /// Every node is visited; walls facing away from the view cone are
    /// not emitted.
    SkipBackfaces,
    /// As `SkipBackfaces`, and subtrees the view cone cannot reach are not
    /// visited.
    #[default]
    FrustumCull,
}
