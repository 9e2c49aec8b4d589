//! Sinks that receive the triangles emitted during BSP traversal.
//!
//! Traversal is decoupled from what happens to its output: the render list
//! implements [`TriangleSink`], tests collect into a vector.

use crate::error::Result;
use crate::Triangle;

/// Receives triangles in traversal order.
pub trait TriangleSink {
    /// Accepts one triangle. An error aborts the traversal.
    fn push_triangle(&mut self, triangle: Triangle) -> Result<()>;
}

/// A sink that collects every triangle it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    collected: Vec<Triangle>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.collected
    }

    pub fn into_triangles(self) -> Vec<Triangle> {
        self.collected
    }

    /// Wall tags in emission order, one per triangle.
    pub fn tags(&self) -> Vec<u32> {
        self.collected.iter().map(|t| t.tag).collect()
    }
}

impl TriangleSink for CollectingSink {
    fn push_triangle(&mut self, triangle: Triangle) -> Result<()> {
        self.collected.push(triangle);
        Ok(())
    }
}
