//! Source/destination selection for transforms over local and trans data.
//!
//! Triangles, scene objects and lights each keep a "local" copy of their
//! geometry (the rest pose) and a "trans" copy (the working copy the
//! pipeline mutates). A [`TransformMode`] picks which one is read and which
//! one is written, so repeated transforms can either accumulate
//! (`TransInPlace`) or restart from the rest pose (`LocalToTrans`).

use nalgebra::Matrix4;
use serde::Deserialize;

use crate::Vertex;

/// Which copy a transform reads from and writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    /// Read local, write local.
    LocalInPlace,
    /// Read trans, write trans.
    TransInPlace,
    /// Read local, write trans.
    #[default]
    LocalToTrans,
}

impl TransformMode {
    /// Applies `f` to the selected source and stores the result in the
    /// selected destination.
    #[inline]
    pub fn apply_with<T: Copy>(self, local: &mut T, trans: &mut T, f: impl FnOnce(&T) -> T) {
        match self {
            TransformMode::LocalInPlace => *local = f(local),
            TransformMode::TransInPlace => *trans = f(trans),
            TransformMode::LocalToTrans => *trans = f(local),
        }
    }

    /// Returns `true` if this mode writes the trans copy.
    #[inline]
    pub fn writes_trans(self) -> bool {
        !matches!(self, TransformMode::LocalInPlace)
    }

    /// Transforms a pair of parallel vertex lists with `m`.
    pub fn apply_to_vertices(self, m: &Matrix4<f32>, local: &mut [Vertex], trans: &mut [Vertex]) {
        for (l, t) in local.iter_mut().zip(trans.iter_mut()) {
            self.apply_with(l, t, |v| v.transformed(m));
        }
    }
}
