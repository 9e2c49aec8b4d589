//! Wall cutting/splitting against a BSP partition.

use log::trace;

use crate::error::{RenderError, Result};
use crate::plane::{Partition, WallSide};
use crate::{Wall, WALL_SPLIT_ID};

/// Outcome of cutting a wall by a partition.
///
/// The input wall is consumed; a spanning wall comes back as exactly two
/// fragments and the original is gone.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitResult {
    Front(Wall),
    Back(Wall),
    Spanning { front: Wall, back: Wall },
}

/// Trait for geometry that can be cut by a partition.
pub trait Cuttable: Sized {
    /// Cuts the geometry by a partition.
    ///
    /// # Return values by classification
    ///
    /// - **Front** (including coplanar): `SplitResult::Front(self)`
    /// - **Back**: `SplitResult::Back(self)`
    /// - **Spanning**: two new fragments, one per side
    fn cut(self, partition: &Partition) -> Result<SplitResult>;
}

impl Cuttable for Wall {
    fn cut(self, partition: &Partition) -> Result<SplitResult> {
        match partition.classify(&self) {
            WallSide::Front => Ok(SplitResult::Front(self)),
            WallSide::Back => Ok(SplitResult::Back(self)),
            WallSide::Spanning => split_wall(self, partition),
        }
    }
}

/// Splits a spanning wall at the point where its leading edge crosses the
/// partition line.
///
/// The top edge (`v0 -> v1`) and bottom edge (`v3 -> v2`) are both cut at
/// the same parameter, giving the fragments `[v0, top, bottom, v3]` and
/// `[top, v1, v2, bottom]`. Each keeps the winding of the original.
fn split_wall(wall: Wall, partition: &Partition) -> Result<SplitResult> {
    let t = partition.intersect_leading_edge(&wall)?;
    let (d0, _) = partition.leading_distances(&wall);
    let [v0, v1, v2, v3] = *wall.vertices();

    let top = v0.lerp(&v1, t);
    let bottom = v3.lerp(&v2, t);
    if !(top.is_finite() && bottom.is_finite()) {
        return Err(RenderError::DegenerateGeometry(
            "split produced a non-finite vertex",
        ));
    }

    let id = wall.id + WALL_SPLIT_ID;
    let start_part = wall.fragment(id, [v0, top, bottom, v3]);
    let end_part = wall.fragment(id, [top, v1, v2, bottom]);

    trace!("split wall {} at t = {:.3} into two fragments {}", wall.id, t, id);

    // The fragment holding v0 lies on v0's side
    let (front, back) = if d0 >= 0.0 {
        (start_part, end_part)
    } else {
        (end_part, start_part)
    };
    Ok(SplitResult::Spanning { front, back })
}
