//! Partition selection strategies for BSP tree construction.
//!
//! The choice of partition wall affects tree balance and the number of
//! wall splits during construction.

use crate::plane::{Partition, WallSide};
use crate::Wall;

/// Strategy for selecting which wall partitions the current worklist.
pub trait PartitionSelector {
    /// Returns the index of the wall to partition with, or `None` if the
    /// slice is empty. The index must be in bounds.
    fn select(&self, walls: &[Wall]) -> Option<usize>;
}

/// Selects the head of the worklist.
///
/// This is the simplest and fastest selector, but may produce unbalanced
/// trees depending on input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstWall;

impl PartitionSelector for FirstWall {
    fn select(&self, walls: &[Wall]) -> Option<usize> {
        if walls.is_empty() { None } else { Some(0) }
    }
}

/// Selects the wall whose plane splits the fewest of the other walls.
///
/// Ties go to the earliest wall. Walls that cannot partition (zero-length
/// leading edge) are never picked unless nothing else is left.
#[derive(Debug, Clone, Copy, Default)]
pub struct FewestSplits;

impl PartitionSelector for FewestSplits {
    fn select(&self, walls: &[Wall]) -> Option<usize> {
        if walls.is_empty() {
            return None;
        }

        walls
            .iter()
            .enumerate()
            .filter_map(|(i, candidate)| {
                let partition = Partition::from_wall(candidate).ok()?;
                let splits = walls
                    .iter()
                    .enumerate()
                    .filter(|&(j, w)| j != i && partition.classify(w) == WallSide::Spanning)
                    .count();
                Some((splits, i))
            })
            .min()
            .map(|(_, i)| i)
            .or(Some(0))
    }
}
