//! Depth sorting of the render list's order array.

use serde::Deserialize;

use crate::Triangle;

/// Depth key used to order triangles. All keys read camera-space `trans` z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Mean z of the three vertices.
    #[default]
    AverageZ,
    /// Smallest z (nearest vertex).
    NearZ,
    /// Largest z (farthest vertex).
    FarZ,
}

impl SortMode {
    #[inline]
    pub fn key(self, tri: &Triangle) -> f32 {
        match self {
            SortMode::AverageZ => tri.average_z(),
            SortMode::NearZ => tri.min_z(),
            SortMode::FarZ => tri.max_z(),
        }
    }
}

/// Reorders `order` (indices into `polys`) so that keys are descending:
/// farthest first. Equal keys keep their relative order and `polys` is not
/// touched.
pub fn sort_order(order: &mut [usize], polys: &[Triangle], mode: SortMode) {
    let key = |i: usize| polys.get(i).map_or(f32::NEG_INFINITY, |t| mode.key(t));
    order.sort_by(|&a, &b| key(b).total_cmp(&key(a)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vertex;

    fn at_depths(z: [f32; 3], tag: u32) -> Triangle {
        Triangle::new([
            Vertex::at(0.0, 0.0, z[0]),
            Vertex::at(1.0, 0.0, z[1]),
            Vertex::at(0.0, 1.0, z[2]),
        ])
        .with_tag(tag)
    }

    fn tags(order: &[usize], polys: &[Triangle]) -> Vec<u32> {
        order.iter().map(|&i| polys[i].tag).collect()
    }

    #[test]
    fn sorts_far_to_near() {
        let polys = vec![
            at_depths([1.0, 1.0, 1.0], 0),
            at_depths([9.0, 9.0, 9.0], 1),
            at_depths([5.0, 5.0, 5.0], 2),
        ];
        let mut order = vec![0, 1, 2];
        sort_order(&mut order, &polys, SortMode::AverageZ);
        assert_eq!(tags(&order, &polys), vec![1, 2, 0]);
        // Data untouched
        assert_eq!(polys[0].tag, 0);
    }

    #[test]
    fn key_choice_changes_order() {
        // a spans 1..10 (avg 4), b sits at 5
        let polys = vec![at_depths([1.0, 1.0, 10.0], 0), at_depths([5.0, 5.0, 5.0], 1)];

        let mut order = vec![0, 1];
        sort_order(&mut order, &polys, SortMode::AverageZ);
        assert_eq!(order, vec![1, 0]);

        let mut order = vec![0, 1];
        sort_order(&mut order, &polys, SortMode::FarZ);
        assert_eq!(order, vec![0, 1]);

        let mut order = vec![0, 1];
        sort_order(&mut order, &polys, SortMode::NearZ);
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn equal_keys_are_stable() {
        let polys: Vec<_> = (0..5).map(|t| at_depths([3.0, 3.0, 3.0], t)).collect();
        let mut order = vec![4, 2, 0, 1, 3];
        sort_order(&mut order, &polys, SortMode::NearZ);
        assert_eq!(order, vec![4, 2, 0, 1, 3]);
    }
}
