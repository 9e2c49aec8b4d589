//! BSP tree navigation utilities for interactive visualization.

use std::collections::HashSet;

use bsp_pipeline::bsp::{BspNode, BspTree, NodeId};
use bsp_pipeline::PolygonBuffer;
use macroquad::prelude::*;

/// Direction taken at each node in the navigation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Front,
    Back,
}

/// Walks the tree one node at a time and outlines the walls of the
/// selected subtree on screen.
pub struct TreeNavigator {
    path: Vec<Direction>,
}

impl Default for TreeNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeNavigator {
    /// Creates a new navigator starting at the root.
    pub fn new() -> Self {
        Self { path: Vec::new() }
    }

    pub fn path(&self) -> &[Direction] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Id of the selected node, if the tree is non-empty.
    pub fn current_id(&self, tree: &BspTree) -> Option<NodeId> {
        let mut id = tree.root()?;
        for dir in &self.path {
            let node = tree.node(id)?;
            id = match dir {
                Direction::Front => node.front()?,
                Direction::Back => node.back()?,
            };
        }
        Some(id)
    }

    pub fn current_node<'a>(&self, tree: &'a BspTree) -> Option<&'a BspNode> {
        self.current_id(tree).and_then(|id| tree.node(id))
    }

    fn step(&mut self, tree: &BspTree, dir: Direction) -> bool {
        let child = self.current_node(tree).and_then(|node| match dir {
            Direction::Front => node.front(),
            Direction::Back => node.back(),
        });
        if child.is_some() {
            self.path.push(dir);
        }
        child.is_some()
    }

    /// Moves to the front child. Returns true if there is one.
    pub fn go_front(&mut self, tree: &BspTree) -> bool {
        self.step(tree, Direction::Front)
    }

    /// Moves to the back child. Returns true if there is one.
    pub fn go_back(&mut self, tree: &BspTree) -> bool {
        self.step(tree, Direction::Back)
    }

    /// Navigates to the parent node. Returns true if not already at root.
    pub fn go_parent(&mut self) -> bool {
        self.path.pop().is_some()
    }

    pub fn go_root(&mut self) {
        self.path.clear();
    }

    /// Handles keyboard input for navigation.
    /// Returns true if navigation state changed.
    pub fn update(&mut self, tree: &BspTree) -> bool {
        let mut changed = false;

        if is_key_pressed(KeyCode::F) {
            changed = self.go_front(tree);
        }
        if is_key_pressed(KeyCode::B) {
            changed = self.go_back(tree);
        }
        if is_key_pressed(KeyCode::P) {
            changed = self.go_parent();
        }
        if is_key_pressed(KeyCode::R) && !self.path.is_empty() {
            self.go_root();
            changed = true;
        }

        changed
    }

    /// Wall ids of the selected node and everything below it.
    pub fn subtree_ids(&self, tree: &BspTree) -> HashSet<u32> {
        let mut ids = HashSet::new();
        let mut stack: Vec<NodeId> = self.current_id(tree).into_iter().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = tree.node(id) {
                ids.insert(node.wall().id);
                stack.extend(node.front());
                stack.extend(node.back());
            }
        }
        ids
    }

    /// Outlines the visible triangles belonging to the selected subtree.
    /// The selected node's own wall is drawn in a second color.
    ///
    /// `scale` maps frame pixels to window pixels.
    pub fn draw_outlines(&self, tree: &BspTree, buffer: &PolygonBuffer, scale: Vec2) {
        let ids = self.subtree_ids(tree);
        let selected = self.current_node(tree).map(|node| node.wall().id);

        for tri in buffer.visible().filter(|t| ids.contains(&t.tag)) {
            let [a, b, c] = tri.trans().map(|v| vec2(v.position.x, v.position.y) * scale);
            let color = if Some(tri.tag) == selected { YELLOW } else { SKYBLUE };
            draw_triangle_lines(a, b, c, 1.5, color);
        }
    }

    /// Draws the navigation UI overlay.
    pub fn draw_ui(&self, tree: &BspTree, y_offset: f32) {
        let current = self.current_id(tree);
        let (wall_id, subtree, has_front, has_back, is_leaf) =
            match current.and_then(|id| tree.node(id).map(|node| (id, node))) {
                Some((id, node)) => (
                    node.wall().id,
                    tree.subtree_len(id),
                    node.front().is_some(),
                    node.back().is_some(),
                    node.is_leaf(),
                ),
                None => (0, 0, false, false, true),
            };

        let path_str = if self.path.is_empty() {
            "root".to_string()
        } else {
            self.path
                .iter()
                .map(|d| match d {
                    Direction::Front => "F",
                    Direction::Back => "B",
                })
                .collect::<Vec<_>>()
                .join(" -> ")
        };

        let label = current.map_or_else(|| "-".to_string(), |id| id.to_string());
        draw_text(
            &format!("Node {label}: wall {wall_id}, subtree {subtree} walls"),
            10.0,
            y_offset,
            18.0,
            WHITE,
        );
        draw_text(
            &format!("Path: {} (depth {})", path_str, self.path.len()),
            10.0,
            y_offset + 20.0,
            18.0,
            YELLOW,
        );
        draw_text(
            &format!(
                "Children: {}{}{}",
                if has_front { "[F]ront " } else { "" },
                if has_back { "[B]ack " } else { "" },
                if is_leaf { "(leaf)" } else { "" }
            ),
            10.0,
            y_offset + 40.0,
            18.0,
            if is_leaf { ORANGE } else { GREEN },
        );
        draw_text("[P]arent | [R]oot", 10.0, y_offset + 60.0, 16.0, GRAY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsp_pipeline::Wall;
    use nalgebra::Point2;

    /// Three parallel walls, each node with a single child.
    fn tree() -> BspTree {
        let walls = [10.0, 20.0, 30.0]
            .into_iter()
            .enumerate()
            .map(|(i, z)| {
                Wall::vertical(
                    i as u32 + 1,
                    Point2::new(-5.0, z),
                    Point2::new(5.0, z),
                    0.0,
                    2.0,
                )
            })
            .collect();
        BspTree::from_walls(walls).unwrap()
    }

    #[test]
    fn walks_down_and_back_up() {
        let tree = tree();
        let mut nav = TreeNavigator::new();
        assert_eq!(nav.current_node(&tree).unwrap().wall().id, 1);
        assert_eq!(nav.subtree_ids(&tree), HashSet::from([1, 2, 3]));

        // Walls further along +z lie on one side of wall 1; exactly one
        // child exists at every level
        let moved = nav.go_front(&tree) || nav.go_back(&tree);
        assert!(moved);
        assert_eq!(nav.depth(), 1);
        assert_eq!(nav.current_node(&tree).unwrap().wall().id, 2);
        assert_eq!(nav.subtree_ids(&tree), HashSet::from([2, 3]));

        assert!(nav.go_parent());
        assert!(!nav.go_parent());
        assert_eq!(nav.depth(), 0);
    }

    #[test]
    fn cannot_step_past_a_leaf() {
        let tree = tree();
        let mut nav = TreeNavigator::new();
        while nav.go_front(&tree) || nav.go_back(&tree) {}
        assert_eq!(nav.depth(), 2);
        assert!(nav.current_node(&tree).unwrap().is_leaf());
        assert!(!nav.go_front(&tree));
        assert!(!nav.go_back(&tree));

        nav.go_root();
        assert!(nav.path().is_empty());
    }

    #[test]
    fn empty_tree_has_no_selection() {
        let tree = BspTree::new();
        let mut nav = TreeNavigator::new();
        assert!(nav.current_id(&tree).is_none());
        assert!(!nav.go_front(&tree));
        assert!(nav.subtree_ids(&tree).is_empty());
    }
}
