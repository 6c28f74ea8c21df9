//! Expand/collapse state.
//!
//! Each node is `Expanded` or `Collapsed`. Collapsing hides the node's
//! children from every visible-set query but keeps the child edges, so
//! expanding brings back exactly the same children in the same order.

use crate::model::{ActionTree, ChildList, Visibility};
use petgraph::graph::NodeIndex;

impl ActionTree {
    pub fn is_expanded(&self, idx: NodeIndex) -> bool {
        self.graph[idx].visibility == Visibility::Expanded
    }

    /// Flip a node between expanded and collapsed.
    ///
    /// Leaves have nothing to hide; toggling one is a no-op that returns
    /// `false` so callers can skip the relayout.
    pub fn toggle(&mut self, idx: NodeIndex) -> bool {
        if self.is_leaf(idx) {
            return false;
        }
        let node = &mut self.graph[idx];
        node.visibility = match node.visibility {
            Visibility::Expanded => Visibility::Collapsed,
            Visibility::Collapsed => Visibility::Expanded,
        };
        log::debug!("toggled {} to {:?}", node.id, node.visibility);
        true
    }

    pub fn expand_all(&mut self) {
        for i in 0..self.len() {
            let idx = self.preorder()[i];
            self.graph[idx].visibility = Visibility::Expanded;
        }
    }

    /// Collapse every inner node at `depth` or deeper, expand the rest.
    pub fn collapse_to_depth(&mut self, depth: usize) {
        for i in 0..self.len() {
            let idx = self.preorder()[i];
            let collapse = self.graph[idx].depth >= depth && !self.is_leaf(idx);
            self.graph[idx].visibility = if collapse {
                Visibility::Collapsed
            } else {
                Visibility::Expanded
            };
        }
    }

    /// Children currently shown under `idx` (empty when collapsed).
    pub fn visible_children(&self, idx: NodeIndex) -> ChildList {
        if self.is_expanded(idx) {
            self.children(idx)
        } else {
            ChildList::new()
        }
    }

    /// Whether every ancestor of `idx` is expanded.
    pub fn is_visible(&self, idx: NodeIndex) -> bool {
        let mut current = idx;
        while let Some(parent) = self.parent(current) {
            if !self.is_expanded(parent) {
                return false;
            }
            current = parent;
        }
        true
    }

    /// Pre-order walk of the visible set, root first.
    pub fn visible_preorder(&self) -> Vec<NodeIndex> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            // Reverse so the first child is popped next.
            stack.extend(self.visible_children(idx).into_iter().rev());
        }
        out
    }

    /// Visible (parent, child) pairs, in child pre-order.
    pub fn visible_edges(&self) -> Vec<(NodeIndex, NodeIndex)> {
        self.visible_preorder()
            .into_iter()
            .filter_map(|child| self.parent(child).map(|parent| (parent, child)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::*;
    use petgraph::graph::NodeIndex;
    use pretty_assertions::assert_eq;

    fn complex(tag: &str) -> NodeKind {
        NodeKind::Complex(ComplexAction::new(
            tag,
            ActionRef::default(),
            CaAttributes::default(),
        ))
    }

    /// root ─┬─ a ─┬─ a1
    ///       │     └─ a2
    ///       └─ b ─── b1
    fn sample() -> (ActionTree, [NodeIndex; 5]) {
        let mut tree = ActionTree::with_root(complex("Serial"), TreeSchema::ComplexAction);
        let a = tree.add_child(tree.root, complex("Parallel"));
        let a1 = tree.add_child(a, complex("Display"));
        let a2 = tree.add_child(a, complex("Announcement"));
        let b = tree.add_child(tree.root, complex("Repeat"));
        let b1 = tree.add_child(b, complex("Screen"));
        (tree, [a, a1, a2, b, b1])
    }

    #[test]
    fn toggle_twice_restores_children() {
        let (mut tree, [a, a1, a2, ..]) = sample();
        let before = tree.visible_children(a);
        assert_eq!(before.as_slice(), &[a1, a2]);

        assert!(tree.toggle(a));
        assert!(tree.visible_children(a).is_empty());
        assert_eq!(tree.children(a).as_slice(), &[a1, a2]);

        assert!(tree.toggle(a));
        assert_eq!(tree.visible_children(a), before);
    }

    #[test]
    fn toggling_leaf_is_noop() {
        let (mut tree, [_, a1, ..]) = sample();
        assert!(!tree.toggle(a1));
        assert!(tree.is_expanded(a1));
    }

    #[test]
    fn collapse_hides_descendants_and_shifts_siblings() {
        let (mut tree, [a, a1, a2, b, b1]) = sample();
        let root = tree.root;
        assert_eq!(tree.visible_preorder(), vec![root, a, a1, a2, b, b1]);

        tree.toggle(a);
        let visible = tree.visible_preorder();
        assert_eq!(visible, vec![root, a, b, b1]);
        assert!(!visible.contains(&a1) && !visible.contains(&a2));

        // b moves up in traversal order but keeps its depth.
        assert_eq!(visible.iter().position(|&n| n == b), Some(2));
        assert_eq!(tree.node(b).depth, 1);
        assert!(!tree.is_visible(a1));
        assert!(tree.is_visible(b1));
    }

    #[test]
    fn collapse_to_depth_then_expand_all() {
        let (mut tree, [a, _, _, b, _]) = sample();
        tree.collapse_to_depth(1);
        assert_eq!(tree.visible_preorder(), vec![tree.root, a, b]);
        assert!(tree.is_expanded(tree.root));

        tree.expand_all();
        assert_eq!(tree.visible_preorder().len(), tree.len());
    }

    #[test]
    fn visible_edges_follow_visible_set() {
        let (mut tree, [a, _, _, b, b1]) = sample();
        tree.toggle(a);
        let root = tree.root;
        assert_eq!(tree.visible_edges(), vec![(root, a), (root, b), (b, b1)]);
    }
}
