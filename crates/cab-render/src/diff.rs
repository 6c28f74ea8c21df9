//! Diff renderer: reconciles rendered sprites with the visible tree.
//!
//! Each pass keys the previously rendered nodes and links by `NodeId` and
//! splits them against the newly visible set:
//!
//! - **entering**: not rendered yet. Starts at the source node's previous
//!   position, transparent, and moves to its own position.
//! - **updating**: rendered and still visible. Moves from wherever it is on
//!   screen to its new position.
//! - **exiting**: rendered but no longer visible. Moves into the source
//!   node's new position while fading out, then gets pruned.
//!
//! Links are keyed by their child id and follow the same rules. A new pass
//! supersedes any transition still in flight.

use crate::curve::LinkStyle;
use crate::transition::{Easing, Tween};
use cab_core::{ActionTree, LayoutResult, NodeId, NodeIndex};
use kurbo::{BezPath, Point, Rect, Size};
use std::collections::{BTreeMap, BTreeSet};

/// Classification of keys between two passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDiff {
    pub entering: BTreeSet<NodeId>,
    pub updating: BTreeSet<NodeId>,
    pub exiting: BTreeSet<NodeId>,
}

impl KeyDiff {
    pub fn len(&self) -> usize {
        self.entering.len() + self.updating.len() + self.exiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `previous ∪ next` into entering, updating and exiting keys.
pub fn diff_keys(previous: &BTreeSet<NodeId>, next: &BTreeSet<NodeId>) -> KeyDiff {
    KeyDiff {
        entering: next.difference(previous).copied().collect(),
        updating: next.intersection(previous).copied().collect(),
        exiting: previous.difference(next).copied().collect(),
    }
}

/// Lifecycle phase of a rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Updating,
    Exiting,
}

#[derive(Debug, Clone)]
struct NodeSprite {
    idx: NodeIndex,
    center: Tween<Point>,
    opacity: Tween<f64>,
    phase: Phase,
}

#[derive(Debug, Clone)]
struct LinkSprite {
    parent: Tween<Point>,
    child: Tween<Point>,
    phase: Phase,
}

/// A node as displayed at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFrame {
    pub id: NodeId,
    pub idx: NodeIndex,
    pub center: Point,
    pub opacity: f64,
    pub phase: Phase,
}

impl NodeFrame {
    pub fn rect(&self, box_size: Size) -> Rect {
        Rect::from_center_size(self.center, box_size)
    }
}

/// A link as displayed at one instant, keyed by its child.
#[derive(Debug, Clone)]
pub struct LinkFrame {
    pub id: NodeId,
    pub path: BezPath,
    pub phase: Phase,
}

/// Everything on screen at one instant.
#[derive(Debug, Clone)]
pub struct Frame {
    /// In paint order (pre-order), topmost last.
    pub nodes: Vec<NodeFrame>,
    pub links: Vec<LinkFrame>,
    pub view_box: Rect,
    pub box_size: Size,
}

impl Frame {
    pub fn node(&self, id: NodeId) -> Option<&NodeFrame> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

fn point(pos: (f32, f32)) -> Point {
    Point::new(f64::from(pos.0), f64::from(pos.1))
}

/// Retained render state for one tree.
#[derive(Debug, Clone)]
pub struct DiffRenderer {
    link_style: LinkStyle,
    box_size: Size,
    easing: Easing,
    nodes: BTreeMap<NodeId, NodeSprite>,
    links: BTreeMap<NodeId, LinkSprite>,
    view_origin: Tween<Point>,
    canvas: Tween<Size>,
}

impl DiffRenderer {
    pub fn new(link_style: LinkStyle, box_size: Size, easing: Easing) -> Self {
        Self {
            link_style,
            box_size,
            easing,
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            view_origin: Tween::settled(Point::ZERO),
            canvas: Tween::settled(Size::ZERO),
        }
    }

    pub fn link_style(&self) -> &LinkStyle {
        &self.link_style
    }

    /// Ids of every node sprite still on screen, exiting ones included.
    pub fn rendered(&self) -> BTreeSet<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn phase_of(&self, id: NodeId) -> Option<Phase> {
        self.nodes.get(&id).map(|s| s.phase)
    }

    /// Run one pass against the tree's current layout.
    ///
    /// `source` is the node whose toggle caused the pass (the root on first
    /// render). Afterwards every visible node's `(x0, y0)` equals its `(x, y)`.
    pub fn update(
        &mut self,
        tree: &mut ActionTree,
        layout: &LayoutResult,
        source: NodeIndex,
        now_ms: f64,
        duration_ms: f64,
    ) -> KeyDiff {
        let easing = self.easing;
        let src = tree.node(source).position;
        let src_prev = point(src.previous());
        let src_next = point(src.current());

        // ─── Nodes ───
        let visible = tree.visible_preorder();
        let next: BTreeSet<NodeId> = visible.iter().map(|&i| tree.node(i).id).collect();
        let diff = diff_keys(&self.rendered(), &next);

        for &idx in &visible {
            let node = tree.node(idx);
            let target = point(node.position.current());
            if diff.entering.contains(&node.id) {
                self.nodes.insert(
                    node.id,
                    NodeSprite {
                        idx,
                        center: Tween::new(src_prev, target, now_ms, duration_ms, easing),
                        opacity: Tween::new(0.0, 1.0, now_ms, duration_ms, easing),
                        phase: Phase::Entering,
                    },
                );
            } else if let Some(sprite) = self.nodes.get_mut(&node.id) {
                sprite.center.retarget(target, now_ms, duration_ms, easing);
                sprite.opacity.retarget(1.0, now_ms, duration_ms, easing);
                sprite.phase = Phase::Updating;
            }
        }
        for id in &diff.exiting {
            if let Some(sprite) = self.nodes.get_mut(id) {
                sprite.center.retarget(src_next, now_ms, duration_ms, easing);
                sprite.opacity.retarget(0.0, now_ms, duration_ms, easing);
                sprite.phase = Phase::Exiting;
            }
        }

        // ─── Links ───
        let edges: Vec<(NodeIndex, NodeIndex)> = tree
            .visible_edges()
            .into_iter()
            .filter(|&(parent, _)| self.link_style.draws_from(tree.node(parent).kind.tag()))
            .collect();
        let next_links: BTreeSet<NodeId> = edges.iter().map(|&(_, c)| tree.node(c).id).collect();
        let prev_links: BTreeSet<NodeId> = self.links.keys().copied().collect();
        let link_diff = diff_keys(&prev_links, &next_links);

        for &(parent, child) in &edges {
            let id = tree.node(child).id;
            let parent_to = point(tree.node(parent).position.current());
            let child_to = point(tree.node(child).position.current());
            if link_diff.entering.contains(&id) {
                self.links.insert(
                    id,
                    LinkSprite {
                        parent: Tween::new(src_prev, parent_to, now_ms, duration_ms, easing),
                        child: Tween::new(src_prev, child_to, now_ms, duration_ms, easing),
                        phase: Phase::Entering,
                    },
                );
            } else if let Some(link) = self.links.get_mut(&id) {
                link.parent.retarget(parent_to, now_ms, duration_ms, easing);
                link.child.retarget(child_to, now_ms, duration_ms, easing);
                link.phase = Phase::Updating;
            }
        }
        for id in &link_diff.exiting {
            if let Some(link) = self.links.get_mut(id) {
                link.parent.retarget(src_next, now_ms, duration_ms, easing);
                link.child.retarget(src_next, now_ms, duration_ms, easing);
                link.phase = Phase::Exiting;
            }
        }

        // ─── Canvas ───
        let vb = layout.view_box;
        self.view_origin.retarget(
            Point::new(f64::from(vb.x), f64::from(vb.y)),
            now_ms,
            duration_ms,
            easing,
        );
        self.canvas.retarget(
            Size::new(f64::from(layout.width), f64::from(layout.height)),
            now_ms,
            duration_ms,
            easing,
        );

        tree.stash_positions();

        log::debug!(
            "diff pass from {}: {} entering, {} updating, {} exiting nodes; {} links",
            tree.node(source).id,
            diff.entering.len(),
            diff.updating.len(),
            diff.exiting.len(),
            next_links.len()
        );
        diff
    }

    /// Sample every sprite at `now_ms`.
    pub fn frame(&self, now_ms: f64) -> Frame {
        let nodes = self
            .nodes
            .iter()
            .map(|(&id, sprite)| NodeFrame {
                id,
                idx: sprite.idx,
                center: sprite.center.sample(now_ms),
                opacity: sprite.opacity.sample(now_ms),
                phase: sprite.phase,
            })
            .collect();
        let links = self
            .links
            .iter()
            .map(|(&id, link)| LinkFrame {
                id,
                path: self
                    .link_style
                    .path(link.parent.sample(now_ms), link.child.sample(now_ms)),
                phase: link.phase,
            })
            .collect();
        Frame {
            nodes,
            links,
            view_box: Rect::from_origin_size(
                self.view_origin.sample(now_ms),
                self.canvas.sample(now_ms),
            ),
            box_size: self.box_size,
        }
    }

    /// Drop exiting sprites whose transition has finished.
    ///
    /// Returns the ids of the removed nodes.
    pub fn prune(&mut self, now_ms: f64) -> Vec<NodeId> {
        let done: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, s)| s.phase == Phase::Exiting && s.center.is_done(now_ms))
            .map(|(&id, _)| id)
            .collect();
        for id in &done {
            self.nodes.remove(id);
        }
        self.links
            .retain(|_, l| !(l.phase == Phase::Exiting && l.child.is_done(now_ms)));
        done
    }

    pub fn is_animating(&self, now_ms: f64) -> bool {
        self.nodes
            .values()
            .any(|s| !s.center.is_done(now_ms) || !s.opacity.is_done(now_ms))
            || self.links.values().any(|l| !l.child.is_done(now_ms))
            || !self.canvas.is_done(now_ms)
            || !self.view_origin.is_done(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cab_core::*;
    use pretty_assertions::assert_eq;

    fn ids(raw: &[usize]) -> BTreeSet<NodeId> {
        raw.iter().map(|&n| NodeId::from_order(n)).collect()
    }

    #[test]
    fn diff_sets_are_disjoint_and_cover_union() {
        let previous = ids(&[0, 1, 2, 5]);
        let next = ids(&[0, 2, 3, 4]);
        let diff = diff_keys(&previous, &next);

        assert_eq!(diff.entering, ids(&[3, 4]));
        assert_eq!(diff.updating, ids(&[0, 2]));
        assert_eq!(diff.exiting, ids(&[1, 5]));

        let union: BTreeSet<NodeId> = previous.union(&next).copied().collect();
        let mut covered = BTreeSet::new();
        for set in [&diff.entering, &diff.updating, &diff.exiting] {
            for id in set {
                assert!(covered.insert(*id), "{id} classified twice");
            }
        }
        assert_eq!(covered, union);
        assert_eq!(diff.len(), union.len());
    }

    fn complex(tag: &str) -> NodeKind {
        NodeKind::Complex(ComplexAction::new(
            tag,
            ActionRef::default(),
            CaAttributes::default(),
        ))
    }

    fn setup() -> (ActionTree, DiffRenderer, [NodeIndex; 3]) {
        let mut tree = ActionTree::with_root(complex("Serial"), TreeSchema::ComplexAction);
        let a = tree.add_child(tree.root, complex("Parallel"));
        let a1 = tree.add_child(a, complex("Display"));
        let b = tree.add_child(tree.root, complex("Screen"));
        let renderer = DiffRenderer::new(
            LinkStyle::complex_action(),
            Size::new(180.0, 40.0),
            Easing::Linear,
        );
        (tree, renderer, [a, a1, b])
    }

    fn pass(
        tree: &mut ActionTree,
        renderer: &mut DiffRenderer,
        source: NodeIndex,
        now: f64,
    ) -> KeyDiff {
        let layout = layout_tree(tree, &LayoutConfig::complex_action(), &PlacementRules::new());
        renderer.update(tree, &layout, source, now, 200.0)
    }

    #[test]
    fn first_pass_enters_everything_from_root() {
        let (mut tree, mut renderer, [_, a1, _]) = setup();
        let root = tree.root;
        let diff = pass(&mut tree, &mut renderer, root, 0.0);
        assert_eq!(diff.entering.len(), 4);
        assert!(diff.updating.is_empty() && diff.exiting.is_empty());

        let start = renderer.frame(0.0);
        let a1_id = tree.node(a1).id;
        let sprite = start.node(a1_id).unwrap();
        assert_eq!(sprite.center, Point::ZERO);
        assert_eq!(sprite.opacity, 0.0);

        let end = renderer.frame(200.0);
        let sprite = end.node(a1_id).unwrap();
        assert_eq!(sprite.center, Point::new(120.0, 120.0));
        assert_eq!(sprite.opacity, 1.0);
        assert_eq!(end.links.len(), 3);
        assert!(!renderer.is_animating(200.0));
    }

    #[test]
    fn collapse_exits_into_source_then_prunes() {
        let (mut tree, mut renderer, [a, a1, b]) = setup();
        let root = tree.root;
        pass(&mut tree, &mut renderer, root, 0.0);

        tree.toggle(a);
        let diff = pass(&mut tree, &mut renderer, a, 1000.0);
        let a1_id = tree.node(a1).id;
        assert_eq!(diff.exiting, ids(&[2]));
        assert_eq!(diff.updating.len(), 3);

        let done = renderer.frame(1200.0);
        let exiting = done.node(a1_id).unwrap();
        assert_eq!(exiting.center, Point::new(60.0, 60.0));
        assert_eq!(exiting.opacity, 0.0);
        assert_eq!(exiting.phase, Phase::Exiting);
        assert_eq!(
            done.node(tree.node(b).id).unwrap().center,
            Point::new(60.0, 120.0)
        );

        assert!(renderer.prune(1100.0).is_empty());
        assert_eq!(renderer.prune(1200.0), vec![a1_id]);
        let after = renderer.frame(1200.0);
        assert_eq!(after.nodes.len(), 3);
        assert_eq!(after.links.len(), 2);
    }

    #[test]
    fn positions_are_stashed_after_pass() {
        let (mut tree, mut renderer, [_, _, b]) = setup();
        let root = tree.root;
        pass(&mut tree, &mut renderer, root, 0.0);
        let pos = tree.node(b).position;
        assert_eq!(pos.previous(), pos.current());
    }

    #[test]
    fn new_pass_supersedes_in_flight_transition() {
        let (mut tree, mut renderer, [a, _, b]) = setup();
        let root = tree.root;
        pass(&mut tree, &mut renderer, root, 0.0);

        tree.toggle(a);
        pass(&mut tree, &mut renderer, a, 1000.0);
        // Halfway through, b is between row 3 and row 2.
        let mid = renderer.frame(1100.0).node(tree.node(b).id).unwrap().center;
        assert_eq!(mid, Point::new(60.0, 150.0));

        tree.toggle(a);
        pass(&mut tree, &mut renderer, a, 1100.0);
        let restart = renderer.frame(1100.0).node(tree.node(b).id).unwrap().center;
        assert_eq!(restart, mid);
        assert_eq!(
            renderer.frame(1300.0).node(tree.node(b).id).unwrap().center,
            Point::new(60.0, 180.0)
        );
    }

    #[test]
    fn exiting_node_rejoins_as_updating() {
        let (mut tree, mut renderer, [a, a1, _]) = setup();
        let root = tree.root;
        pass(&mut tree, &mut renderer, root, 0.0);
        tree.toggle(a);
        pass(&mut tree, &mut renderer, a, 1000.0);
        tree.toggle(a);
        let diff = pass(&mut tree, &mut renderer, a, 1050.0);

        let a1_id = tree.node(a1).id;
        assert!(diff.updating.contains(&a1_id));
        assert_eq!(renderer.phase_of(a1_id), Some(Phase::Updating));
    }
}
