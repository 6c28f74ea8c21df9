//! Tree layout engine.
//!
//! Assigns `(x, y)` to every visible node in one pre-order walk. Two
//! placement strategies exist:
//!
//! - **Stacked**: one row per node, indented by depth.
//! - **Attached**: the node sits on its parent's row, to the right of it,
//!   next to any attached siblings laid out just before it.
//!
//! The walk order and every counter are derived from the tree alone, so the
//! same tree and config always produce the same coordinates.

use crate::model::*;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Box sizes and spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub base_width: f32,
    pub base_height: f32,
    /// Horizontal distance per depth level.
    pub h_spacing: f32,
    /// Vertical gap between stacked rows.
    pub v_gap: f32,
    /// Distance from a parent to its first attached child.
    pub attached_offset: f32,
    /// Gap between consecutive attached boxes.
    pub attached_gap: f32,
    /// Padding around the drawing.
    pub margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::complex_action()
    }
}

impl LayoutConfig {
    /// Train-number action trees: short boxes, actions attached to their event.
    pub const fn train_number_actions() -> Self {
        Self {
            base_width: 180.0,
            base_height: 30.0,
            h_spacing: 90.0,
            v_gap: 6.0,
            attached_offset: 200.0,
            attached_gap: 20.0,
            margin: 10.0,
        }
    }

    /// Complex-action definition trees: taller boxes, everything stacked.
    pub const fn complex_action() -> Self {
        Self {
            base_width: 180.0,
            base_height: 40.0,
            h_spacing: 60.0,
            v_gap: 20.0,
            attached_offset: 200.0,
            attached_gap: 20.0,
            margin: 10.0,
        }
    }

    pub fn row_height(&self) -> f32 {
        self.base_height + self.v_gap
    }

    pub fn attached_step(&self) -> f32 {
        self.base_width + self.attached_gap
    }
}

/// How a node is positioned relative to the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Placement {
    #[default]
    Stacked,
    Attached,
}

/// Placement per node kind. Kinds without a rule are stacked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementRules {
    rules: BTreeMap<KindTag, Placement>,
}

impl PlacementRules {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, tag: KindTag, placement: Placement) -> Self {
        self.rules.insert(tag, placement);
        self
    }

    pub fn placement_for(&self, tag: KindTag) -> Placement {
        self.rules.get(&tag).copied().unwrap_or_default()
    }

    /// Actions hang off their line event's row.
    pub fn train_number_actions() -> Self {
        Self::new().with(KindTag::Action, Placement::Attached)
    }

    pub fn complex_action() -> Self {
        Self::new()
    }
}

/// The SVG `viewBox` covering the laid-out boxes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Extents of one layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutResult {
    /// Deepest visible level.
    pub max_depth: usize,
    /// Row index of the last stacked node.
    pub max_index: usize,
    /// Number of stacked rows.
    pub rows: usize,
    /// Longest run of attached siblings.
    pub max_run: usize,
    pub width: f32,
    pub height: f32,
    pub view_box: ViewBox,
}

/// Lay out the visible part of the tree in place.
///
/// Writes `position.x`/`position.y` of visible nodes only. `x0`/`y0` are
/// left alone; they are the renderer's animation origin and are stashed by
/// `stash_positions` once the pass has been rendered.
pub fn layout_tree(
    tree: &mut ActionTree,
    config: &LayoutConfig,
    rules: &PlacementRules,
) -> LayoutResult {
    let visible = tree.visible_preorder();

    let mut row = 0usize;
    let mut run = 0usize;
    let mut result = LayoutResult::default();

    for &idx in &visible {
        let tag = tree.graph[idx].kind.tag();
        let parent = tree.parent(idx);
        let placement = match (rules.placement_for(tag), parent) {
            (Placement::Attached, Some(parent)) => Some(parent),
            _ => None,
        };

        let (x, y) = if let Some(parent) = placement {
            let anchor = tree.graph[parent].position;
            let x = anchor.x + config.attached_offset + run as f32 * config.attached_step();
            run += 1;
            result.max_run = result.max_run.max(run);
            (x, anchor.y)
        } else {
            run = 0;
            let depth = tree.graph[idx].depth;
            let pos = (depth as f32 * config.h_spacing, row as f32 * config.row_height());
            result.max_index = row;
            row += 1;
            pos
        };

        let node = &mut tree.graph[idx];
        node.position.x = x;
        node.position.y = y;
        result.max_depth = result.max_depth.max(node.depth);
    }
    result.rows = row;

    let view_box = bounding_box(tree, &visible, config);
    result.width = view_box.width;
    result.height = view_box.height;
    result.view_box = view_box;

    log::debug!(
        "laid out {} visible nodes in {} rows (max depth {}, max run {})",
        visible.len(),
        result.rows,
        result.max_depth,
        result.max_run
    );
    result
}

/// Boxes are centered on node positions; the view box adds half a box and
/// the margin on each side.
fn bounding_box(tree: &ActionTree, visible: &[NodeIndex], config: &LayoutConfig) -> ViewBox {
    let mut min = (f32::INFINITY, f32::INFINITY);
    let mut max = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for &idx in visible {
        let (x, y) = tree.graph[idx].position.current();
        min = (min.0.min(x), min.1.min(y));
        max = (max.0.max(x), max.1.max(y));
    }
    if visible.is_empty() {
        min = (0.0, 0.0);
        max = (0.0, 0.0);
    }

    let pad_x = config.base_width / 2.0 + config.margin;
    let pad_y = config.base_height / 2.0 + config.margin;
    ViewBox {
        x: min.0 - pad_x,
        y: min.1 - pad_y,
        width: max.0 - min.0 + 2.0 * pad_x,
        height: max.1 - min.1 + 2.0 * pad_y,
    }
}

impl ActionTree {
    /// Copy each visible node's `(x, y)` into `(x0, y0)`.
    pub fn stash_positions(&mut self) {
        for idx in self.visible_preorder() {
            self.graph[idx].position.stash();
        }
    }
}
