//! Tree view controller.
//!
//! `TreeView` is the render context for one loaded tree: it owns the tree,
//! the latest layout, the diff renderer and the detail overlay. Every
//! interaction goes through `&mut self`, so passes never interleave.

use crate::input::{InputEvent, Modifiers};
use cab_core::{
    ActionTree, ComplexActionQuery, LayoutConfig, LayoutResult, NodeId, NodeIndex, PlacementRules,
    TreeSchema, layout_tree,
};
use cab_render::{
    DetailOverlay, DiffRenderer, Frame, KeyDiff, LinkStyle, OverlayConfig, SvgTheme,
    TransitionConfig, hit_test, render_svg,
};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use web_time::Instant;

/// What a click on a non-drillable node does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClickBehavior {
    /// Expand or collapse the clicked node.
    #[default]
    Toggle,
    /// Clicks only drill into complex actions.
    Ignore,
}

/// Everything that shapes one kind of tree view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub layout: LayoutConfig,
    pub placement: PlacementRules,
    pub links: LinkStyle,
    pub transition: TransitionConfig,
    pub overlay: OverlayConfig,
    pub click: ClickBehavior,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::complex_action()
    }
}

impl ViewConfig {
    pub fn train_number_actions() -> Self {
        Self {
            layout: LayoutConfig::train_number_actions(),
            placement: PlacementRules::train_number_actions(),
            links: LinkStyle::train_number_actions(),
            transition: TransitionConfig::default(),
            overlay: OverlayConfig::default(),
            click: ClickBehavior::Toggle,
        }
    }

    pub fn complex_action() -> Self {
        Self {
            layout: LayoutConfig::complex_action(),
            placement: PlacementRules::complex_action(),
            links: LinkStyle::complex_action(),
            transition: TransitionConfig::default(),
            overlay: OverlayConfig::default(),
            click: ClickBehavior::Toggle,
        }
    }

    /// The preset matching a tree's wire format.
    pub fn for_schema(schema: TreeSchema) -> Self {
        match schema {
            TreeSchema::TrainNumber => Self::train_number_actions(),
            TreeSchema::ComplexAction => Self::complex_action(),
        }
    }
}

/// Something the host has to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Layout changed and an animation started; keep ticking.
    Relayout,
    /// Open the complex-action view for this action.
    OpenComplexAction(ComplexActionQuery),
}

pub struct TreeView {
    tree: ActionTree,
    config: ViewConfig,
    layout: LayoutResult,
    renderer: DiffRenderer,
    overlay: DetailOverlay,
    theme: SvgTheme,
    hovered: Option<NodeId>,
    passes: usize,
    last_pass: Duration,
}

impl TreeView {
    /// Lay out the tree and start the first pass, growing out of the root.
    pub fn new(tree: ActionTree, config: ViewConfig, now_ms: f64) -> Self {
        let renderer = DiffRenderer::new(
            config.links.clone(),
            Size::new(
                f64::from(config.layout.base_width),
                f64::from(config.layout.base_height),
            ),
            config.transition.easing,
        );
        let overlay = DetailOverlay::new(config.overlay.clone());
        let mut view = Self {
            tree,
            config,
            layout: LayoutResult::default(),
            renderer,
            overlay,
            theme: SvgTheme::light(),
            hovered: None,
            passes: 0,
            last_pass: Duration::ZERO,
        };
        let root = view.tree.root;
        view.relayout(root, now_ms, false);
        view
    }

    #[must_use]
    pub fn with_theme(mut self, theme: SvgTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn tree(&self) -> &ActionTree {
        &self.tree
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn layout(&self) -> &LayoutResult {
        &self.layout
    }

    pub fn overlay(&self) -> &DetailOverlay {
        &self.overlay
    }

    /// Route one input event.
    pub fn handle(&mut self, event: InputEvent, now_ms: f64) -> Vec<ViewEvent> {
        let Some(idx) = self.tree.index_of(event.node()) else {
            log::warn!("input for unknown node {}", event.node());
            return Vec::new();
        };

        match event {
            InputEvent::Click { modifiers, .. } => {
                if let Some(query) = self.tree.complex_action_query(idx) {
                    log::info!("open complex action {:?}", query.action_id);
                    return vec![ViewEvent::OpenComplexAction(query)];
                }
                if self.config.click == ClickBehavior::Ignore || !self.tree.toggle(idx) {
                    return Vec::new();
                }
                self.relayout(idx, now_ms, modifiers.alt);
                vec![ViewEvent::Relayout]
            }
            InputEvent::PointerEnter { node } => {
                let lines = self.tree.node(idx).kind.detail_lines();
                self.overlay.focus_gain(node, lines, now_ms);
                Vec::new()
            }
            InputEvent::PointerLeave { node } => {
                self.overlay.focus_loss(node);
                Vec::new()
            }
        }
    }

    pub fn expand_all(&mut self, now_ms: f64) -> ViewEvent {
        self.tree.expand_all();
        let root = self.tree.root;
        self.relayout(root, now_ms, false);
        ViewEvent::Relayout
    }

    pub fn collapse_to_depth(&mut self, depth: usize, now_ms: f64) -> ViewEvent {
        self.tree.collapse_to_depth(depth);
        let root = self.tree.root;
        self.relayout(root, now_ms, false);
        ViewEvent::Relayout
    }

    /// Recompute the layout and start a diff pass from `source`.
    fn relayout(&mut self, source: NodeIndex, now_ms: f64, slow: bool) -> KeyDiff {
        let started = Instant::now();
        self.layout = layout_tree(&mut self.tree, &self.config.layout, &self.config.placement);
        let duration = self.config.transition.duration(slow);
        let diff = self
            .renderer
            .update(&mut self.tree, &self.layout, source, now_ms, duration);

        self.passes += 1;
        self.last_pass = started.elapsed();
        log::debug!(
            "updated nodes in {:.2} ms",
            self.last_pass.as_secs_f64() * 1000.0
        );
        diff
    }

    /// Number of layout and diff passes run so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Wall-clock time the most recent pass took.
    pub fn last_pass_time(&self) -> Duration {
        self.last_pass
    }

    /// Advance time: prune finished exits and reveal due panels.
    ///
    /// Returns whether the host should redraw.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let pruned = self.renderer.prune(now_ms);
        if !pruned.is_empty() {
            self.overlay.retain(&self.renderer.rendered());
        }
        let revealed = self.overlay.tick(now_ms);
        !pruned.is_empty() || revealed || self.renderer.is_animating(now_ms)
    }

    pub fn is_animating(&self, now_ms: f64) -> bool {
        self.renderer.is_animating(now_ms)
    }

    pub fn frame(&self, now_ms: f64) -> Frame {
        self.renderer.frame(now_ms)
    }

    pub fn render_svg(&self, now_ms: f64) -> String {
        render_svg(
            &self.frame(now_ms),
            &self.tree,
            Some(&self.overlay),
            &self.theme,
        )
    }

    /// Topmost node at a point in view-box coordinates.
    pub fn node_at(&self, x: f64, y: f64, now_ms: f64) -> Option<NodeId> {
        hit_test(&self.frame(now_ms), x, y)
    }

    /// Click at a point in view-box coordinates. Misses do nothing.
    pub fn click_at(&mut self, x: f64, y: f64, modifiers: Modifiers, now_ms: f64) -> Vec<ViewEvent> {
        match self.node_at(x, y, now_ms) {
            Some(node) => self.handle(InputEvent::Click { node, modifiers }, now_ms),
            None => Vec::new(),
        }
    }

    /// Turn a pointer move into leave/enter events for the boxes it crosses.
    pub fn pointer_move(&mut self, x: f64, y: f64, now_ms: f64) {
        let hit = self.node_at(x, y, now_ms);
        if hit == self.hovered {
            return;
        }
        if let Some(node) = self.hovered.take() {
            self.handle(InputEvent::PointerLeave { node }, now_ms);
        }
        if let Some(node) = hit {
            self.handle(InputEvent::PointerEnter { node }, now_ms);
        }
        self.hovered = hit;
    }

    /// The pointer left the drawing.
    pub fn pointer_out(&mut self, now_ms: f64) {
        if let Some(node) = self.hovered.take() {
            self.handle(InputEvent::PointerLeave { node }, now_ms);
        }
    }
}
