//! Delayed detail panels.
//!
//! Hovering a node builds a hidden panel with its detail lines. The panel
//! becomes visible once the reveal delay has passed, unless the pointer
//! left the node first. At most one panel exists per node.

use cab_core::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub delay_ms: f64,
    /// Text x offset from the node center.
    pub text_x: f64,
    /// Baseline y offset of each detail line from the node center.
    pub line_offsets: Vec<f64>,
    pub panel_width: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000.0,
            text_x: 100.0,
            line_offsets: vec![-21.0, -12.0, -2.0, 8.0, 18.0, 28.0],
            panel_width: 150.0,
        }
    }
}

/// A detail panel anchored to one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub node: NodeId,
    pub lines: Vec<String>,
    pub reveal_at: f64,
    pub visible: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DetailOverlay {
    config: OverlayConfig,
    panels: BTreeMap<NodeId, Panel>,
}

impl DetailOverlay {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            panels: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Build a hidden panel for `node`, replacing any existing one.
    ///
    /// Returns `false` when there is nothing to show.
    pub fn focus_gain(&mut self, node: NodeId, lines: Vec<String>, now_ms: f64) -> bool {
        if lines.is_empty() {
            self.panels.remove(&node);
            return false;
        }
        self.panels.insert(
            node,
            Panel {
                node,
                lines,
                reveal_at: now_ms + self.config.delay_ms,
                visible: false,
            },
        );
        true
    }

    /// Tear down the panel of `node` and cancel its pending reveal.
    pub fn focus_loss(&mut self, node: NodeId) -> bool {
        self.panels.remove(&node).is_some_and(|p| p.visible)
    }

    /// Reveal panels whose delay has elapsed. Returns whether any changed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let mut changed = false;
        for panel in self.panels.values_mut() {
            if !panel.visible && now_ms >= panel.reveal_at {
                panel.visible = true;
                changed = true;
            }
        }
        changed
    }

    /// Drop panels of nodes that are no longer rendered.
    pub fn retain(&mut self, rendered: &BTreeSet<NodeId>) {
        self.panels.retain(|id, _| rendered.contains(id));
    }

    pub fn clear(&mut self) {
        self.panels.clear();
    }

    pub fn panel(&self, node: NodeId) -> Option<&Panel> {
        self.panels.get(&node)
    }

    pub fn visible_panels(&self) -> impl Iterator<Item = &Panel> {
        self.panels.values().filter(|p| p.visible)
    }

    /// Earliest pending reveal, for hosts that schedule their own timers.
    pub fn next_reveal(&self) -> Option<f64> {
        self.panels
            .values()
            .filter(|p| !p.visible)
            .map(|p| p.reveal_at)
            .reduce(f64::min)
    }
}
