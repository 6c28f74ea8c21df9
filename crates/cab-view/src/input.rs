//! Input abstraction layer.
//!
//! Host pointer events are resolved to a node (by hit testing or by the
//! element that fired them) and normalized into `InputEvent`.

use cab_core::NodeId;
use serde::{Deserialize, Serialize};

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };
}

/// A normalized input event targeting one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Primary button click on a node.
    Click { node: NodeId, modifiers: Modifiers },

    /// Pointer entered a node box (mouseenter).
    PointerEnter { node: NodeId },

    /// Pointer left a node box (mouseleave).
    PointerLeave { node: NodeId },
}

impl InputEvent {
    pub fn click(node: NodeId) -> Self {
        Self::Click {
            node,
            modifiers: Modifiers::NONE,
        }
    }

    /// The node this event targets.
    pub fn node(&self) -> NodeId {
        match self {
            Self::Click { node, .. } | Self::PointerEnter { node } | Self::PointerLeave { node } => {
                *node
            }
        }
    }
}
