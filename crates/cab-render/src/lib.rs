pub mod curve;
pub mod diff;
pub mod hit;
pub mod overlay;
pub mod svg;
pub mod transition;

pub use curve::{Curve, LinkStyle, link_path};
pub use diff::{DiffRenderer, Frame, KeyDiff, LinkFrame, NodeFrame, Phase, diff_keys};
pub use hit::hit_test;
pub use overlay::{DetailOverlay, OverlayConfig, Panel};
pub use svg::{SvgTheme, render_svg};
pub use transition::{Easing, TransitionConfig, Tween};
