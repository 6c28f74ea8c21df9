//! Hit testing: point → node lookup.
//!
//! Reverse-walks the frame's nodes (last painted = topmost) to find which
//! box contains a given point in view-box coordinates.

use crate::diff::{Frame, Phase};
use cab_core::NodeId;
use kurbo::Point;

/// Find the topmost node box containing `(px, py)`.
///
/// Exiting nodes are on their way out and never hit.
pub fn hit_test(frame: &Frame, px: f64, py: f64) -> Option<NodeId> {
    let point = Point::new(px, py);
    frame
        .nodes
        .iter()
        .rev()
        .filter(|n| n.phase != Phase::Exiting)
        .find(|n| n.rect(frame.box_size).contains(point))
        .map(|n| n.id)
}

/// Map a pointer position in client pixels to view-box coordinates.
///
/// `client_width`/`client_height` are the on-screen size of the `<svg>`.
pub fn client_to_view(frame: &Frame, cx: f64, cy: f64, client_width: f64, client_height: f64) -> Point {
    let vb = frame.view_box;
    let sx = if client_width > 0.0 { vb.width() / client_width } else { 1.0 };
    let sy = if client_height > 0.0 { vb.height() / client_height } else { 1.0 };
    Point::new(vb.x0 + cx * sx, vb.y0 + cy * sy)
}
