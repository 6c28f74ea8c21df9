//! Link geometry.
//!
//! A link is an elbow through three points, pushed left by `inset` so it
//! leaves the parent box near its left edge:
//!
//! ```text
//! (parent.x - inset, parent.y)
//!   │
//! (parent.x - inset, child.y) ──── (child.x - inset, child.y)
//! ```
//!
//! The elbow is smoothed either with a uniform B-spline or with vertical
//! "bump" segments.

use cab_core::KindTag;
use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};

/// Smoothing applied to the elbow points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Curve {
    /// Uniform cubic B-spline, clamped at both ends.
    Basis,
    /// Each segment is a cubic with both control points at the vertical midpoint.
    BumpY,
}

/// How links are drawn and which parents draw them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkStyle {
    pub curve: Curve,
    pub inset: f64,
    /// Parent kinds that draw links to their children. `None` draws all.
    pub sources: Option<Vec<KindTag>>,
}

impl Default for LinkStyle {
    fn default() -> Self {
        Self::complex_action()
    }
}

impl LinkStyle {
    /// Links leave train numbers and line events only.
    pub fn train_number_actions() -> Self {
        Self {
            curve: Curve::BumpY,
            inset: 180.0 / 4.0,
            sources: Some(vec![KindTag::TrainNumber, KindTag::LineEvent]),
        }
    }

    pub fn complex_action() -> Self {
        Self {
            curve: Curve::Basis,
            inset: 180.0 / 3.0,
            sources: None,
        }
    }

    pub fn draws_from(&self, parent: KindTag) -> bool {
        self.sources
            .as_ref()
            .is_none_or(|sources| sources.contains(&parent))
    }

    pub fn path(&self, parent: Point, child: Point) -> BezPath {
        link_path(self.curve, parent, child, self.inset)
    }
}

/// Path of the link from `parent` to `child`.
pub fn link_path(curve: Curve, parent: Point, child: Point, inset: f64) -> BezPath {
    let points = [
        Point::new(parent.x - inset, parent.y),
        Point::new(parent.x - inset, child.y),
        Point::new(child.x - inset, child.y),
    ];
    match curve {
        Curve::Basis => basis(&points),
        Curve::BumpY => bump_y(&points),
    }
}

fn basis(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some(&first) = points.first() else {
        return path;
    };
    path.move_to(first);
    match points {
        [_] => {}
        [_, last] => path.line_to(*last),
        _ => {
            path.line_to(first.lerp(points[1], 1.0 / 6.0));
            for w in points.windows(3) {
                let (a, b, c) = (w[0], w[1], w[2]);
                path.curve_to(a.lerp(b, 1.0 / 3.0), a.lerp(b, 2.0 / 3.0), knot(a, b, c));
            }
            // Clamp: the last point acts as its own successor.
            let (a, b) = (points[points.len() - 2], points[points.len() - 1]);
            path.curve_to(a.lerp(b, 1.0 / 3.0), a.lerp(b, 2.0 / 3.0), knot(a, b, b));
            path.line_to(b);
        }
    }
    path
}

/// B-spline knot `(a + 4b + c) / 6`.
fn knot(a: Point, b: Point, c: Point) -> Point {
    Point::new((a.x + 4.0 * b.x + c.x) / 6.0, (a.y + 4.0 * b.y + c.y) / 6.0)
}

fn bump_y(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some(&first) = points.first() else {
        return path;
    };
    path.move_to(first);
    for pair in points.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let ym = (from.y + to.y) / 2.0;
        path.curve_to(Point::new(from.x, ym), Point::new(to.x, ym), to);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn basis_three_points() {
        let path = link_path(
            Curve::Basis,
            Point::new(60.0, 0.0),
            Point::new(120.0, 60.0),
            60.0,
        );
        let els: Vec<PathEl> = path.elements().to_vec();
        assert_eq!(els.len(), 5);
        assert_eq!(els[0], PathEl::MoveTo(Point::new(0.0, 0.0)));
        assert_eq!(els[1], PathEl::LineTo(Point::new(0.0, 10.0)));
        let PathEl::CurveTo(_, _, mid) = els[2] else {
            panic!("expected curve");
        };
        assert!(close(mid, Point::new(10.0, 50.0)));
        let PathEl::CurveTo(_, _, end) = els[3] else {
            panic!("expected curve");
        };
        assert!(close(end, Point::new(50.0, 60.0)));
        assert_eq!(els[4], PathEl::LineTo(Point::new(60.0, 60.0)));
    }

    #[test]
    fn bump_y_segments() {
        let path = link_path(
            Curve::BumpY,
            Point::new(45.0, 0.0),
            Point::new(245.0, 40.0),
            45.0,
        );
        let els = path.elements();
        assert_eq!(els.len(), 3);
        assert_eq!(
            els[1],
            PathEl::CurveTo(
                Point::new(0.0, 20.0),
                Point::new(0.0, 20.0),
                Point::new(0.0, 40.0)
            )
        );
        assert_eq!(
            els[2],
            PathEl::CurveTo(
                Point::new(0.0, 40.0),
                Point::new(200.0, 40.0),
                Point::new(200.0, 40.0)
            )
        );
    }

    #[test]
    fn two_point_basis_is_a_line() {
        let path = basis(&[Point::new(0.0, 0.0), Point::new(5.0, 5.0)]);
        assert_eq!(
            path.elements(),
            &[
                PathEl::MoveTo(Point::new(0.0, 0.0)),
                PathEl::LineTo(Point::new(5.0, 5.0))
            ]
        );
    }

    #[test]
    fn link_sources_filter() {
        let style = LinkStyle::train_number_actions();
        assert!(style.draws_from(KindTag::LineEvent));
        assert!(!style.draws_from(KindTag::LineSection));
        assert!(LinkStyle::complex_action().draws_from(KindTag::Complex));
    }
}
