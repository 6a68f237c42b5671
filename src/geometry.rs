//! World-coordinate primitives: points, rectangles, grid snapping and the
//! convex polygon clip used by crop.
//!
//! All geometry lives in artboard space, independent of view zoom.

use serde::{Deserialize, Serialize};

/// A point on the artboard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle with a normalized (non-negative) extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build a rectangle from two opposite corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    pub fn min(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn max(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Corners in winding order: top-left, top-right, bottom-right,
    /// bottom-left. This is the order `clip_polygon` expects for its
    /// inclusive half-plane test.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.x + self.width, self.y),
            Point::new(self.x + self.width, self.y + self.height),
            Point::new(self.x, self.y + self.height),
        ]
    }

    /// Boundary-inclusive containment of another rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }

    /// Open-interval overlap test: rectangles that only touch along an edge
    /// do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Intersection rectangle, or `None` when there is no positive-area
    /// overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);
        if x2 > x1 && y2 > y1 {
            Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = (self.x + self.width).max(other.x + other.width);
        let y2 = (self.y + self.height).max(other.y + other.height);
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }
}

/// Snap a coordinate to the nearest grid multiple. A non-positive grid
/// leaves the value untouched.
pub fn snap(value: f64, grid: f64) -> f64 {
    if grid <= 0.0 {
        return value;
    }
    (value / grid).round() * grid
}

/// Snap a point to the grid on both axes.
pub fn snap_point(p: Point, grid: f64) -> Point {
    Point::new(snap(p.x, grid), snap(p.y, grid))
}

/// Tight bounds of a point sequence. Empty input has no bounds.
pub fn polygon_bounds(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let mut min_x = first.x;
    let mut min_y = first.y;
    let mut max_x = first.x;
    let mut max_y = first.y;
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

/// Sutherland–Hodgman clip of an arbitrary polygon against a convex clip
/// polygon given in winding order (here always the 4 corners of a rectangle).
///
/// A vertex counts as inside when the cross product of the clip edge
/// direction with (vertex - edge start) is >= 0, so points exactly on the
/// boundary are kept. The result may be empty or degenerate (< 3 points)
/// when there is no positive-area intersection; callers must discard it in
/// that case instead of building an invalid polygon.
pub fn clip_polygon(subject: &[Point], clip: &[Point]) -> Vec<Point> {
    let mut output: Vec<Point> = subject.to_vec();

    for i in 0..clip.len() {
        if output.is_empty() {
            break;
        }
        let a = clip[i];
        let b = clip[(i + 1) % clip.len()];

        let input = std::mem::take(&mut output);
        let mut prev = input[input.len() - 1];
        let mut prev_side = edge_side(a, b, prev);

        for &curr in &input {
            let curr_side = edge_side(a, b, curr);
            if curr_side >= 0.0 {
                if prev_side < 0.0 {
                    output.push(edge_intersection(a, b, prev, curr));
                }
                output.push(curr);
            } else if prev_side >= 0.0 {
                output.push(edge_intersection(a, b, prev, curr));
            }
            prev = curr;
            prev_side = curr_side;
        }
    }

    output
}

/// Signed side of `p` relative to the directed edge `a -> b`. Positive or
/// zero means inside the clip half-plane.
fn edge_side(a: Point, b: Point, p: Point) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Exact intersection of segment `p -> q` with the line through `a -> b`,
/// by linear interpolation between the signed side values.
fn edge_intersection(a: Point, b: Point, p: Point, q: Point) -> Point {
    let sp = edge_side(a, b, p);
    let sq = edge_side(a, b, q);
    let t = sp / (sp - sq);
    Point::new(p.x + t * (q.x - p.x), p.y + t * (q.y - p.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rect_from_corners_normalizes() {
        let r = Rect::from_corners(Point::new(10.0, 20.0), Point::new(4.0, 2.0));
        assert_eq!(r, Rect::new(4.0, 2.0, 6.0, 18.0));
    }

    #[test]
    fn touching_rects_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Rect::new(9.0, 9.0, 5.0, 5.0)));
    }

    #[test]
    fn snap_rounds_to_nearest_multiple() {
        assert_eq!(snap(30.0, 32.0), 32.0);
        assert_eq!(snap(15.0, 32.0), 0.0);
        assert_eq!(snap(49.0, 32.0), 64.0);
        assert_eq!(snap(7.5, 0.0), 7.5);
    }

    #[test]
    fn clip_square_against_overlapping_square() {
        let subject = Rect::new(0.0, 0.0, 64.0, 64.0).corners();
        let clip = Rect::new(32.0, 32.0, 64.0, 64.0).corners();
        let out = clip_polygon(&subject, &clip);
        assert_eq!(
            out,
            vec![
                Point::new(32.0, 32.0),
                Point::new(64.0, 32.0),
                Point::new(64.0, 64.0),
                Point::new(32.0, 64.0),
            ]
        );
    }

    #[test]
    fn clip_disjoint_is_empty() {
        let subject = Rect::new(0.0, 0.0, 10.0, 10.0).corners();
        let clip = Rect::new(100.0, 100.0, 10.0, 10.0).corners();
        assert!(clip_polygon(&subject, &clip).is_empty());
    }

    #[test]
    fn clip_keeps_boundary_exact_points() {
        // Triangle sharing an edge with the clip rect stays intact.
        let subject = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(5.0, 8.0),
        ];
        let clip = Rect::new(0.0, 0.0, 10.0, 10.0).corners();
        assert_eq!(clip_polygon(&subject, &clip), subject.to_vec());
    }

    #[test]
    fn clip_edge_only_contact_is_degenerate() {
        // Subject touches the clip rect along a line: fewer than 3 distinct
        // points of positive area remain.
        let subject = Rect::new(-10.0, 0.0, 10.0, 10.0).corners();
        let clip = Rect::new(0.0, 0.0, 10.0, 10.0).corners();
        let out = clip_polygon(&subject, &clip);
        let bounds = polygon_bounds(&out);
        assert!(out.len() < 3 || bounds.is_some_and(|b| b.width == 0.0 || b.height == 0.0));
    }

    proptest! {
        #[test]
        fn clip_is_identity_when_fully_contained(
            x in -100.0f64..100.0,
            y in -100.0f64..100.0,
            w in 1.0f64..50.0,
            h in 1.0f64..50.0,
        ) {
            let subject = Rect::new(x, y, w, h).corners();
            // Clip rect strictly contains the subject.
            let clip = Rect::new(x - 1.0, y - 1.0, w + 2.0, h + 2.0).corners();
            prop_assert_eq!(clip_polygon(&subject, &clip), subject.to_vec());
        }

        #[test]
        fn clip_output_stays_inside_clip_rect(
            x in -50.0f64..50.0,
            y in -50.0f64..50.0,
            w in 1.0f64..80.0,
            h in 1.0f64..80.0,
        ) {
            let subject = Rect::new(x, y, w, h).corners();
            let clip_rect = Rect::new(0.0, 0.0, 40.0, 40.0);
            let out = clip_polygon(&subject, &clip_rect.corners());
            for p in out {
                prop_assert!(p.x >= -1e-9 && p.x <= 40.0 + 1e-9);
                prop_assert!(p.y >= -1e-9 && p.y <= 40.0 + 1e-9);
            }
        }
    }
}
