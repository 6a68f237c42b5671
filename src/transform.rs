//! Move and resize of the current selection, with optional grid snapping and
//! proportional constraint.
//!
//! Both operations work through the selection bounding box: move snaps the
//! box destination (never the raw delta, so rounding error cannot compound
//! across a drag), resize computes the final box from the dragged handle and
//! then remaps every selected shape by the affine transform that sends the
//! initial box to the final one.

use serde::{Deserialize, Serialize};

use crate::geometry::{snap, Point, Rect};
use crate::shapes::Shape;

/// One of the eight compass positions on the selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl Handle {
    /// Position of this handle on a rect.
    pub fn position(self, r: &Rect) -> Point {
        let cx = r.x + r.width / 2.0;
        let cy = r.y + r.height / 2.0;
        match self {
            Handle::TopLeft => Point::new(r.x, r.y),
            Handle::Top => Point::new(cx, r.y),
            Handle::TopRight => Point::new(r.x + r.width, r.y),
            Handle::Right => Point::new(r.x + r.width, cy),
            Handle::BottomRight => Point::new(r.x + r.width, r.y + r.height),
            Handle::Bottom => Point::new(cx, r.y + r.height),
            Handle::BottomLeft => Point::new(r.x, r.y + r.height),
            Handle::Left => Point::new(r.x, cy),
        }
    }

    pub fn opposite(self) -> Handle {
        match self {
            Handle::TopLeft => Handle::BottomRight,
            Handle::Top => Handle::Bottom,
            Handle::TopRight => Handle::BottomLeft,
            Handle::Right => Handle::Left,
            Handle::BottomRight => Handle::TopLeft,
            Handle::Bottom => Handle::Top,
            Handle::BottomLeft => Handle::TopRight,
            Handle::Left => Handle::Right,
        }
    }

    /// The fixed anchor for proportional resize: the opposite corner or edge
    /// midpoint.
    pub fn anchor(self, r: &Rect) -> Point {
        self.opposite().position(r)
    }

    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::Top,
        Handle::TopRight,
        Handle::Right,
        Handle::BottomRight,
        Handle::Bottom,
        Handle::BottomLeft,
        Handle::Left,
    ];
}

/// Which side(s) of one axis a resize moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisMove {
    Low,
    High,
    /// Both sides move symmetrically about the anchor (proportional resize
    /// from an edge-midpoint handle).
    Both,
    /// Axis untouched by this handle.
    None,
}

fn x_move(handle: Handle, proportional: bool) -> AxisMove {
    match handle {
        Handle::TopLeft | Handle::Left | Handle::BottomLeft => AxisMove::Low,
        Handle::TopRight | Handle::Right | Handle::BottomRight => AxisMove::High,
        Handle::Top | Handle::Bottom => {
            if proportional {
                AxisMove::Both
            } else {
                AxisMove::None
            }
        }
    }
}

fn y_move(handle: Handle, proportional: bool) -> AxisMove {
    match handle {
        Handle::TopLeft | Handle::Top | Handle::TopRight => AxisMove::Low,
        Handle::BottomLeft | Handle::Bottom | Handle::BottomRight => AxisMove::High,
        Handle::Left | Handle::Right => {
            if proportional {
                AxisMove::Both
            } else {
                AxisMove::None
            }
        }
    }
}

/// Adjust a raw move delta so the selection box origin lands on the grid.
pub fn snapped_move_delta(
    selection: &Rect,
    dx: f64,
    dy: f64,
    snap_enabled: bool,
    grid: f64,
) -> (f64, f64) {
    if !snap_enabled || grid <= 0.0 {
        return (dx, dy);
    }
    (
        snap(selection.x + dx, grid) - selection.x,
        snap(selection.y + dy, grid) - selection.y,
    )
}

/// Translate every selected shape. Returns the effective (possibly snapped)
/// delta that was applied.
pub fn move_shapes<'a>(
    shapes: impl IntoIterator<Item = &'a mut Shape>,
    selection: &Rect,
    dx: f64,
    dy: f64,
    snap_enabled: bool,
    grid: f64,
) -> (f64, f64) {
    let (dx, dy) = snapped_move_delta(selection, dx, dy, snap_enabled, grid);
    for shape in shapes {
        shape.kind = shape.kind.translated(dx, dy);
    }
    (dx, dy)
}

/// Compute the final selection box for a resize drag.
///
/// `delta` is the pointer travel since the drag began, relative to the
/// handle's position on `initial`. Flip prevention clamps each resized
/// dimension to a minimum (the grid step when snapping, else 1 unit),
/// keeping the edge opposite the clamped side in place. With snapping, the
/// resulting corners are snapped on the axes the handle moves and the box
/// re-clamped; an axis the handle does not touch keeps its exact extent.
pub fn resize_box(
    initial: &Rect,
    handle: Handle,
    delta: (f64, f64),
    proportional: bool,
    snap_enabled: bool,
    grid: f64,
) -> Rect {
    let snapping = snap_enabled && grid > 0.0;
    let min_dim = if snapping { grid } else { 1.0 };

    let mut x1 = initial.x;
    let mut y1 = initial.y;
    let mut x2 = initial.x + initial.width;
    let mut y2 = initial.y + initial.height;

    let anchor = handle.anchor(initial);

    if proportional {
        let hp = handle.position(initial);
        let moving = Point::new(hp.x + delta.0, hp.y + delta.1);
        let rx = axis_ratio(moving.x, anchor.x, hp.x);
        let ry = axis_ratio(moving.y, anchor.y, hp.y);
        let mut scale = rx.max(ry);
        if !scale.is_finite() {
            scale = 1.0;
        }
        x1 = anchor.x + (x1 - anchor.x) * scale;
        y1 = anchor.y + (y1 - anchor.y) * scale;
        x2 = anchor.x + (x2 - anchor.x) * scale;
        y2 = anchor.y + (y2 - anchor.y) * scale;
    } else {
        match x_move(handle, false) {
            AxisMove::Low => x1 += delta.0,
            AxisMove::High => x2 += delta.0,
            _ => {}
        }
        match y_move(handle, false) {
            AxisMove::Low => y1 += delta.1,
            AxisMove::High => y2 += delta.1,
            _ => {}
        }
    }

    let mx = x_move(handle, proportional);
    let my = y_move(handle, proportional);

    (x1, x2) = clamp_span(x1, x2, mx, min_dim, anchor.x);
    (y1, y2) = clamp_span(y1, y2, my, min_dim, anchor.y);

    if snapping {
        if mx != AxisMove::None {
            x1 = snap(x1, grid);
            x2 = snap(x2, grid);
        }
        if my != AxisMove::None {
            y1 = snap(y1, grid);
            y2 = snap(y2, grid);
        }
        (x1, x2) = clamp_span(x1, x2, mx, min_dim, anchor.x);
        (y1, y2) = clamp_span(y1, y2, my, min_dim, anchor.y);
    }

    Rect::new(x1, y1, x2 - x1, y2 - y1)
}

/// Axis-wise scale ratio of the pointer relative to the anchor. Undefined
/// (negative infinity, so it loses the max) when the handle sits on the
/// anchor along this axis.
fn axis_ratio(moving: f64, anchor: f64, handle: f64) -> f64 {
    let span = handle - anchor;
    if span == 0.0 {
        f64::NEG_INFINITY
    } else {
        (moving - anchor) / span
    }
}

/// Enforce the minimum span on one axis, keeping the non-moving edge fixed.
fn clamp_span(lo: f64, hi: f64, moving: AxisMove, min_dim: f64, center: f64) -> (f64, f64) {
    if hi - lo >= min_dim {
        return (lo, hi);
    }
    match moving {
        AxisMove::High => (lo, lo + min_dim),
        AxisMove::Low => (hi - min_dim, hi),
        AxisMove::Both => (center - min_dim / 2.0, center + min_dim / 2.0),
        AxisMove::None => (lo, hi),
    }
}

/// Resize every selected shape through the final box and return it.
pub fn resize_shapes<'a>(
    shapes: impl IntoIterator<Item = &'a mut Shape>,
    initial: &Rect,
    handle: Handle,
    delta: (f64, f64),
    proportional: bool,
    snap_enabled: bool,
    grid: f64,
) -> Rect {
    let target = resize_box(initial, handle, delta, proportional, snap_enabled, grid);
    for shape in shapes {
        shape.kind = shape.kind.remapped(initial, &target);
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geometry::Point;
    use crate::shapes::{Shape, ShapeKind};
    use proptest::prelude::*;

    fn rect_shape(x1: f64, y1: f64, x2: f64, y2: f64) -> Shape {
        Shape::new(
            ShapeKind::Rectangle {
                start: Point::new(x1, y1),
                end: Point::new(x2, y2),
            },
            Color::BLACK,
        )
    }

    #[test]
    fn move_snaps_the_destination_not_the_delta() {
        // Union box (0,0,64,64), raw delta (30,2), grid 32: destination
        // origin (30,2) snaps to (32,0).
        let selection = Rect::new(0.0, 0.0, 64.0, 64.0);
        let mut a = rect_shape(0.0, 0.0, 10.0, 10.0);
        let mut b = rect_shape(54.0, 54.0, 64.0, 64.0);
        let applied = move_shapes([&mut a, &mut b], &selection, 30.0, 2.0, true, 32.0);
        assert_eq!(applied, (32.0, 0.0));
        assert_eq!(a.bounds().unwrap(), Rect::new(32.0, 0.0, 10.0, 10.0));
        assert_eq!(b.bounds().unwrap(), Rect::new(86.0, 54.0, 10.0, 10.0));
    }

    #[test]
    fn move_without_snapping_applies_raw_delta() {
        let selection = Rect::new(5.0, 5.0, 10.0, 10.0);
        let mut s = rect_shape(5.0, 5.0, 15.0, 15.0);
        let applied = move_shapes([&mut s], &selection, 3.5, -2.25, false, 32.0);
        assert_eq!(applied, (3.5, -2.25));
        assert_eq!(s.bounds().unwrap(), Rect::new(8.5, 2.75, 10.0, 10.0));
    }

    #[test]
    fn edge_handle_affects_one_axis_only() {
        let initial = Rect::new(0.0, 0.0, 64.0, 64.0);
        let out = resize_box(&initial, Handle::Right, (16.0, 100.0), false, false, 0.0);
        assert_eq!(out, Rect::new(0.0, 0.0, 80.0, 64.0));

        let out = resize_box(&initial, Handle::Top, (100.0, 16.0), false, false, 0.0);
        assert_eq!(out, Rect::new(0.0, 16.0, 64.0, 48.0));
    }

    #[test]
    fn corner_handle_affects_both_axes() {
        let initial = Rect::new(10.0, 10.0, 40.0, 20.0);
        let out = resize_box(&initial, Handle::TopLeft, (-5.0, -10.0), false, false, 0.0);
        assert_eq!(out, Rect::new(5.0, 0.0, 45.0, 30.0));
    }

    #[test]
    fn flip_is_clamped_with_opposite_edge_fixed() {
        let initial = Rect::new(0.0, 0.0, 64.0, 64.0);
        // Dragging the right edge far past the left edge.
        let out = resize_box(&initial, Handle::Right, (-200.0, 0.0), false, false, 0.0);
        assert_eq!(out, Rect::new(0.0, 0.0, 1.0, 64.0));
        // Dragging the left edge far past the right edge: right edge stays.
        let out = resize_box(&initial, Handle::Left, (200.0, 0.0), false, false, 0.0);
        assert_eq!(out, Rect::new(63.0, 0.0, 1.0, 64.0));
    }

    #[test]
    fn snapped_resize_lands_corners_on_grid() {
        let initial = Rect::new(0.0, 0.0, 64.0, 64.0);
        let out = resize_box(&initial, Handle::BottomRight, (13.0, -10.0), false, true, 32.0);
        assert_eq!(out, Rect::new(0.0, 0.0, 64.0, 64.0));

        let out = resize_box(&initial, Handle::BottomRight, (20.0, 20.0), false, true, 32.0);
        assert_eq!(out, Rect::new(0.0, 0.0, 96.0, 96.0));

        // Collapsing below the grid re-clamps to one grid step.
        let out = resize_box(&initial, Handle::Right, (-63.0, 0.0), false, true, 32.0);
        assert_eq!(out, Rect::new(0.0, 0.0, 32.0, 64.0));
    }

    #[test]
    fn snapping_leaves_the_untouched_axis_alone() {
        // Thin off-grid selection: dragging the right edge must not snap the
        // vertical extent away to nothing.
        let initial = Rect::new(0.0, 10.0, 64.0, 4.0);
        let out = resize_box(&initial, Handle::Right, (20.0, 0.0), false, true, 32.0);
        assert_eq!(out, Rect::new(0.0, 10.0, 96.0, 4.0));

        let out = resize_box(&initial, Handle::Right, (10.0, 0.0), false, true, 32.0);
        assert_eq!(out, initial);
    }

    #[test]
    fn proportional_corner_uses_larger_ratio_and_fixed_anchor() {
        let initial = Rect::new(0.0, 0.0, 100.0, 50.0);
        // Pointer moves right by 50: x ratio 1.5 beats y ratio 1.0.
        let out = resize_box(&initial, Handle::BottomRight, (50.0, 0.0), true, false, 0.0);
        assert_eq!(out, Rect::new(0.0, 0.0, 150.0, 75.0));

        // Anchor (the top-left corner) never moves.
        let out = resize_box(&initial, Handle::BottomRight, (-20.0, 7.0), true, false, 0.0);
        assert_eq!(out.min(), Point::new(0.0, 0.0));
        let ratio = out.width / out.height;
        assert!((ratio - 2.0).abs() < 1e-9);
    }

    #[test]
    fn proportional_edge_handle_scales_about_edge_midpoint() {
        let initial = Rect::new(0.0, 0.0, 100.0, 50.0);
        // Right handle, anchor is the left edge midpoint (0, 25).
        let out = resize_box(&initial, Handle::Right, (100.0, 0.0), true, false, 0.0);
        assert_eq!(out, Rect::new(0.0, -25.0, 200.0, 100.0));
    }

    #[test]
    fn resize_remaps_selected_shapes_through_the_box() {
        let initial = Rect::new(0.0, 0.0, 64.0, 64.0);
        let mut rect = rect_shape(0.0, 0.0, 32.0, 32.0);
        let mut line = Shape::new(
            ShapeKind::Line {
                start: Point::new(0.0, 0.0),
                end: Point::new(64.0, 64.0),
            },
            Color::BLACK,
        );
        let target = resize_shapes(
            [&mut rect, &mut line],
            &initial,
            Handle::BottomRight,
            (64.0, 0.0),
            false,
            false,
            0.0,
        );
        assert_eq!(target, Rect::new(0.0, 0.0, 128.0, 64.0));
        assert_eq!(rect.bounds().unwrap(), Rect::new(0.0, 0.0, 64.0, 32.0));
        assert_eq!(
            line.kind,
            ShapeKind::Line {
                start: Point::new(0.0, 0.0),
                end: Point::new(128.0, 64.0),
            }
        );
    }

    proptest! {
        #[test]
        fn non_proportional_resize_respects_minimum_dimensions(
            handle_idx in 0usize..8,
            dx in -300.0f64..300.0,
            dy in -300.0f64..300.0,
            snap_enabled in proptest::bool::ANY,
            ox in -50.0f64..50.0,
            oy in -50.0f64..50.0,
            w in 1.0f64..100.0,
            h in 1.0f64..100.0,
        ) {
            let initial = Rect::new(ox, oy, w, h);
            let grid = 32.0;
            let handle = Handle::ALL[handle_idx];
            let out = resize_box(&initial, handle, (dx, dy), false, snap_enabled, grid);
            let min_dim = if snap_enabled { grid } else { 1.0 };
            if matches!(handle, Handle::Top | Handle::Bottom) {
                // The handle never moves this axis; its extent is preserved
                // exactly, even off the grid.
                prop_assert_eq!(out.x, initial.x);
                prop_assert_eq!(out.width, initial.width);
            } else {
                prop_assert!(out.width >= min_dim);
            }
            if matches!(handle, Handle::Left | Handle::Right) {
                prop_assert_eq!(out.y, initial.y);
                prop_assert_eq!(out.height, initial.height);
            } else {
                prop_assert!(out.height >= min_dim);
            }
        }

        #[test]
        fn proportional_resize_keeps_anchor_fixed(
            handle_idx in 0usize..8,
            dx in -200.0f64..200.0,
            dy in -200.0f64..200.0,
        ) {
            let initial = Rect::new(10.0, 20.0, 80.0, 40.0);
            let handle = Handle::ALL[handle_idx];
            let anchor = handle.anchor(&initial);
            let out = resize_box(&initial, handle, (dx, dy), true, false, 0.0);
            let new_anchor = handle.anchor(&out);
            prop_assert!((new_anchor.x - anchor.x).abs() < 1e-6);
            prop_assert!((new_anchor.y - anchor.y).abs() < 1e-6);
        }
    }
}
