//! Rectangle selection queries and the derived selection bounding box.

use crate::geometry::{polygon_bounds, Rect};
use crate::shapes::{Shape, ShapeId};

/// Shapes whose tessellated bounding box overlaps `rect` under the
/// open-interval test: shapes that merely touch the marquee edge are not
/// selected.
pub fn query<'a>(shapes: impl IntoIterator<Item = &'a Shape>, rect: &Rect) -> Vec<ShapeId> {
    shapes
        .into_iter()
        .filter(|s| s.bounds().is_some_and(|b| b.overlaps(rect)))
        .map(|s| s.id)
        .collect()
}

/// Union bounding box of the selected shapes' tessellated extents. An empty
/// selection has no rect (never a degenerate zero-size one).
pub fn selection_bounds<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> Option<Rect> {
    shapes
        .into_iter()
        .filter_map(|s| polygon_bounds(&s.outline()))
        .reduce(|acc, b| acc.union(&b))
}
