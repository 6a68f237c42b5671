//! Full-document crop against a world-space rectangle.
//!
//! Every shape in every layer is handled independently: shapes disjoint from
//! the crop rectangle are discarded (crop keeps the inside, it is not an
//! erase), fully contained shapes pass through unchanged, and partially
//! overlapping shapes are rewritten. Vector shapes are clipped through the
//! convex polygon clip and come back as polygons - an accepted, irreversible
//! type coercion. Images are cropped by raster sub-rectangle intersection
//! into a new asset. Lines that straddle the boundary are dropped, a
//! documented limitation.

use tracing::{debug, warn};

use crate::assets::{AssetStore, PixelRect};
use crate::document::Document;
use crate::geometry::{clip_polygon, Rect};
use crate::shapes::{Shape, ShapeId, ShapeKind};

/// Rewrite the document in place so only geometry inside `crop` remains.
/// A crop rectangle without positive area is ignored.
pub fn crop_document(doc: &mut Document, assets: &mut AssetStore, crop: &Rect) {
    if crop.width <= 0.0 || crop.height <= 0.0 {
        debug!("ignoring zero-area crop rectangle");
        return;
    }

    let clip_corners = crop.corners();
    for layer in doc.layers_mut() {
        let shapes = std::mem::take(&mut layer.shapes);
        layer.shapes = shapes
            .into_iter()
            .filter_map(|shape| crop_shape(shape, crop, &clip_corners, assets))
            .collect();
    }
}

fn crop_shape(
    shape: Shape,
    crop: &Rect,
    clip_corners: &[crate::geometry::Point; 4],
    assets: &mut AssetStore,
) -> Option<Shape> {
    let bounds = shape.bounds()?;
    if !bounds.overlaps(crop) {
        return None;
    }
    if crop.contains_rect(&bounds) {
        return Some(shape);
    }

    // Partial overlap.
    match &shape.kind {
        ShapeKind::Image { asset, .. } => {
            let inter = bounds.intersection(crop)?;
            crop_image(&shape, *asset, &bounds, &inter, assets)
        }
        // A line crossing the crop boundary is dropped rather than clipped
        // to the segment inside; see DESIGN.md.
        ShapeKind::Line { .. } => None,
        _ => {
            let clipped = clip_polygon(&shape.outline(), clip_corners);
            let kind = ShapeKind::Polygon { points: clipped };
            if kind.is_degenerate() {
                return None;
            }
            Some(Shape {
                id: ShapeId::new(),
                name: shape.name,
                color: shape.color,
                visible: shape.visible,
                kind,
            })
        }
    }
}

/// Crop an image shape by intersecting its box with the crop rectangle and
/// cutting the corresponding pixel sub-rectangle into a new asset. The
/// original asset is never touched.
fn crop_image(
    shape: &Shape,
    asset: crate::assets::AssetId,
    bounds: &Rect,
    inter: &Rect,
    assets: &mut AssetStore,
) -> Option<Shape> {
    // A still-pending asset (fresh load, history restore) decodes here
    // rather than losing the shape on a committed crop.
    let (width, height) = match assets.ensure_ready(asset) {
        Ok(dims) => dims,
        Err(err) => {
            warn!(%asset, "cannot crop image: {err:#}; dropping shape");
            return None;
        }
    };

    let to_px_x = |world: f64| ((world - bounds.x) / bounds.width * width as f64).round();
    let to_px_y = |world: f64| ((world - bounds.y) / bounds.height * height as f64).round();

    let x0 = to_px_x(inter.x).clamp(0.0, width as f64) as u32;
    let y0 = to_px_y(inter.y).clamp(0.0, height as f64) as u32;
    let x1 = to_px_x(inter.x + inter.width).clamp(0.0, width as f64) as u32;
    let y1 = to_px_y(inter.y + inter.height).clamp(0.0, height as f64) as u32;
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    let sub = PixelRect {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    };
    match assets.crop(asset, sub) {
        Ok(new_asset) => Some(Shape {
            id: ShapeId::new(),
            name: shape.name.clone(),
            color: shape.color,
            visible: shape.visible,
            kind: ShapeKind::Image {
                start: inter.min(),
                end: inter.max(),
                asset: new_asset,
            },
        }),
        Err(err) => {
            warn!(%asset, "image crop failed: {err:#}");
            None
        }
    }
}
