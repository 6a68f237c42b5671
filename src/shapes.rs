//! Shape entities: the closed set of drawable kinds, their tessellated
//! outlines and the geometric operations every editor tool goes through.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assets::AssetId;
use crate::color::Color;
use crate::geometry::{polygon_bounds, Point, Rect};

/// Number of segments used to tessellate an ellipse outline.
pub const CIRCLE_SEGMENTS: usize = 72;

/// Shape identifier, unique within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeId(pub Uuid);

impl ShapeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShapeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The different kinds of shapes we can draw. Geometry is in artboard
/// coordinates, independent of view zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// A filled rectangle between two opposite corners.
    Rectangle { start: Point, end: Point },
    /// An axis-aligned ellipse inscribed in the box between two corners.
    Circle { start: Point, end: Point },
    /// A line segment between two endpoints.
    Line { start: Point, end: Point },
    /// A closed polygon, at least 3 points.
    Polygon { points: Vec<Point> },
    /// A placed raster asset, rescaled to the box between two corners.
    /// The asset's pixel content is immutable; crop mints a new asset.
    Image { start: Point, end: Point, asset: AssetId },
}

impl ShapeKind {
    /// Kind name, used for default shape names and history labels.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle { .. } => "Rectangle",
            ShapeKind::Circle { .. } => "Circle",
            ShapeKind::Line { .. } => "Line",
            ShapeKind::Polygon { .. } => "Polygon",
            ShapeKind::Image { .. } => "Image",
        }
    }

    /// Tessellate into an ordered point sequence.
    ///
    /// Rectangles and images yield their four corners in winding order,
    /// polygons their own points, lines their two endpoints (callers that
    /// need an area must special-case lines). A circle with a zero radius
    /// has no geometry and yields an empty sequence.
    pub fn outline(&self) -> Vec<Point> {
        match self {
            ShapeKind::Rectangle { start, end } | ShapeKind::Image { start, end, .. } => {
                Rect::from_corners(*start, *end).corners().to_vec()
            }
            ShapeKind::Circle { start, end } => {
                let rect = Rect::from_corners(*start, *end);
                let rx = rect.width / 2.0;
                let ry = rect.height / 2.0;
                if rx == 0.0 || ry == 0.0 {
                    return Vec::new();
                }
                let center = rect.center();
                (0..CIRCLE_SEGMENTS)
                    .map(|i| {
                        let angle = (i as f64) * std::f64::consts::TAU / (CIRCLE_SEGMENTS as f64);
                        Point::new(center.x + rx * angle.cos(), center.y + ry * angle.sin())
                    })
                    .collect()
            }
            ShapeKind::Line { start, end } => vec![*start, *end],
            ShapeKind::Polygon { points } => points.clone(),
        }
    }

    /// Tight bounds of the tessellated outline. `None` when the shape has no
    /// geometry (degenerate circle, empty polygon).
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            // The two defining corners bound these kinds exactly; no need to
            // tessellate.
            ShapeKind::Rectangle { start, end }
            | ShapeKind::Image { start, end, .. }
            | ShapeKind::Line { start, end } => Some(Rect::from_corners(*start, *end)),
            ShapeKind::Circle { start, end } => {
                let rect = Rect::from_corners(*start, *end);
                if rect.width == 0.0 || rect.height == 0.0 {
                    None
                } else {
                    Some(rect)
                }
            }
            ShapeKind::Polygon { points } => polygon_bounds(points),
        }
    }

    /// Translated copy.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let shift = |p: &Point| Point::new(p.x + dx, p.y + dy);
        match self {
            ShapeKind::Rectangle { start, end } => ShapeKind::Rectangle {
                start: shift(start),
                end: shift(end),
            },
            ShapeKind::Circle { start, end } => ShapeKind::Circle {
                start: shift(start),
                end: shift(end),
            },
            ShapeKind::Line { start, end } => ShapeKind::Line {
                start: shift(start),
                end: shift(end),
            },
            ShapeKind::Polygon { points } => ShapeKind::Polygon {
                points: points.iter().map(shift).collect(),
            },
            ShapeKind::Image { start, end, asset } => ShapeKind::Image {
                start: shift(start),
                end: shift(end),
                asset: *asset,
            },
        }
    }

    /// Remap every coordinate by the affine transform that sends `from` to
    /// `to`: translate to origin, scale per axis, translate back. A
    /// zero-sized source axis degenerates to a pure translation on that axis.
    pub fn remapped(&self, from: &Rect, to: &Rect) -> Self {
        let sx = if from.width == 0.0 { 1.0 } else { to.width / from.width };
        let sy = if from.height == 0.0 { 1.0 } else { to.height / from.height };
        let map = |p: &Point| Point::new(to.x + (p.x - from.x) * sx, to.y + (p.y - from.y) * sy);
        match self {
            ShapeKind::Rectangle { start, end } => ShapeKind::Rectangle {
                start: map(start),
                end: map(end),
            },
            ShapeKind::Circle { start, end } => ShapeKind::Circle {
                start: map(start),
                end: map(end),
            },
            ShapeKind::Line { start, end } => ShapeKind::Line {
                start: map(start),
                end: map(end),
            },
            ShapeKind::Polygon { points } => ShapeKind::Polygon {
                points: points.iter().map(map).collect(),
            },
            ShapeKind::Image { start, end, asset } => ShapeKind::Image {
                start: map(start),
                end: map(end),
                asset: *asset,
            },
        }
    }

    /// True when the shape would carry no visible geometry and must be
    /// discarded at draw commit: a zero-area box, a zero-length line, or a
    /// polygon without extent.
    pub fn is_degenerate(&self) -> bool {
        match self {
            ShapeKind::Rectangle { start, end }
            | ShapeKind::Circle { start, end }
            | ShapeKind::Image { start, end, .. } => {
                let r = Rect::from_corners(*start, *end);
                r.width == 0.0 || r.height == 0.0
            }
            ShapeKind::Line { start, end } => start == end,
            ShapeKind::Polygon { points } => {
                if points.len() < 3 {
                    return true;
                }
                match polygon_bounds(points) {
                    Some(b) => b.width == 0.0 || b.height == 0.0,
                    None => true,
                }
            }
        }
    }
}

/// A shape in a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub name: String,
    pub color: Color,
    pub visible: bool,
    pub kind: ShapeKind,
}

impl Shape {
    pub fn new(kind: ShapeKind, color: Color) -> Self {
        Self {
            id: ShapeId::new(),
            name: kind.name().to_string(),
            color,
            visible: true,
            kind,
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.kind.bounds()
    }

    pub fn outline(&self) -> Vec<Point> {
        self.kind.outline()
    }
}
