//! The document - the source of truth for all shape data.
//!
//! A document is a fixed-size artboard with an ordered stack of layers. All
//! mutation happens synchronously here; selection, history snapshots and the
//! render path are derived views.

use tracing::debug;

use crate::geometry::{snap, Rect};
use crate::layers::Layer;
use crate::shapes::{Shape, ShapeId};

/// Artboard dimensions are quantized to this step and never smaller.
pub const ARTBOARD_STEP: f64 = 32.0;

/// A layered drawing on a fixed artboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    artboard_width: f64,
    artboard_height: f64,
    layers: Vec<Layer>,
    active_layer: usize,
}

impl Document {
    /// Create a document with one empty layer. Requested dimensions are
    /// snapped to the nearest multiple of [`ARTBOARD_STEP`], with the step
    /// as minimum.
    pub fn new(width: f64, height: f64) -> Self {
        let artboard_width = snap(width, ARTBOARD_STEP).max(ARTBOARD_STEP);
        let artboard_height = snap(height, ARTBOARD_STEP).max(ARTBOARD_STEP);
        Self {
            artboard_width,
            artboard_height,
            layers: vec![Layer::new("Layer 1")],
            active_layer: 0,
        }
    }

    /// Reassemble a document from persisted parts. Dimensions are trusted
    /// as-is; the loader has already validated them.
    pub fn from_parts(width: f64, height: f64, layers: Vec<Layer>) -> Self {
        let active_layer = layers.len().saturating_sub(1);
        Self {
            artboard_width: width,
            artboard_height: height,
            layers,
            active_layer,
        }
    }

    pub fn artboard_width(&self) -> f64 {
        self.artboard_width
    }

    pub fn artboard_height(&self) -> f64 {
        self.artboard_height
    }

    pub fn artboard_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.artboard_width, self.artboard_height)
    }

    // --- Layers ---

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut Vec<Layer> {
        &mut self.layers
    }

    /// Append a new auto-named layer and make it active.
    pub fn add_layer(&mut self) -> &Layer {
        let layer = Layer::new(format!("Layer {}", self.layers.len() + 1));
        self.layers.push(layer);
        self.active_layer = self.layers.len() - 1;
        &self.layers[self.active_layer]
    }

    /// Remove a layer by index. The active index is clamped to the remaining
    /// stack.
    pub fn delete_layer(&mut self, index: usize) -> Option<Layer> {
        if index >= self.layers.len() {
            return None;
        }
        let layer = self.layers.remove(index);
        self.active_layer = self.active_layer.min(self.layers.len().saturating_sub(1));
        Some(layer)
    }

    pub fn rename_layer(&mut self, index: usize, name: impl Into<String>) -> bool {
        match self.layers.get_mut(index) {
            Some(layer) => {
                layer.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn set_layer_visible(&mut self, index: usize, visible: bool) -> bool {
        match self.layers.get_mut(index) {
            Some(layer) => {
                layer.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn set_active_layer(&mut self, index: usize) -> bool {
        if index < self.layers.len() {
            self.active_layer = index;
            true
        } else {
            false
        }
    }

    pub fn active_layer_index(&self) -> usize {
        self.active_layer
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.layers.get(self.active_layer)
    }

    pub fn active_layer_mut(&mut self) -> Option<&mut Layer> {
        self.layers.get_mut(self.active_layer)
    }

    /// Replace the whole layer stack (history restore / load).
    pub fn restore_layers(&mut self, layers: Vec<Layer>) {
        self.layers = layers;
        self.active_layer = self.active_layer.min(self.layers.len().saturating_sub(1));
    }

    // --- Shapes ---

    /// Add a shape to the active layer.
    ///
    /// Degenerate geometry (zero area) and shapes whose box lies fully
    /// outside the artboard are silently discarded: the caller gets `None`
    /// and the document is unchanged.
    pub fn add_shape(&mut self, shape: Shape) -> Option<ShapeId> {
        if shape.kind.is_degenerate() {
            debug!(kind = shape.kind.name(), "discarding degenerate shape");
            return None;
        }
        let bounds = shape.bounds()?;
        if self.is_fully_outside(&bounds) {
            debug!(kind = shape.kind.name(), "discarding out-of-bounds shape");
            return None;
        }
        let id = shape.id;
        self.active_layer_mut()?.shapes.push(shape);
        Some(id)
    }

    fn is_fully_outside(&self, bounds: &Rect) -> bool {
        bounds.x > self.artboard_width
            || bounds.y > self.artboard_height
            || bounds.x + bounds.width < 0.0
            || bounds.y + bounds.height < 0.0
    }

    /// Delete every shape on the active layer whose bounds strictly overlap
    /// the marquee rectangle. Returns the number of shapes removed.
    pub fn erase_rect(&mut self, rect: &Rect) -> usize {
        let Some(layer) = self.active_layer_mut() else {
            return 0;
        };
        let before = layer.shapes.len();
        layer
            .shapes
            .retain(|s| !s.bounds().is_some_and(|b| b.overlaps(rect)));
        let removed = before - layer.shapes.len();
        if removed > 0 {
            debug!(removed, "erased shapes");
        }
        removed
    }

    /// Find a shape anywhere in the document.
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.layers.iter().find_map(|l| l.shape(id))
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.layers.iter_mut().find_map(|l| l.shape_mut(id))
    }

    pub fn shape_count(&self) -> usize {
        self.layers.iter().map(|l| l.shapes.len()).sum()
    }

    /// Shapes the renderer should paint, back to front: visible shapes of
    /// visible layers, in layer order then z-order.
    pub fn visible_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.layers
            .iter()
            .filter(|l| l.visible)
            .flat_map(|l| l.shapes.iter().filter(|s| s.visible))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(512.0, 512.0)
    }
}
