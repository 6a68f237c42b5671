//! Interactive editing session.
//!
//! The session owns the document, the asset store and the history, and turns
//! pointer gestures into committed edits. Every gesture follows the same
//! begin / update / commit lifecycle; commit is the only place a history
//! snapshot is recorded, so a drag produces exactly one undo step no matter
//! how many updates it saw. Cancelling a drag restores the pre-drag state
//! without touching history.

use std::collections::HashSet;

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::assets::AssetStore;
use crate::color::Color;
use crate::crop::crop_document;
use crate::document::Document;
use crate::geometry::{snap_point, Point, Rect};
use crate::history::History;
use crate::layers::Layer;
use crate::select;
use crate::shapes::{Shape, ShapeId, ShapeKind};
use crate::transform::{move_shapes, resize_shapes, Handle};

/// Grid step shared by drawing, moving and resizing.
pub const DEFAULT_GRID: f64 = 32.0;

/// The active pointer tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Rectangle,
    Circle,
    Line,
    Erase,
    Crop,
}

/// An in-flight pointer gesture.
#[derive(Debug, Clone)]
enum Drag {
    /// Drawing a new shape with one of the draw tools.
    Draw { tool: Tool, start: Point, current: Point },
    /// Marquee rectangle for the erase tool.
    Erase { start: Point, current: Point },
    /// Marquee rectangle for the crop tool.
    Crop { start: Point, current: Point },
    /// Marquee rectangle for selection.
    Marquee { start: Point, current: Point },
    /// Dragging the selection. `originals` holds pre-drag copies so each
    /// update can reapply the cumulative delta from scratch.
    Move {
        origin: Point,
        initial: Rect,
        originals: Vec<(ShapeId, Shape)>,
    },
    /// Dragging a selection handle.
    Resize {
        handle: Handle,
        origin: Point,
        initial: Rect,
        proportional: bool,
        originals: Vec<(ShapeId, Shape)>,
    },
}

pub struct EditorSession {
    document: Document,
    assets: AssetStore,
    history: History,
    selection: Vec<ShapeId>,
    drag: Option<Drag>,
    tool: Tool,
    color: Color,
    snap_enabled: bool,
    grid: f64,
}

impl EditorSession {
    /// New session over a fresh document, with the baseline history entry
    /// already recorded so the first edit is undoable.
    pub fn new(width: f64, height: f64) -> Self {
        let document = Document::new(width, height);
        let mut history = History::new();
        history.push("new", document.layers());
        Self {
            document,
            assets: AssetStore::new(),
            history,
            selection: Vec::new(),
            drag: None,
            tool: Tool::Select,
            color: Color::BLACK,
            snap_enabled: true,
            grid: DEFAULT_GRID,
        }
    }

    /// Reassemble a session from loaded parts. Pending assets resolve on the
    /// next [`resolve_assets`](Self::resolve_assets) call.
    pub fn from_parts(document: Document, history: History, assets: AssetStore) -> Self {
        Self {
            document,
            assets,
            history,
            selection: Vec::new(),
            drag: None,
            tool: Tool::Select,
            color: Color::BLACK,
            snap_enabled: true,
            grid: DEFAULT_GRID,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Drive deferred asset decoding. Returns how many assets became ready.
    pub fn resolve_assets(&mut self) -> usize {
        self.assets.resolve_pending()
    }

    // --- Tool and settings ---

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switching tools cancels any gesture in flight.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            self.cancel_drag();
            self.tool = tool;
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn snap_enabled(&self) -> bool {
        self.snap_enabled
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
    }

    pub fn grid(&self) -> f64 {
        self.grid
    }

    pub fn set_grid(&mut self, grid: f64) {
        if grid > 0.0 {
            self.grid = grid;
        }
    }

    // --- Selection ---

    pub fn selection(&self) -> &[ShapeId] {
        &self.selection
    }

    /// Union bounding box of the current selection, derived from the live
    /// shapes so it tracks every edit.
    pub fn selection_rect(&self) -> Option<Rect> {
        let ids: HashSet<ShapeId> = self.selection.iter().copied().collect();
        select::selection_bounds(
            self.document
                .layers()
                .iter()
                .flat_map(|l| l.shapes.iter())
                .filter(|s| ids.contains(&s.id)),
        )
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn prune_selection(&mut self) {
        self.selection.retain(|id| self.document.shape(*id).is_some());
    }

    // --- Gestures ---

    /// Start a gesture for the current tool at `at`. Selection gestures on
    /// the box or a handle go through [`begin_move`](Self::begin_move) and
    /// [`begin_resize`](Self::begin_resize) instead.
    pub fn begin_drag(&mut self, at: Point) {
        let at = self.snapped_for_draw(at);
        self.drag = Some(match self.tool {
            Tool::Rectangle | Tool::Circle | Tool::Line => Drag::Draw {
                tool: self.tool,
                start: at,
                current: at,
            },
            Tool::Erase => Drag::Erase { start: at, current: at },
            Tool::Crop => Drag::Crop { start: at, current: at },
            Tool::Select => Drag::Marquee { start: at, current: at },
        });
    }

    /// Start moving the current selection. Returns false if nothing is
    /// selected.
    pub fn begin_move(&mut self, at: Point) -> bool {
        let Some(initial) = self.selection_rect() else {
            return false;
        };
        let originals = self.selected_copies();
        self.drag = Some(Drag::Move { origin: at, initial, originals });
        true
    }

    /// Start resizing the current selection from `handle`. Returns false if
    /// nothing is selected.
    pub fn begin_resize(&mut self, handle: Handle, at: Point, proportional: bool) -> bool {
        let Some(initial) = self.selection_rect() else {
            return false;
        };
        let originals = self.selected_copies();
        self.drag = Some(Drag::Resize {
            handle,
            origin: at,
            initial,
            proportional,
            originals,
        });
        true
    }

    /// Feed pointer movement into the active gesture. Move and resize apply
    /// their transform immediately so the document always shows the live
    /// result.
    pub fn update_drag(&mut self, at: Point) {
        let Some(drag) = &mut self.drag else {
            return;
        };
        match drag {
            Drag::Draw { current, .. } => {
                let at = snap_for_draw(at, self.snap_enabled, self.grid);
                *current = at;
            }
            Drag::Erase { current, .. }
            | Drag::Crop { current, .. }
            | Drag::Marquee { current, .. } => {
                *current = at;
            }
            Drag::Move { origin, initial, originals } => {
                let (origin, initial) = (*origin, *initial);
                let originals = originals.clone();
                restore_shapes(&mut self.document, &originals);
                let ids: HashSet<ShapeId> = originals.iter().map(|(id, _)| *id).collect();
                move_shapes(
                    selected_mut(&mut self.document, &ids),
                    &initial,
                    at.x - origin.x,
                    at.y - origin.y,
                    self.snap_enabled,
                    self.grid,
                );
            }
            Drag::Resize { handle, origin, initial, proportional, originals } => {
                let (handle, origin, initial, proportional) =
                    (*handle, *origin, *initial, *proportional);
                let originals = originals.clone();
                restore_shapes(&mut self.document, &originals);
                let ids: HashSet<ShapeId> = originals.iter().map(|(id, _)| *id).collect();
                resize_shapes(
                    selected_mut(&mut self.document, &ids),
                    &initial,
                    handle,
                    (at.x - origin.x, at.y - origin.y),
                    proportional,
                    self.snap_enabled,
                    self.grid,
                );
            }
        }
    }

    /// Finish the active gesture and record it in history. Returns whether a
    /// history entry was pushed (a no-op gesture pushes nothing).
    pub fn commit_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        match drag {
            Drag::Draw { tool, start, current } => {
                let kind = match tool {
                    Tool::Rectangle => ShapeKind::Rectangle { start, end: current },
                    Tool::Circle => ShapeKind::Circle { start, end: current },
                    Tool::Line => ShapeKind::Line { start, end: current },
                    _ => return false,
                };
                let label = format!("draw {}", kind.name());
                if self.document.add_shape(Shape::new(kind, self.color)).is_none() {
                    return false;
                }
                self.push_history(label)
            }
            Drag::Erase { start, current } => {
                self.document.erase_rect(&Rect::from_corners(start, current));
                self.push_history("erase")
            }
            Drag::Crop { start, current } => {
                let rect = Rect::from_corners(start, current);
                crop_document(&mut self.document, &mut self.assets, &rect);
                self.prune_selection();
                self.push_history("crop")
            }
            Drag::Marquee { start, current } => {
                let rect = Rect::from_corners(start, current);
                self.selection = match self.document.active_layer() {
                    Some(layer) => select::query(&layer.shapes, &rect),
                    None => Vec::new(),
                };
                debug!(selected = self.selection.len(), "marquee selection");
                false
            }
            Drag::Move { .. } => self.push_history("move"),
            Drag::Resize { .. } => self.push_history("resize"),
        }
    }

    /// Abort the active gesture, restoring any shapes it was transforming.
    pub fn cancel_drag(&mut self) {
        match self.drag.take() {
            Some(Drag::Move { originals, .. }) | Some(Drag::Resize { originals, .. }) => {
                restore_shapes(&mut self.document, &originals);
            }
            _ => {}
        }
    }

    /// Marquee rectangle of the in-flight gesture, for preview rendering.
    pub fn drag_rect(&self) -> Option<Rect> {
        match &self.drag {
            Some(Drag::Draw { start, current, .. })
            | Some(Drag::Erase { start, current })
            | Some(Drag::Crop { start, current })
            | Some(Drag::Marquee { start, current }) => {
                Some(Rect::from_corners(*start, *current))
            }
            _ => None,
        }
    }

    // --- Images ---

    /// Insert an image from raw file bytes, placed at natural pixel size
    /// with its top-left corner at `at`. The bytes are decoded immediately
    /// so the shape box can match the image.
    pub fn add_image(&mut self, bytes: &[u8], at: Point) -> Result<ShapeId> {
        let asset = self.assets.insert_bytes(bytes);
        self.assets.resolve_pending();
        let (width, height) = self
            .assets
            .dimensions(asset)
            .ok_or_else(|| anyhow!("unsupported image data"))?;
        let shape = Shape::new(
            ShapeKind::Image {
                start: at,
                end: Point::new(at.x + width as f64, at.y + height as f64),
                asset,
            },
            self.color,
        );
        let id = self
            .document
            .add_shape(shape)
            .ok_or_else(|| anyhow!("image placed fully outside the artboard"))?;
        self.push_history("insert image");
        Ok(id)
    }

    // --- Layers ---

    pub fn add_layer(&mut self) {
        self.document.add_layer();
        self.push_history("add layer");
    }

    pub fn delete_layer(&mut self, index: usize) -> bool {
        if self.document.delete_layer(index).is_none() {
            return false;
        }
        self.prune_selection();
        self.push_history("delete layer");
        true
    }

    pub fn rename_layer(&mut self, index: usize, name: impl Into<String>) -> bool {
        if !self.document.rename_layer(index, name) {
            return false;
        }
        self.push_history("rename layer");
        true
    }

    pub fn set_layer_visible(&mut self, index: usize, visible: bool) -> bool {
        if !self.document.set_layer_visible(index, visible) {
            return false;
        }
        self.push_history("toggle layer");
        true
    }

    pub fn set_active_layer(&mut self, index: usize) -> bool {
        self.document.set_active_layer(index)
    }

    // --- History ---

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        let layers = snapshot.layers.clone();
        self.restore(layers);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        let layers = snapshot.layers.clone();
        self.restore(layers);
        true
    }

    /// Jump straight to history entry `index`.
    pub fn jump_to(&mut self, index: usize) -> bool {
        let Some(snapshot) = self.history.jump_to(index) else {
            return false;
        };
        let layers = snapshot.layers.clone();
        self.restore(layers);
        true
    }

    fn restore(&mut self, layers: Vec<Layer>) {
        self.cancel_drag();
        self.document.restore_layers(layers);
        self.prune_selection();
        // Snapshots carry asset ids only; queue any image whose pixels are
        // not resident so it decodes again.
        for layer in self.document.layers() {
            for shape in &layer.shapes {
                if let ShapeKind::Image { asset, .. } = shape.kind {
                    self.assets.request(asset);
                }
            }
        }
    }

    fn push_history(&mut self, label: impl Into<String>) -> bool {
        self.history.push(label, self.document.layers())
    }

    fn selected_copies(&self) -> Vec<(ShapeId, Shape)> {
        self.selection
            .iter()
            .filter_map(|id| self.document.shape(*id).map(|s| (*id, s.clone())))
            .collect()
    }

    fn snapped_for_draw(&self, at: Point) -> Point {
        match self.tool {
            Tool::Rectangle | Tool::Circle | Tool::Line => {
                snap_for_draw(at, self.snap_enabled, self.grid)
            }
            _ => at,
        }
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        let doc = Document::default();
        Self::new(doc.artboard_width(), doc.artboard_height())
    }
}

fn snap_for_draw(at: Point, snap_enabled: bool, grid: f64) -> Point {
    if snap_enabled {
        snap_point(at, grid)
    } else {
        at
    }
}

fn restore_shapes(document: &mut Document, originals: &[(ShapeId, Shape)]) {
    for (id, original) in originals {
        if let Some(shape) = document.shape_mut(*id) {
            *shape = original.clone();
        }
    }
}

fn selected_mut<'a>(
    document: &'a mut Document,
    ids: &HashSet<ShapeId>,
) -> Vec<&'a mut Shape> {
    document
        .layers_mut()
        .iter_mut()
        .flat_map(|l| l.shapes.iter_mut())
        .filter(|s| ids.contains(&s.id))
        .collect()
}
